use sqlx::{Pool, Postgres};
use tracing::debug;

use crate::db::models::CertificateRow;

/// Read-only access to certificate documents
pub struct CertificateRepository;

impl CertificateRepository {
    /// All certificate documents produced for one campaign
    pub async fn for_campaign(
        pool: &Pool<Postgres>,
        campaign_id: i32,
    ) -> Result<Vec<CertificateRow>, sqlx::Error> {
        let rows = sqlx::query_as::<_, CertificateRow>(
            r#"
            SELECT id, email_list_id, name, email, certificate_id, certificate_link, email_sent
            FROM certificates
            WHERE email_list_id = $1
            ORDER BY id
            "#,
        )
        .bind(campaign_id)
        .fetch_all(pool)
        .await?;

        debug!("Found {} certificates for campaign {}", rows.len(), campaign_id);
        Ok(rows)
    }
}
