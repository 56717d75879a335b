use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use tracing::debug;

use crate::campaign::CampaignStatus;
use crate::db::models::{CampaignRow, CampaignSummaryRow};
use crate::roster::RosterRecord;

/// Page size used when walking every campaign
pub const LIST_ALL_PAGE_SIZE: i64 = 100;

/// Repository for campaign (`email_lists`) database operations
pub struct CampaignRepository;

impl CampaignRepository {
    /// Create a campaign in `DRAFT` from a validated roster
    pub async fn create(
        pool: &Pool<Postgres>,
        name: &str,
        records: &[RosterRecord],
    ) -> Result<CampaignRow, sqlx::Error> {
        debug!("Creating campaign: name={}, records={}", name, records.len());

        let list = records
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

        let row = sqlx::query_as::<_, CampaignRow>(
            r#"
            INSERT INTO email_lists (name, list, status)
            VALUES ($1, $2, $3)
            RETURNING id, name, list, status, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(list)
        .bind(CampaignStatus::Draft.as_str())
        .fetch_one(pool)
        .await?;

        debug!("Campaign created with id={}", row.id);
        Ok(row)
    }

    pub async fn get_by_id(pool: &Pool<Postgres>, id: i32) -> Result<Option<CampaignRow>, sqlx::Error> {
        sqlx::query_as::<_, CampaignRow>(
            r#"
            SELECT id, name, list, status, created_at, updated_at
            FROM email_lists
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Move the workflow status from `expected` to `next`
    ///
    /// Returns false when the campaign is missing or no longer holds
    /// `expected`; concurrent writers therefore cannot both win.
    pub async fn update_status_from(
        pool: &Pool<Postgres>,
        id: i32,
        expected: CampaignStatus,
        next: CampaignStatus,
    ) -> Result<bool, sqlx::Error> {
        debug!("Updating campaign {} status {} -> {}", id, expected, next);

        let result = sqlx::query(
            r#"
            UPDATE email_lists
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(expected.as_str())
        .bind(next.as_str())
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn exists(pool: &Pool<Postgres>, id: i32) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM email_lists WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// One page of campaigns, newest first, strictly after `cursor_after`
    pub async fn list_page(
        pool: &Pool<Postgres>,
        limit: i64,
        cursor_after: Option<i32>,
    ) -> Result<Vec<CampaignSummaryRow>, sqlx::Error> {
        sqlx::query_as::<_, CampaignSummaryRow>(
            r#"
            SELECT id, name, COALESCE(cardinality(list), 0) AS participants, status, created_at
            FROM email_lists
            WHERE $2::int IS NULL
               OR (created_at, id) < (SELECT created_at, id FROM email_lists WHERE id = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .bind(cursor_after)
        .fetch_all(pool)
        .await
    }

    /// Every campaign, fetched page by page until an empty page comes back
    pub async fn list_all(pool: &Pool<Postgres>) -> Result<Vec<CampaignSummaryRow>, sqlx::Error> {
        let mut all = Vec::new();
        let mut cursor = None;

        loop {
            let page = Self::list_page(pool, LIST_ALL_PAGE_SIZE, cursor).await?;
            let Some(last) = page.last() else {
                break;
            };
            cursor = Some(last.id);
            all.extend(page);
        }

        debug!("Listed {} campaigns", all.len());
        Ok(all)
    }
}

/// Write access to a campaign's workflow status
///
/// The trigger worker records undeliverable invocations through this seam.
/// Writes are conditional: `Ok(false)` means the status had already moved on.
#[async_trait]
pub trait StatusWriter: Send + Sync {
    async fn write_status_from(
        &self,
        campaign_id: i32,
        expected: CampaignStatus,
        next: CampaignStatus,
    ) -> Result<bool, sqlx::Error>;
}

#[async_trait]
impl StatusWriter for Pool<Postgres> {
    async fn write_status_from(
        &self,
        campaign_id: i32,
        expected: CampaignStatus,
        next: CampaignStatus,
    ) -> Result<bool, sqlx::Error> {
        CampaignRepository::update_status_from(self, campaign_id, expected, next).await
    }
}
