use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

/// Database representation of a campaign (`email_lists` row)
///
/// `list` holds one JSON-encoded roster record per element.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CampaignRow {
    pub id: i32,
    pub name: String,
    pub list: Vec<String>,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Listing projection of a campaign without its roster
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CampaignSummaryRow {
    pub id: i32,
    pub name: String,
    pub participants: i32,
    pub status: String,
    pub created_at: NaiveDateTime,
}

/// Certificate document written by the remote stage functions
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CertificateRow {
    pub id: i32,
    pub email_list_id: i32,
    pub name: String,
    pub email: String,
    pub certificate_id: Option<String>,
    pub certificate_link: Option<String>,
    pub email_sent: bool,
}
