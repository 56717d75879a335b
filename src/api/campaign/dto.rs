use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::campaign::{derive_view_raw, StatusView};
use crate::db::models::{CampaignRow, CampaignSummaryRow, CertificateRow};
use crate::roster::RosterRecord;

/// A campaign with its decoded roster and derived progress
#[derive(Debug, Serialize)]
pub struct CampaignResponse {
    pub id: i32,
    pub name: String,
    pub status: String,
    pub participants: usize,
    pub list: Vec<RosterRecord>,
    pub view: StatusView,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl CampaignResponse {
    pub fn new(row: CampaignRow, list: Vec<RosterRecord>) -> Self {
        Self {
            view: derive_view_raw(&row.status),
            id: row.id,
            name: row.name,
            status: row.status,
            participants: list.len(),
            list,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Response for campaign creation
#[derive(Debug, Serialize)]
pub struct CreatedCampaignResponse {
    pub message: String,
    pub campaign: CampaignResponse,
}

#[derive(Debug, Serialize)]
pub struct CampaignSummary {
    pub id: i32,
    pub name: String,
    pub participants: i32,
    pub status: String,
    pub created_at: NaiveDateTime,
}

impl From<CampaignSummaryRow> for CampaignSummary {
    fn from(row: CampaignSummaryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            participants: row.participants,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

/// One page of the campaign listing
#[derive(Debug, Serialize)]
pub struct CampaignPage {
    pub campaigns: Vec<CampaignSummary>,
    /// Pass as `cursor` to fetch the next page; absent on the last page
    pub next_cursor: Option<i32>,
}

/// Response for a scheduled stage
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub message: String,
    pub campaign_id: i32,
    pub status: String,
    pub view: StatusView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateRef {
    pub id: String,
    pub link: Option<String>,
}

/// A roster entry with the certificate produced for it, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantRow {
    /// 1-based position in the roster
    pub index: usize,
    pub name: String,
    pub email: String,
    pub college: Option<String>,
    pub hour: String,
    pub certificate: Option<CertificateRef>,
    pub email_sent: bool,
}

/// Match certificate documents to roster entries on `(name, email)`
///
/// When several documents share a key the first one wins.
pub fn join_certificates(records: Vec<RosterRecord>, certificates: Vec<CertificateRow>) -> Vec<ParticipantRow> {
    let mut by_key: HashMap<(String, String), CertificateRow> = HashMap::new();
    for certificate in certificates {
        by_key
            .entry((certificate.name.clone(), certificate.email.clone()))
            .or_insert(certificate);
    }

    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            let found = by_key.get(&(record.name.clone(), record.email.clone()));
            let certificate = found.and_then(|c| {
                c.certificate_id.clone().map(|id| CertificateRef {
                    id,
                    link: c.certificate_link.clone(),
                })
            });
            let college = Some(record.college.trim().to_string()).filter(|c| !c.is_empty());

            ParticipantRow {
                index: i + 1,
                email_sent: found.map(|c| c.email_sent).unwrap_or(false),
                name: record.name,
                email: record.email,
                college,
                hour: record.hour,
                certificate,
            }
        })
        .collect()
}
