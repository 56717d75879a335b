use actix_web::{HttpResponse, ResponseError};
use sqlx::{Pool, Postgres};
use thiserror::Error;
use tracing::{error, info, warn};
use validator::Validate;

use super::dto::{
    join_certificates, ActionResponse, CampaignPage, CampaignResponse, CampaignSummary,
    CreatedCampaignResponse, ParticipantRow,
};
use super::models::NewCampaign;
use crate::api::validation::{field_messages, ErrorResponse};
use crate::campaign::{derive_view, CampaignStatus, StageTrigger};
use crate::db::models::CampaignRow;
use crate::db::{CampaignRepository, CertificateRepository, StatusWriter};
use crate::roster::{self, IngestError, RosterRecord};
use crate::worker::{TriggerQueue, TriggerRequest};

/// Service-level errors
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Uploaded roster was rejected
    #[error("{0}")]
    Ingest(#[from] IngestError),

    /// Request metadata failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Request fields failed `validator` checks
    #[error("Validation error: {0}")]
    Fields(#[from] validator::ValidationErrors),

    /// Campaign not found
    #[error("Campaign not found: {0}")]
    NotFound(i32),

    /// Requested stage is not offered from the current status
    #[error("Action {trigger} is not permitted while campaign {id} is {status}")]
    ActionNotPermitted {
        id: i32,
        status: String,
        trigger: StageTrigger,
    },

    /// Listing cursor names a campaign that does not exist
    #[error("Unknown cursor: {0}")]
    UnknownCursor(i32),

    /// Stored roster entry could not be decoded
    #[error("Campaign {id} has a corrupt roster entry: {reason}")]
    CorruptRoster { id: i32, reason: String },

    /// Trigger worker is no longer accepting work
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl ResponseError for ServiceError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ServiceError::Database(e) => {
                error!("Database error: {}", e);
                HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "Failed to process request".to_string(),
                    fields: serde_json::json!({"message": "Database error occurred"}),
                })
            }
            ServiceError::Ingest(e) => {
                warn!("Roster rejected: {}", e);
                let fields = match e {
                    IngestError::Schema { missing } => serde_json::json!({
                        "kind": e.kind(),
                        "missing": missing,
                        "message": e.to_string(),
                    }),
                    IngestError::Validation(errors) => serde_json::json!({
                        "kind": e.kind(),
                        "errors": errors,
                        "message": e.to_string(),
                    }),
                };
                HttpResponse::BadRequest().json(ErrorResponse {
                    error: "Invalid roster".to_string(),
                    fields,
                })
            }
            ServiceError::Validation(msg) => {
                warn!("Validation error: {}", msg);
                HttpResponse::BadRequest().json(ErrorResponse {
                    error: "Validation failed".to_string(),
                    fields: serde_json::json!({"message": msg}),
                })
            }
            ServiceError::Fields(errors) => {
                warn!("Validation error: {}", errors);
                HttpResponse::BadRequest().json(ErrorResponse {
                    error: "Validation failed".to_string(),
                    fields: serde_json::Value::Object(field_messages(errors)),
                })
            }
            ServiceError::NotFound(id) => {
                warn!("Campaign not found: {}", id);
                HttpResponse::NotFound().json(ErrorResponse {
                    error: "Not found".to_string(),
                    fields: serde_json::json!({"message": format!("Campaign with id {} not found", id)}),
                })
            }
            ServiceError::ActionNotPermitted { status, trigger, .. } => {
                warn!("{}", self);
                HttpResponse::Conflict().json(ErrorResponse {
                    error: "Action not permitted".to_string(),
                    fields: serde_json::json!({
                        "trigger": trigger,
                        "status": status,
                        "message": self.to_string(),
                    }),
                })
            }
            ServiceError::UnknownCursor(cursor) => {
                warn!("Unknown listing cursor: {}", cursor);
                HttpResponse::BadRequest().json(ErrorResponse {
                    error: "Validation failed".to_string(),
                    fields: serde_json::json!({
                        "cursor": {"errors": [format!("No campaign with id {}", cursor)]}
                    }),
                })
            }
            ServiceError::CorruptRoster { .. } => {
                error!("{}", self);
                HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "Failed to process request".to_string(),
                    fields: serde_json::json!({"message": "Stored roster could not be read"}),
                })
            }
            ServiceError::Unavailable(msg) => {
                error!("Service unavailable: {}", msg);
                HttpResponse::ServiceUnavailable().json(ErrorResponse {
                    error: "Service unavailable".to_string(),
                    fields: serde_json::json!({"message": msg}),
                })
            }
        }
    }
}

/// Decode the per-record JSON strings of a stored roster
pub fn decode_roster(id: i32, list: &[String]) -> Result<Vec<RosterRecord>, ServiceError> {
    list.iter()
        .map(|entry| {
            serde_json::from_str(entry).map_err(|e| ServiceError::CorruptRoster {
                id,
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Check that `trigger` is the action offered while a campaign is in `status`
///
/// Returns the current status, which the in-progress write is conditioned on.
pub fn permitted_action(id: i32, status: &str, trigger: StageTrigger) -> Result<CampaignStatus, ServiceError> {
    match CampaignStatus::parse(status) {
        Some(current) if derive_view(Some(current)).action_trigger() == Some(trigger) => Ok(current),
        _ => Err(ServiceError::ActionNotPermitted {
            id,
            status: status.to_string(),
            trigger,
        }),
    }
}

/// Queue a stage invocation for a campaign already marked in progress
///
/// When the worker has stopped, the stage's failed status is written so the
/// operator is offered a retry.
pub async fn schedule(
    triggers: &TriggerQueue,
    status_writer: &dyn StatusWriter,
    id: i32,
    trigger: StageTrigger,
) -> Result<(), ServiceError> {
    if triggers.enqueue(TriggerRequest { campaign_id: id, trigger }).is_ok() {
        return Ok(());
    }

    status_writer
        .write_status_from(id, trigger.in_progress_status(), trigger.failed_status())
        .await?;
    Err(ServiceError::Unavailable(
        "Stage scheduling is shutting down, try again later".to_string(),
    ))
}

/// Campaign controller logic; owns no global clients
pub struct CampaignService {
    pool: Pool<Postgres>,
    triggers: TriggerQueue,
}

impl CampaignService {
    pub fn new(pool: Pool<Postgres>, triggers: TriggerQueue) -> Self {
        Self { pool, triggers }
    }

    /// Create a campaign from an uploaded roster
    ///
    /// # Business Logic
    /// - Rejects a blank campaign name
    /// - Ingests the roster; any schema or row error rejects the whole upload
    /// - Rejects a roster with no usable rows
    /// - Only then writes the campaign, in `DRAFT`
    pub async fn create_campaign(&self, name: &str, raw_csv: &str) -> Result<CreatedCampaignResponse, ServiceError> {
        let new_campaign = NewCampaign::new(name);
        new_campaign.validate()?;

        let records = roster::ingest(raw_csv)?;
        if records.is_empty() {
            return Err(ServiceError::Validation("No valid data found in CSV file".to_string()));
        }

        info!(
            "Service: Creating campaign name={} with {} participants",
            new_campaign.name,
            records.len()
        );

        let row = CampaignRepository::create(&self.pool, &new_campaign.name, &records).await?;

        info!("Service: Campaign created successfully with id={}", row.id);

        Ok(CreatedCampaignResponse {
            message: format!("Email list \"{}\" has been saved successfully!", row.name),
            campaign: CampaignResponse::new(row, records),
        })
    }

    /// One page of campaigns, newest first
    pub async fn list_page(&self, limit: i64, cursor: Option<i32>) -> Result<CampaignPage, ServiceError> {
        if let Some(cursor) = cursor {
            if !CampaignRepository::exists(&self.pool, cursor).await? {
                return Err(ServiceError::UnknownCursor(cursor));
            }
        }

        let rows = CampaignRepository::list_page(&self.pool, limit, cursor).await?;
        let next_cursor = match rows.last() {
            Some(last) if rows.len() as i64 == limit => Some(last.id),
            _ => None,
        };

        Ok(CampaignPage {
            campaigns: rows.into_iter().map(CampaignSummary::from).collect(),
            next_cursor,
        })
    }

    pub async fn list_all(&self) -> Result<Vec<CampaignSummary>, ServiceError> {
        let rows = CampaignRepository::list_all(&self.pool).await?;
        Ok(rows.into_iter().map(CampaignSummary::from).collect())
    }

    async fn load(&self, id: i32) -> Result<CampaignRow, ServiceError> {
        CampaignRepository::get_by_id(&self.pool, id)
            .await?
            .ok_or(ServiceError::NotFound(id))
    }

    pub async fn get_campaign(&self, id: i32) -> Result<CampaignResponse, ServiceError> {
        let row = self.load(id).await?;
        let list = decode_roster(row.id, &row.list)?;
        Ok(CampaignResponse::new(row, list))
    }

    /// Roster entries with their certificate and email status
    pub async fn participants(&self, id: i32) -> Result<Vec<ParticipantRow>, ServiceError> {
        let row = self.load(id).await?;
        let records = decode_roster(row.id, &row.list)?;
        let certificates = CertificateRepository::for_campaign(&self.pool, row.id).await?;
        Ok(join_certificates(records, certificates))
    }

    /// Start a remote stage
    ///
    /// # Business Logic
    /// - The trigger must be the action offered for the current status
    /// - Writes the stage's in-progress status first, conditioned on the
    ///   status just read so two concurrent requests cannot both start it
    /// - Then queues the invocation without waiting for it
    ///
    /// The status write and the invocation are not transactional; the
    /// remote function owns the status from here on.
    pub async fn perform_action(&self, id: i32, trigger: StageTrigger) -> Result<ActionResponse, ServiceError> {
        let row = self.load(id).await?;
        let current = permitted_action(id, &row.status, trigger)?;

        let next = trigger.in_progress_status();
        if !CampaignRepository::update_status_from(&self.pool, id, current, next).await? {
            return Err(ServiceError::ActionNotPermitted {
                id,
                status: current.to_string(),
                trigger,
            });
        }

        schedule(&self.triggers, &self.pool, id, trigger).await?;

        info!("Service: Scheduled {} for campaign {} ({})", trigger, id, next);

        Ok(ActionResponse {
            message: trigger.scheduled_message(&row.name),
            campaign_id: id,
            status: next.to_string(),
            view: derive_view(Some(next)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingWriter {
        writes: Mutex<Vec<(i32, CampaignStatus, CampaignStatus)>>,
    }

    #[async_trait]
    impl StatusWriter for RecordingWriter {
        async fn write_status_from(
            &self,
            campaign_id: i32,
            expected: CampaignStatus,
            next: CampaignStatus,
        ) -> Result<bool, sqlx::Error> {
            self.writes.lock().unwrap().push((campaign_id, expected, next));
            Ok(true)
        }
    }

    #[test]
    fn only_the_offered_trigger_is_permitted() {
        for status in CampaignStatus::ALL {
            let offered = derive_view(Some(status)).action_trigger();
            for trigger in [StageTrigger::Assign, StageTrigger::Create, StageTrigger::Send] {
                let result = permitted_action(1, status.as_str(), trigger);
                if offered == Some(trigger) {
                    assert_eq!(result.unwrap(), status);
                } else {
                    let err = result.unwrap_err();
                    assert!(matches!(err, ServiceError::ActionNotPermitted { .. }), "{} {}", status, trigger);
                    assert_eq!(err.error_response().status(), StatusCode::CONFLICT);
                }
            }
        }
    }

    #[test]
    fn send_from_draft_is_a_conflict() {
        let err = permitted_action(4, "DRAFT", StageTrigger::Send).unwrap_err();
        assert_eq!(err.to_string(), "Action send is not permitted while campaign 4 is DRAFT");
    }

    #[test]
    fn retry_is_offered_after_failure() {
        assert_eq!(
            permitted_action(1, "EMAIL_SEND_FAILED", StageTrigger::Send).unwrap(),
            CampaignStatus::EmailSendFailed
        );
    }

    #[test]
    fn unknown_status_permits_nothing() {
        for trigger in [StageTrigger::Assign, StageTrigger::Create, StageTrigger::Send] {
            assert!(permitted_action(1, "ARCHIVED", trigger).is_err());
        }
    }

    #[tokio::test]
    async fn scheduling_hands_the_request_to_the_worker() {
        let (queue, mut rx) = TriggerQueue::channel();
        let writer = RecordingWriter::default();

        schedule(&queue, &writer, 7, StageTrigger::Assign).await.unwrap();

        assert_eq!(
            rx.recv().await,
            Some(TriggerRequest { campaign_id: 7, trigger: StageTrigger::Assign })
        );
        assert!(writer.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stopped_worker_marks_stage_failed_and_is_unavailable() {
        let (queue, rx) = TriggerQueue::channel();
        drop(rx);
        let writer = RecordingWriter::default();

        let err = schedule(&queue, &writer, 7, StageTrigger::Create).await.unwrap_err();

        assert_eq!(err.error_response().status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            *writer.writes.lock().unwrap(),
            vec![(
                7,
                CampaignStatus::CertificateCreationInProgress,
                CampaignStatus::CertificateCreationFailed
            )]
        );
    }

    #[test]
    fn unknown_cursor_is_a_bad_request() {
        let response = ServiceError::UnknownCursor(99).error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn decodes_stored_records() {
        let list = vec![r#"{"name":"Sam","email":"volunteer@sam.org","hour":"2","college":"IIT Patna"}"#.to_string()];
        let records = decode_roster(1, &list).unwrap();
        assert_eq!(records[0].college, "IIT Patna");
    }

    #[test]
    fn corrupt_entries_are_reported() {
        let list = vec!["not json".to_string()];
        match decode_roster(9, &list) {
            Err(ServiceError::CorruptRoster { id, .. }) => assert_eq!(id, 9),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn ingest_errors_are_bad_requests() {
        let err = ServiceError::from(IngestError::Schema {
            missing: vec!["hour".to_string()],
        });
        assert_eq!(err.error_response().status(), actix_web::http::StatusCode::BAD_REQUEST);
        assert_eq!(
            ServiceError::NotFound(3).error_response().status(),
            actix_web::http::StatusCode::NOT_FOUND
        );
    }
}
