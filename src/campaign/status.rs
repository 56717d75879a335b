use std::fmt;

use serde::{Deserialize, Serialize};

/// Persisted workflow status of a campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    Draft,
    CertificateAssignmentInProgress,
    CertificateAssignmentFailed,
    CertificateAssigned,
    CertificateCreationInProgress,
    CertificateCreationFailed,
    CertificateCreated,
    EmailSendInProgress,
    EmailSendFailed,
    EmailSent,
}

impl CampaignStatus {
    pub const ALL: [CampaignStatus; 10] = [
        CampaignStatus::Draft,
        CampaignStatus::CertificateAssignmentInProgress,
        CampaignStatus::CertificateAssignmentFailed,
        CampaignStatus::CertificateAssigned,
        CampaignStatus::CertificateCreationInProgress,
        CampaignStatus::CertificateCreationFailed,
        CampaignStatus::CertificateCreated,
        CampaignStatus::EmailSendInProgress,
        CampaignStatus::EmailSendFailed,
        CampaignStatus::EmailSent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "DRAFT",
            CampaignStatus::CertificateAssignmentInProgress => "CERTIFICATE_ASSIGNMENT_IN_PROGRESS",
            CampaignStatus::CertificateAssignmentFailed => "CERTIFICATE_ASSIGNMENT_FAILED",
            CampaignStatus::CertificateAssigned => "CERTIFICATE_ASSIGNED",
            CampaignStatus::CertificateCreationInProgress => "CERTIFICATE_CREATION_IN_PROGRESS",
            CampaignStatus::CertificateCreationFailed => "CERTIFICATE_CREATION_FAILED",
            CampaignStatus::CertificateCreated => "CERTIFICATE_CREATED",
            CampaignStatus::EmailSendInProgress => "EMAIL_SEND_IN_PROGRESS",
            CampaignStatus::EmailSendFailed => "EMAIL_SEND_FAILED",
            CampaignStatus::EmailSent => "EMAIL_SENT",
        }
    }

    /// Recognize a stored status value. Anything else is unknown.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            CampaignStatus::CertificateAssignmentInProgress
                | CampaignStatus::CertificateCreationInProgress
                | CampaignStatus::EmailSendInProgress
        )
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote stage an operator can start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageTrigger {
    Assign,
    Create,
    Send,
}

impl StageTrigger {
    /// Status written before the remote function is invoked
    pub fn in_progress_status(&self) -> CampaignStatus {
        match self {
            StageTrigger::Assign => CampaignStatus::CertificateAssignmentInProgress,
            StageTrigger::Create => CampaignStatus::CertificateCreationInProgress,
            StageTrigger::Send => CampaignStatus::EmailSendInProgress,
        }
    }

    /// Status written when the invocation could not be delivered at all
    pub fn failed_status(&self) -> CampaignStatus {
        match self {
            StageTrigger::Assign => CampaignStatus::CertificateAssignmentFailed,
            StageTrigger::Create => CampaignStatus::CertificateCreationFailed,
            StageTrigger::Send => CampaignStatus::EmailSendFailed,
        }
    }

    /// Identifier of the remote function that runs this stage
    pub fn function_id(&self) -> &'static str {
        match self {
            StageTrigger::Assign => "create-email-obj",
            StageTrigger::Create => "create-certs",
            StageTrigger::Send => "send-email",
        }
    }

    /// Operator-facing confirmation once the stage has been scheduled
    pub fn scheduled_message(&self, campaign_name: &str) -> String {
        match self {
            StageTrigger::Assign => {
                format!("Certificate assignment for \"{}\" has been scheduled!", campaign_name)
            }
            StageTrigger::Create => {
                format!("Certificate creation for \"{}\" has been scheduled!", campaign_name)
            }
            StageTrigger::Send => {
                format!("Email list \"{}\" has been scheduled successfully!", campaign_name)
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StageTrigger::Assign => "assign",
            StageTrigger::Create => "create",
            StageTrigger::Send => "send",
        }
    }
}

impl fmt::Display for StageTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_stored_value() {
        for status in CampaignStatus::ALL {
            assert_eq!(CampaignStatus::parse(status.as_str()), Some(status));
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn parse_rejects_unknown_and_wrong_case() {
        assert_eq!(CampaignStatus::parse("draft"), None);
        assert_eq!(CampaignStatus::parse("ARCHIVED"), None);
        assert_eq!(CampaignStatus::parse(""), None);
    }

    #[test]
    fn triggers_map_to_their_stage_statuses() {
        assert_eq!(
            StageTrigger::Create.in_progress_status(),
            CampaignStatus::CertificateCreationInProgress
        );
        assert_eq!(StageTrigger::Send.failed_status(), CampaignStatus::EmailSendFailed);
        assert_eq!(StageTrigger::Assign.function_id(), "create-email-obj");
        assert!(StageTrigger::Assign.in_progress_status().is_in_progress());
    }
}
