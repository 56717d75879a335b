use serde::Serialize;

use super::status::{CampaignStatus, StageTrigger};

pub const STAGE_LABELS: [&str; 4] = [
    "Draft",
    "Certificate Assignment",
    "Certificate Creation",
    "Email Sending",
];

/// Visual state of one stepper stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageState {
    Pending,
    InProgress,
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageView {
    pub label: &'static str,
    pub state: StageState,
}

/// The single action offered for a status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub label: &'static str,
    pub trigger: StageTrigger,
}

/// Stepper progress and next action derived from a campaign status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub active_step: usize,
    pub stages: [StageView; 4],
    pub action: Option<Action>,
    /// A remote stage is running and the operator should re-read later
    pub running_in_background: bool,
}

impl StatusView {
    pub fn action_trigger(&self) -> Option<StageTrigger> {
        self.action.as_ref().map(|action| action.trigger)
    }
}

fn stages(assignment: StageState, creation: StageState, sending: StageState) -> [StageView; 4] {
    // the draft stage never lights up
    let states = [StageState::Pending, assignment, creation, sending];
    std::array::from_fn(|i| StageView {
        label: STAGE_LABELS[i],
        state: states[i],
    })
}

fn action(label: &'static str, trigger: StageTrigger) -> Option<Action> {
    Some(Action { label, trigger })
}

/// Map a status to stepper state and the permitted action.
///
/// `None` stands for a stored value that is not a known status; it maps to
/// step 0, every stage pending and no action.
pub fn derive_view(status: Option<CampaignStatus>) -> StatusView {
    use CampaignStatus::*;
    use StageState::*;
    use StageTrigger::*;

    let Some(status) = status else {
        return StatusView {
            active_step: 0,
            stages: stages(Pending, Pending, Pending),
            action: None,
            running_in_background: false,
        };
    };

    let (active_step, stages, action) = match status {
        Draft => (1, stages(Pending, Pending, Pending), action("Assign Certificates", Assign)),
        CertificateAssignmentInProgress => (1, stages(InProgress, Pending, Pending), None),
        CertificateAssignmentFailed => {
            (1, stages(Error, Pending, Pending), action("Retry Assignment", Assign))
        }
        CertificateAssigned => {
            (2, stages(Success, Pending, Pending), action("Create Certificates", Create))
        }
        CertificateCreationInProgress => (2, stages(Success, InProgress, Pending), None),
        CertificateCreationFailed => {
            (2, stages(Success, Error, Pending), action("Retry Creation", Create))
        }
        CertificateCreated => (3, stages(Success, Success, Pending), action("Send Emails", Send)),
        EmailSendInProgress => (3, stages(Success, Success, InProgress), None),
        EmailSendFailed => (3, stages(Success, Success, Error), action("Retry Sending", Send)),
        EmailSent => (4, stages(Success, Success, Success), None),
    };

    StatusView {
        active_step,
        stages,
        action,
        running_in_background: status.is_in_progress(),
    }
}

/// [`derive_view`] over a raw stored status string
pub fn derive_view_raw(status: &str) -> StatusView {
    derive_view(CampaignStatus::parse(status))
}
