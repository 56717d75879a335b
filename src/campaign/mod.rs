pub mod status;
pub mod view;

pub use status::{CampaignStatus, StageTrigger};
pub use view::{derive_view, derive_view_raw, Action, StageState, StageView, StatusView};
