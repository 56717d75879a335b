pub mod dto;
pub mod handlers;
pub mod models;
pub mod service;

// Re-export commonly used types
pub use handlers::campaign_config;
pub use service::{CampaignService, ServiceError};
