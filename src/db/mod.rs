pub mod campaign_repository;
pub mod certificate_repository;
pub mod connection;
pub mod migrations;
pub mod models;

pub use campaign_repository::{CampaignRepository, StatusWriter};
pub use certificate_repository::CertificateRepository;
