pub mod ingest;
pub mod models;

pub use ingest::{ingest, IngestError};
pub use models::{RosterRecord, ValidationError};
