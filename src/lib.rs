//! Certificate campaign console.
//!
//! Rosters are uploaded as CSV, ingested and validated before anything is
//! written, and stored as campaigns. Each campaign is then driven through
//! certificate assignment, certificate creation and email sending by remote
//! functions; the console writes the in-progress status, queues the
//! invocation, and derives stepper progress and the next action from the
//! stored status.

pub mod api;
pub mod campaign;
pub mod cli;
pub mod config;
pub mod db;
pub mod functions;
pub mod logging;
pub mod roster;
pub mod shutdown;
pub mod worker;
