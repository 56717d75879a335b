pub mod trigger_worker;

pub use trigger_worker::{RetryPolicy, TriggerQueue, TriggerRequest, TriggerWorker};
