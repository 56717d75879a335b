pub mod client;

pub use client::{stage_payload, FunctionError, FunctionInvoker, FunctionSettings, HttpFunctionInvoker};
