use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

const USER_AGENT: &str = concat!("campaign-console/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Remote function invocation errors
#[derive(Debug, Error)]
pub enum FunctionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Invalid payload: {0}")]
    Payload(String),
}

/// Starts remote stage functions without waiting for their outcome
#[async_trait]
pub trait FunctionInvoker: Send + Sync {
    async fn invoke(&self, function_id: &str, payload: serde_json::Value) -> Result<(), FunctionError>;
}

/// Execution request body; the payload travels as a JSON string
#[derive(Debug, Serialize)]
struct ExecutionRequest {
    body: String,
    #[serde(rename = "async")]
    is_async: bool,
}

/// Connection details for the function execution endpoint
#[derive(Debug, Clone)]
pub struct FunctionSettings {
    pub endpoint: String,
    pub project: String,
    pub api_key: Option<String>,
}

/// HTTP client for the hosted function-execution API
pub struct HttpFunctionInvoker {
    http_client: reqwest::Client,
    settings: FunctionSettings,
}

impl HttpFunctionInvoker {
    pub fn new(settings: FunctionSettings) -> Result<Self, FunctionError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| FunctionError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            settings,
        })
    }

    fn executions_url(&self, function_id: &str) -> String {
        format!(
            "{}/functions/{}/executions",
            self.settings.endpoint.trim_end_matches('/'),
            function_id
        )
    }
}

#[async_trait]
impl FunctionInvoker for HttpFunctionInvoker {
    async fn invoke(&self, function_id: &str, payload: serde_json::Value) -> Result<(), FunctionError> {
        let body = serde_json::to_string(&payload).map_err(|e| FunctionError::Payload(e.to_string()))?;
        let url = self.executions_url(function_id);

        debug!(function_id = function_id, url = %url, "Creating async function execution");

        let mut request = self
            .http_client
            .post(&url)
            .header("X-Appwrite-Project", &self.settings.project)
            .json(&ExecutionRequest { body, is_async: true });

        if let Some(key) = &self.settings.api_key {
            request = request.header("X-Appwrite-Key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FunctionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(FunctionError::Api(status.as_u16(), text));
        }

        debug!(function_id = function_id, status = status.as_u16(), "Function execution accepted");
        Ok(())
    }
}

/// Payload every stage function receives
pub fn stage_payload(campaign_id: i32) -> serde_json::Value {
    serde_json::json!({ "campaignId": campaign_id.to_string() })
}
