use actix_web::HttpResponse;
use actix_web::error::JsonPayloadError;
use serde::Serialize;
use validator::ValidationErrors;

/// Error body shared by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub fields: serde_json::Value,
}

/// Per-field messages of a failed `validator` check
pub fn field_messages(validation_errors: &ValidationErrors) -> serde_json::Map<String, serde_json::Value> {
    let mut fields = serde_json::Map::new();
    for (field, errors) in validation_errors.field_errors() {
        let messages: Vec<String> = errors
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Validation error in field: {}", field))
            })
            .collect();
        fields.insert(field.to_string(), serde_json::json!({"errors": messages}));
    }
    fields
}

/// Build the standardized 400 error for extractor failures
pub fn bad_request(error: &str, fields: serde_json::Map<String, serde_json::Value>) -> actix_web::Error {
    let error_response = ErrorResponse {
        error: error.to_string(),
        fields: serde_json::Value::Object(fields),
    };
    actix_web::error::InternalError::from_response("", HttpResponse::BadRequest().json(error_response)).into()
}

fn message(text: &str) -> serde_json::Map<String, serde_json::Value> {
    let mut fields = serde_json::Map::new();
    fields.insert("message".to_string(), serde_json::json!(text));
    fields
}

fn deserialize_message(err_string: &str) -> &'static str {
    if err_string.contains("EOF while parsing") {
        "Request body is empty. Expected JSON payload"
    } else if err_string.contains("unknown variant") {
        "Invalid enum value. Check allowed values for this field"
    } else {
        "Invalid request format"
    }
}

fn extractor_error(err: actix_web_validator::Error) -> actix_web::Error {
    match err {
        actix_web_validator::Error::Validate(validation_errors) => {
            bad_request("Validation failed", field_messages(&validation_errors))
        }
        actix_web_validator::Error::Deserialize(de_err) => bad_request(
            "Request validation failed",
            message(deserialize_message(&de_err.to_string())),
        ),
        // JSON bodies are parsed by actix itself before validation
        actix_web_validator::Error::JsonPayloadError(JsonPayloadError::Deserialize(de_err)) => bad_request(
            "Request validation failed",
            message(deserialize_message(&de_err.to_string())),
        ),
        _ => bad_request("Validation failed", message("Validation error")),
    }
}

/// MultipartFormConfig error handler producing the same body as the JSON extractors
pub fn multipart_error(err: actix_multipart::MultipartError) -> actix_web::Error {
    bad_request("Invalid upload", message(&err.to_string()))
}

/// JsonConfig with the project's standardized error body
pub fn json_config() -> actix_web_validator::JsonConfig {
    actix_web_validator::JsonConfig::default().error_handler(|err, _req| extractor_error(err))
}

/// QueryConfig with the project's standardized error body
pub fn query_config() -> actix_web_validator::QueryConfig {
    actix_web_validator::QueryConfig::default().error_handler(|err, _req| extractor_error(err))
}
