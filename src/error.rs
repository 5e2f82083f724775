//! Domain-specific error types for need-canvas

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

/// Main error type for the need-canvas service
#[derive(Error, Debug)]
pub enum NeedCanvasError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String, details: Value },

    #[error("Upstream error: {message}")]
    Upstream { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("{name} manquant dans l'environnement.")]
    MissingApiKey { name: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl NeedCanvasError {
    /// Validation failure carrying a single form-level message.
    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        NeedCanvasError::Validation {
            details: flatten_details(std::slice::from_ref(&message), &[]),
            message,
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        NeedCanvasError::Upstream {
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for NeedCanvasError {
    fn from(err: anyhow::Error) -> Self {
        NeedCanvasError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for NeedCanvasError {
    fn from(err: serde_json::Error) -> Self {
        NeedCanvasError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for NeedCanvasError {
    fn from(err: reqwest::Error) -> Self {
        NeedCanvasError::Upstream {
            message: format!("HTTP request failed: {}", err),
        }
    }
}

/// Builds the `{formErrors, fieldErrors}` shape returned with a 400.
pub fn flatten_details(form_errors: &[String], field_errors: &[(String, String)]) -> Value {
    let mut fields = serde_json::Map::new();
    for (field, message) in field_errors {
        let entry = fields
            .entry(field.clone())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(list) = entry {
            list.push(Value::String(message.clone()));
        }
    }
    json!({
        "formErrors": form_errors,
        "fieldErrors": fields,
    })
}

/// HTTP-facing error: a status code and the JSON body the client sees.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiError {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, json!({ "error": message }))
    }

    pub fn invalid_payload(details: Value) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            json!({ "error": "Payload invalide", "details": details }),
        )
    }

    pub fn internal(message: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": message }))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Convert NeedCanvasError to an HTTP error without a route-specific message
impl From<NeedCanvasError> for ApiError {
    fn from(err: NeedCanvasError) -> Self {
        match err {
            NeedCanvasError::Validation { details, .. } => ApiError::invalid_payload(details),
            NeedCanvasError::MissingApiKey { name } => ApiError::internal(&missing_key_message(&name)),
            other => {
                tracing::error!(error = %other, "unhandled request failure");
                ApiError::internal("Erreur interne du serveur.")
            }
        }
    }
}

fn missing_key_message(name: &str) -> String {
    format!("{name} manquant dans l'environnement.")
}

/// Maps any failure to a logged 500 with a public, localized message.
pub trait ResultExt<T> {
    fn or_public(self, route: &'static str, message: &'static str) -> Result<T, ApiError>;
}

impl<T> ResultExt<T> for Result<T> {
    fn or_public(self, route: &'static str, message: &'static str) -> Result<T, ApiError> {
        self.map_err(|err| match err {
            NeedCanvasError::Validation { details, .. } => ApiError::invalid_payload(details),
            NeedCanvasError::MissingApiKey { name } => ApiError::internal(&missing_key_message(&name)),
            other => {
                tracing::error!(route, error = %other, "request failed");
                ApiError::internal(message)
            }
        })
    }
}

/// Result type alias for need-canvas operations
pub type Result<T, E = NeedCanvasError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_details_groups_field_errors() {
        let details = flatten_details(
            &["bad body".to_string()],
            &[
                ("canvasId".to_string(), "required".to_string()),
                ("canvasId".to_string(), "must be a string".to_string()),
            ],
        );
        assert_eq!(details["formErrors"][0], "bad body");
        assert_eq!(details["fieldErrors"]["canvasId"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_missing_key_surfaces_as_500_with_message() {
        let api: ApiError = NeedCanvasError::MissingApiKey {
            name: "OPENAI_API_KEY".into(),
        }
        .into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            api.body["error"],
            "OPENAI_API_KEY manquant dans l'environnement."
        );
    }

    #[test]
    fn test_or_public_hides_upstream_detail() {
        let res: Result<()> = Err(NeedCanvasError::upstream("connection refused"));
        let api = res.or_public("finalize", "Échec de la finalisation").unwrap_err();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.body, json!({ "error": "Échec de la finalisation" }));
    }

    #[test]
    fn test_validation_maps_to_400() {
        let res: Result<()> = Err(NeedCanvasError::validation("missing field `canvas`"));
        let api = res.or_public("add-to-gallery", "unused").unwrap_err();
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.body["error"], "Payload invalide");
        assert_eq!(api.body["details"]["formErrors"][0], "missing field `canvas`");
    }
}
