//! JSON body extraction with the `{formErrors, fieldErrors}` 400 shape.

use axum::{
    Json,
    async_trait,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, flatten_details};

/// Semantic checks run after a body deserialized. Returns `(field, message)` pairs.
pub trait Validate {
    fn validate(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// Turns an already extracted JSON body into `T`, or the 400 a client should see.
pub fn parse_payload<T>(payload: Result<Json<Value>, JsonRejection>) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    let Json(value) = payload.map_err(|rejection| {
        ApiError::invalid_payload(flatten_details(&[rejection.body_text()], &[]))
    })?;
    from_value(value)
}

pub fn from_value<T>(value: Value) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    let parsed: T = serde_json::from_value(value)
        .map_err(|e| ApiError::invalid_payload(flatten_details(&[e.to_string()], &[])))?;
    let field_errors = parsed.validate();
    if field_errors.is_empty() {
        Ok(parsed)
    } else {
        Err(ApiError::invalid_payload(flatten_details(&[], &field_errors)))
    }
}

/// Extractor form of [`parse_payload`].
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let payload = Json::<Value>::from_request(req, state).await;
        parse_payload(payload).map(ValidJson)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Probe {
        canvas_id: String,
    }

    impl Validate for Probe {
        fn validate(&self) -> Vec<(String, String)> {
            if self.canvas_id.is_empty() {
                vec![("canvasId".into(), "Required".into())]
            } else {
                Vec::new()
            }
        }
    }

    #[test]
    fn test_shape_errors_are_form_errors() {
        let err = from_value::<Probe>(json!({})).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(
            err.body["details"]["formErrors"][0]
                .as_str()
                .unwrap()
                .contains("canvasId")
        );
    }

    #[test]
    fn test_semantic_errors_are_field_errors() {
        let err = from_value::<Probe>(json!({ "canvasId": "" })).unwrap_err();
        assert_eq!(err.body["details"]["fieldErrors"]["canvasId"][0], "Required");
    }
}
