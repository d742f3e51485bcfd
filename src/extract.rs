use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::error::ServiceError;

/// JsonBody
///
/// Wrapper around `axum::Json` whose rejections are reported as
/// `ServiceError::InvalidInput`, so malformed bodies, explicit nulls and unknown
/// fields produce the same `{"error": ...}` envelope as every other failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ServiceError::InvalidInput(describe(&rejection))),
        }
    }
}

fn describe(rejection: &JsonRejection) -> String {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "Invalid request body: expected Content-Type: application/json".to_string()
        }
        JsonRejection::JsonSyntaxError(_) => "Invalid request body: malformed JSON".to_string(),
        JsonRejection::JsonDataError(err) => format!("Invalid request body: {}", err.body_text()),
        other => format!("Invalid request body: {}", other.body_text()),
    }
}
