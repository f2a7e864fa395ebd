//! JSON request bodies. A body that is malformed, mistyped or missing a
//! required field is invalid input and answers 400 like any other.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::Response,
    Json,
};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::domain::DomainError;
use crate::io::rest::error_response;

/// Drop-in for `Json<T>` whose rejection is the API's error payload
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let path = req.uri().path().to_string();
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                warn!("Rejected body for {}: {}", path, rejection.body_text());
                Err(rejection_response(rejection))
            }
        }
    }
}

fn rejection_response(rejection: JsonRejection) -> Response {
    error_response(DomainError::invalid(rejection.body_text()))
}
