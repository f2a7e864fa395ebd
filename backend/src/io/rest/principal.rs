//! Extractor for the acting party of a request.
//!
//! The `X-Actor-Role` and `X-Actor-Id` headers are trusted as-is. They must be
//! set by an authenticating gateway in front of this service, which strips any
//! client-supplied copies. Exposed directly, any caller can act as anyone.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use tracing::warn;

use crate::domain::models::Principal;
use shared::ErrorResponse;

pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";
pub const ACTOR_ID_HEADER: &str = "x-actor-id";

/// The `Principal` named by the `X-Actor-Role` and `X-Actor-Id` headers.
/// Missing or malformed headers reject the request with 401.
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        principal_from_headers(&parts.headers).map(Actor).map_err(|message| {
            warn!("Rejected request to {}: {}", parts.uri.path(), message);
            (StatusCode::UNAUTHORIZED, Json(ErrorResponse { error: message })).into_response()
        })
    }
}

fn principal_from_headers(headers: &HeaderMap) -> Result<Principal, String> {
    let role = header_text(headers, ACTOR_ROLE_HEADER)?.ok_or_else(|| "Missing X-Actor-Role header".to_string())?;
    let id = header_text(headers, ACTOR_ID_HEADER)?;

    Principal::from_parts(role, id).map_err(|e| e.to_string())
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, String> {
    headers
        .get(name)
        .map(|value| value.to_str().map_err(|_| format!("Header {} is not valid text", name)))
        .transpose()
}
