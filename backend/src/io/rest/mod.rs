//! # REST API Interface Layer
//!
//! Handlers stay thin: extract, map to a command, call one service method,
//! map the result. Business rules live in the domain services.

pub mod appointment_apis;
pub mod doctor_apis;
pub mod json_body;
pub mod mappers;
pub mod notification_apis;
pub mod patient_apis;
pub mod principal;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Router,
};
use tracing::error;

use crate::domain::DomainError;
use crate::AppState;
use shared::ErrorResponse;

pub use json_body::JsonBody;
pub use principal::Actor;

/// All API routes, to be nested under `/api`
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/patients", patient_apis::router())
        .nest("/doctors", doctor_apis::router())
        .nest("/appointments", appointment_apis::router())
        .nest("/notifications", notification_apis::router())
}

pub(crate) fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::InvalidInput(_)
        | DomainError::SchedulingConflict
        | DomainError::AlreadyApproved(_)
        | DomainError::NotApproved(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
        DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Convert a domain error into a JSON error response
pub(crate) fn error_response(err: DomainError) -> Response {
    if let DomainError::Internal(source) = &err {
        error!("Internal error: {:#}", source);
    }
    let status = status_for(&err);
    (status, Json(ErrorResponse { error: err.to_string() })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&DomainError::invalid("bad")), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&DomainError::SchedulingConflict), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&DomainError::AlreadyApproved(1)), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&DomainError::NotApproved(1)), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&DomainError::not_found("gone")), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&DomainError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(&DomainError::forbidden("no")), StatusCode::FORBIDDEN);
        assert_eq!(
            status_for(&DomainError::Internal(anyhow::anyhow!("disk"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
