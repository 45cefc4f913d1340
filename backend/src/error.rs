use axum::{http::StatusCode, Json};
use shared::ApiError;

use crate::cache::LaneCacheError;
use crate::directions::DirectionsError;

pub type ErrorResponse = (StatusCode, Json<ApiError>);

pub fn directions_error(err: DirectionsError) -> ErrorResponse {
    tracing::warn!("routing failed: {err}");
    let status = match err {
        DirectionsError::TooFewWaypoints(_) => StatusCode::BAD_REQUEST,
        DirectionsError::Transport(_)
        | DirectionsError::UpstreamStatus(_)
        | DirectionsError::Rejected { .. }
        | DirectionsError::NoRoute => StatusCode::BAD_GATEWAY,
    };
    error_response(status, err.to_string())
}

pub fn cache_error(err: LaneCacheError) -> ErrorResponse {
    let (status, message) = match err {
        LaneCacheError::NotFound(code) => (
            StatusCode::NOT_FOUND,
            format!("no cached lane for service code {code}"),
        ),
        LaneCacheError::InvalidData(msg) => (StatusCode::BAD_REQUEST, msg),
        LaneCacheError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        LaneCacheError::Connection(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("database connection error: {e}"),
        ),
    };
    error_response(status, message)
}

pub fn cache_unavailable() -> ErrorResponse {
    error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        "lane cache is not configured".to_string(),
    )
}

fn error_response(status: StatusCode, message: String) -> ErrorResponse {
    (status, Json(ApiError { message }))
}
