pub mod cache;
pub mod directions;
pub mod error;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir};

use shared::{LaneSnapshot, RouteRequest};

use crate::cache::{CachedLane, LaneCache};
use crate::directions::DirectionsClient;
use crate::error::{cache_error, cache_unavailable, directions_error, ErrorResponse};

#[derive(Clone)]
pub struct AppState {
    pub directions: Arc<DirectionsClient>,
    pub cache: Option<Arc<LaneCache>>,
}

pub fn create_router(state: AppState, route_data_dir: PathBuf) -> Router {
    Router::new()
        .route("/api/route", post(route_handler))
        .route("/api/lanes", get(list_lanes_handler))
        .route(
            "/api/lanes/:service_code",
            put(save_lane_handler)
                .get(get_lane_handler)
                .delete(delete_lane_handler),
        )
        .nest_service("/route-data", ServeDir::new(route_data_dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Routes the request's waypoints through the directions service and echoes
/// the lane metadata back with the computed geometry. Failures never create
/// a lane anywhere: the error response is the entire outcome.
async fn route_handler(
    State(state): State<AppState>,
    Json(req): Json<RouteRequest>,
) -> Result<Json<LaneSnapshot>, ErrorResponse> {
    let route = state
        .directions
        .route(&req.waypoints)
        .await
        .map_err(directions_error)?;

    tracing::info!(
        service_code = %req.service_code,
        points = route.coordinates.len(),
        distance_m = route.total_distance,
        "route found"
    );

    Ok(Json(LaneSnapshot {
        service_code: req.service_code,
        line: req.line,
        origin: req.origin,
        destination: req.destination,
        route_data: route,
    }))
}

async fn save_lane_handler(
    State(state): State<AppState>,
    Path(service_code): Path<String>,
    Json(mut snapshot): Json<LaneSnapshot>,
) -> Result<Json<CachedLane>, ErrorResponse> {
    let cache = state.cache.as_ref().ok_or_else(cache_unavailable)?;
    // The path segment is the cache key; the body's code is subordinate.
    snapshot.service_code = service_code;
    cache.save(&snapshot).await.map(Json).map_err(cache_error)
}

async fn get_lane_handler(
    State(state): State<AppState>,
    Path(service_code): Path<String>,
) -> Result<Json<LaneSnapshot>, ErrorResponse> {
    let cache = state.cache.as_ref().ok_or_else(cache_unavailable)?;
    cache.get(&service_code).await.map(Json).map_err(cache_error)
}

async fn list_lanes_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<CachedLane>>, ErrorResponse> {
    let cache = state.cache.as_ref().ok_or_else(cache_unavailable)?;
    cache.list().await.map(Json).map_err(cache_error)
}

async fn delete_lane_handler(
    State(state): State<AppState>,
    Path(service_code): Path<String>,
) -> Result<StatusCode, ErrorResponse> {
    let cache = state.cache.as_ref().ok_or_else(cache_unavailable)?;
    cache
        .delete(&service_code)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(cache_error)
}
