use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::controllers::error_response;
use crate::AppState;

/// Operator-facing instance management: attach a design to an event and
/// populate its inventory. Called by the admin surface, not by checkout
/// clients.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/instances", post(create_instance))
        .route("/instances/initialize", post(initialize_seats))
}

#[derive(Debug, Deserialize, Validate)]
struct CreateInstanceRequest {
    #[validate(range(min = 1))]
    event_id: i64,
    #[validate(range(min = 1))]
    design_id: i64,
}

#[derive(Debug, Serialize)]
struct CreateInstanceResponse {
    event_seating_id: i64,
    design_version: i32,
    seat_count: usize,
}

async fn create_instance(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateInstanceRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    req.validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let instance = state
        .inventory
        .create_instance(req.event_id, req.design_id)
        .await
        .map_err(error_response)?;

    Ok((
        StatusCode::CREATED,
        Json(CreateInstanceResponse {
            event_seating_id: instance.id,
            design_version: instance.design_version,
            seat_count: instance.snapshot.seat_count(),
        }),
    ))
}

#[derive(Debug, Deserialize, Validate)]
struct InitializeSeatsRequest {
    #[validate(range(min = 1))]
    event_seating_id: i64,
}

#[derive(Debug, Serialize)]
struct InitializeSeatsResponse {
    inserted: u64,
}

async fn initialize_seats(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InitializeSeatsRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    req.validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let inserted = state
        .inventory
        .initialize_seats(req.event_seating_id)
        .await
        .map_err(error_response)?;

    state
        .cache
        .invalidate_seat_map(req.event_seating_id)
        .await;

    Ok((StatusCode::OK, Json(InitializeSeatsResponse { inserted })))
}
