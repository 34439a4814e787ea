use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::controllers::error_response;
use crate::middleware::{Session, SESSION_HEADER};
use crate::services::inventory::HoldReceipt;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/seatmap", get(seat_map))
        .route("/seats/hold", patch(hold_seats))
        .route("/seats/extend", patch(extend_holds))
        .route("/seats/release", patch(release_seats))
        .route("/seats/confirm", patch(confirm_seats))
}

/* ---------- SEAT MAP ---------- */

#[derive(Debug, Deserialize, Validate)]
struct SeatMapQuery {
    #[validate(range(min = 1))]
    event_seating_id: i64,
}

async fn seat_map(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<SeatMapQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    params
        .validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let viewer = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    // Only the neutral view is cacheable; a viewer's own holds must never
    // leak into another client's map.
    if viewer.is_none() {
        if let Some(cached) = state.cache.get_seat_map(params.event_seating_id).await {
            return Ok((
                StatusCode::OK,
                [("content-type", "application/json"), ("x-cache", "HIT")],
                cached,
            ));
        }
    }

    let view = state
        .seatmap
        .seat_map(params.event_seating_id, viewer)
        .await
        .map_err(error_response)?;

    let json = serde_json::to_string(&view).map_err(|e| {
        tracing::error!("failed to serialize seat map: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to serialize seat map".to_string(),
        )
    })?;

    if viewer.is_none() {
        state
            .cache
            .save_seat_map(
                params.event_seating_id,
                &json,
                state.config.hold.seatmap_cache_ttl_seconds,
            )
            .await;
    }

    Ok((
        StatusCode::OK,
        [("content-type", "application/json"), ("x-cache", "MISS")],
        json,
    ))
}

/* ---------- HOLD ---------- */

#[derive(Debug, Deserialize, Validate)]
struct HoldSeatsRequest {
    #[validate(range(min = 1))]
    event_seating_id: i64,
    #[validate(length(min = 1, max = 10))]
    seat_uids: Vec<String>,
    ttl_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
struct HoldSeatsResponse {
    held: Vec<HoldReceipt>,
}

async fn hold_seats(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(req): Json<HoldSeatsRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    req.validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let ttl = requested_ttl(&state, req.ttl_seconds)?;

    let held = state
        .inventory
        .hold_many(req.event_seating_id, &req.seat_uids, &session.id, ttl)
        .await
        .map_err(error_response)?;

    state.cache.invalidate_seat_map(req.event_seating_id).await;

    Ok((StatusCode::OK, Json(HoldSeatsResponse { held })))
}

/* ---------- EXTEND ---------- */

#[derive(Debug, Deserialize, Validate)]
struct ExtendHoldsRequest {
    #[validate(range(min = 1))]
    event_seating_id: i64,
    #[validate(length(min = 1, max = 10))]
    seat_uids: Vec<String>,
    ttl_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
struct ExtendedHold {
    seat_uid: String,
    expires_at: DateTime<Utc>,
}

async fn extend_holds(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(req): Json<ExtendHoldsRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    req.validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let ttl = requested_ttl(&state, req.ttl_seconds)?;

    let mut extended = Vec::with_capacity(req.seat_uids.len());
    for seat_uid in &req.seat_uids {
        let expires_at = state
            .inventory
            .extend(req.event_seating_id, seat_uid, &session.id, ttl)
            .await
            .map_err(error_response)?;
        extended.push(ExtendedHold {
            seat_uid: seat_uid.clone(),
            expires_at,
        });
    }

    Ok((StatusCode::OK, Json(extended)))
}

/* ---------- RELEASE ---------- */

#[derive(Debug, Deserialize, Validate)]
struct ReleaseSeatsRequest {
    #[validate(range(min = 1))]
    event_seating_id: i64,
    #[validate(length(min = 1, max = 10))]
    seat_uids: Vec<String>,
}

async fn release_seats(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(req): Json<ReleaseSeatsRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    req.validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    for seat_uid in &req.seat_uids {
        state
            .inventory
            .release(req.event_seating_id, seat_uid, &session.id)
            .await
            .map_err(error_response)?;
    }

    state.cache.invalidate_seat_map(req.event_seating_id).await;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({"message": "seats released"})),
    ))
}

/* ---------- CONFIRM ---------- */

#[derive(Debug, Deserialize, Validate)]
struct ConfirmSeatsRequest {
    #[validate(range(min = 1))]
    event_seating_id: i64,
    #[validate(length(min = 1, max = 10))]
    seat_uids: Vec<String>,
    #[validate(length(min = 1, max = 64))]
    order_ref: String,
}

#[derive(Debug, Serialize)]
struct ConfirmedSeat {
    seat_uid: String,
    version: i32,
}

async fn confirm_seats(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(req): Json<ConfirmSeatsRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    req.validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    // Confirm is idempotent on order_ref, so a retry after a partial
    // failure converges instead of double-selling.
    let mut confirmed = Vec::with_capacity(req.seat_uids.len());
    for seat_uid in &req.seat_uids {
        let version = state
            .inventory
            .confirm(req.event_seating_id, seat_uid, &session.id, &req.order_ref)
            .await
            .map_err(error_response)?;
        confirmed.push(ConfirmedSeat {
            seat_uid: seat_uid.clone(),
            version,
        });
    }

    state.cache.invalidate_seat_map(req.event_seating_id).await;

    Ok((StatusCode::OK, Json(confirmed)))
}

/* ---------- helpers ---------- */

fn requested_ttl(
    state: &AppState,
    ttl_seconds: Option<i64>,
) -> Result<Duration, (StatusCode, String)> {
    let cfg = &state.config.hold;
    let seconds = ttl_seconds.unwrap_or(cfg.default_ttl_seconds);
    if seconds < 1 {
        return Err((
            StatusCode::BAD_REQUEST,
            "ttl_seconds must be positive".to_string(),
        ));
    }
    Ok(Duration::seconds(seconds.min(cfg.max_ttl_seconds)))
}
