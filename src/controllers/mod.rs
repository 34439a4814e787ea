pub mod instances;
pub mod seating;

use axum::http::StatusCode;
use axum::Router;
use std::sync::Arc;

use crate::error::InventoryError;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(seating::routes())
        .merge(instances::routes())
}

/// Domain errors become plain (status, message) responses; storage failures
/// are logged here and surface as an opaque 500.
pub(crate) fn error_response(e: InventoryError) -> (StatusCode, String) {
    if let InventoryError::Storage(ref err) = e {
        tracing::error!("storage failure: {:?}", err);
        return (StatusCode::INTERNAL_SERVER_ERROR, "storage failure".to_string());
    }
    (status_for(&e), e.to_string())
}

/// 419 mirrors the seat-conflict code the rest of the platform already uses
/// for "somebody got there first".
fn status_for(e: &InventoryError) -> StatusCode {
    match e {
        InventoryError::SeatNotFound | InventoryError::InstanceNotFound => StatusCode::NOT_FOUND,
        InventoryError::SeatUnavailable => status_419(),
        InventoryError::VersionConflict | InventoryError::SeatAlreadySold => StatusCode::CONFLICT,
        InventoryError::HoldNotOwned => StatusCode::FORBIDDEN,
        InventoryError::HoldExpired => StatusCode::GONE,
        InventoryError::InvalidDesign(_) | InventoryError::EmptyGeometry => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        InventoryError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn status_419() -> StatusCode {
    StatusCode::from_u16(419).unwrap_or(StatusCode::CONFLICT)
}
