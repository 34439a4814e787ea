use thiserror::Error;

/// Recoverable inventory conditions plus the opaque storage escape hatch.
///
/// Everything except `Storage` is an expected outcome the caller handles:
/// `VersionConflict` means "retry against fresh state", the rest mean
/// "tell the user and let them pick another seat or resume their session".
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("seat not found")]
    SeatNotFound,

    #[error("seat is not available")]
    SeatUnavailable,

    #[error("concurrent update, retry with fresh state")]
    VersionConflict,

    #[error("hold is owned by another session")]
    HoldNotOwned,

    #[error("hold has expired")]
    HoldExpired,

    #[error("seat already sold under a different order")]
    SeatAlreadySold,

    #[error("seating design is not usable: {0}")]
    InvalidDesign(String),

    #[error("geometry snapshot contains no seats")]
    EmptyGeometry,

    #[error("event seating instance not found")]
    InstanceNotFound,

    #[error("storage failure")]
    Storage(#[from] sqlx::Error),
}
