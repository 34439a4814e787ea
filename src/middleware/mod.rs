use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use std::sync::Arc;

/// Name of the header the checkout layer forwards the session identity in.
pub const SESSION_HEADER: &str = "x-session-id";

/// Opaque checkout session identity. The inventory core never interprets it;
/// it only compares it against hold ownership.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
}

impl FromRequestParts<Arc<crate::AppState>> for Session {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                format!("{SESSION_HEADER} header is required"),
            ))?;

        if id.len() > 128 {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("{SESSION_HEADER} is too long"),
            ));
        }

        Ok(Session { id: id.to_string() })
    }
}
