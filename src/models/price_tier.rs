use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Pricing reference data. Owned by tier management; read-only here.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PriceTier {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub price: f64,
    pub color: Option<String>,
}
