use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registro de combustible (solo inserción)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelLog {
    pub id: Uuid,
    pub trip_id: Uuid,
    /// Litros
    pub fuel_used: f64,
    pub fuel_cost: f64,
    pub created_at: DateTime<Utc>,
}
