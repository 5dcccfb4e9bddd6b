use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registro de mantenimiento; mientras exista, el vehículo queda en taller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceLog {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub description: String,
    pub cost: f64,
    pub created_at: DateTime<Utc>,
}
