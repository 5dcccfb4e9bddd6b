use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Vehicle, VehicleStatus};

// Request para crear un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, max = 20))]
    pub plate_number: String,

    #[validate(length(min = 1, max = 50))]
    pub vehicle_type: String,

    #[validate(range(min = 1.0))]
    pub max_weight: f64,

    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub mileage: f64,

    pub status: Option<String>,
}

// Request para actualizar un vehículo; campos desconocidos (id, created_at...) se rechazan
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, max = 20))]
    pub plate_number: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub vehicle_type: Option<String>,

    #[validate(range(min = 1.0))]
    pub max_weight: Option<f64>,

    #[validate(range(min = 0.0))]
    pub mileage: Option<f64>,

    pub status: Option<String>,
}

/// Payload de `vehicleStatusUpdated`
#[derive(Debug, Clone, Serialize)]
pub struct VehicleStatusChange {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<VehicleStatus>,
}
