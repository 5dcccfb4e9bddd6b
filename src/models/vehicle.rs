//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle y su máquina de estados de disponibilidad.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ParseEnumError;

/// Estado del vehículo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    OnTrip,
    InShop,
    Retired,
}

impl VehicleStatus {
    pub const ALLOWED: &'static [&'static str] = &["available", "on_trip", "in_shop", "retired"];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "available",
            VehicleStatus::OnTrip => "on_trip",
            VehicleStatus::InShop => "in_shop",
            VehicleStatus::Retired => "retired",
        }
    }

    /// `retired` es terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, VehicleStatus::Retired)
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "available" => Ok(VehicleStatus::Available),
            "on_trip" => Ok(VehicleStatus::OnTrip),
            "in_shop" => Ok(VehicleStatus::InShop),
            "retired" => Ok(VehicleStatus::Retired),
            _ => Err(ParseEnumError {
                kind: "vehicle status",
                value: s.to_string(),
                allowed: Self::ALLOWED,
            }),
        }
    }
}

/// Vehicle principal - mapea a la tabla vehicles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub plate_number: String,
    pub vehicle_type: String,
    /// Carga máxima en kg
    pub max_weight: f64,
    /// Kilometraje acumulado
    pub mileage: f64,
    pub status: VehicleStatus,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn new(plate_number: String, vehicle_type: String, max_weight: f64, mileage: f64, status: VehicleStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            plate_number,
            vehicle_type,
            max_weight,
            mileage,
            status,
            created_at: Utc::now(),
        }
    }
}

/// Cambios parciales permitidos sobre un vehículo.
///
/// Solo estos campos son modificables; `id` y `created_at` son inmutables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehiclePatch {
    pub plate_number: Option<String>,
    pub vehicle_type: Option<String>,
    pub max_weight: Option<f64>,
    pub mileage: Option<f64>,
    pub status: Option<VehicleStatus>,
}

impl VehiclePatch {
    pub fn is_empty(&self) -> bool {
        *self == VehiclePatch::default()
    }

    /// Único punto de merge de un patch sobre un vehículo
    pub fn merge_into(&self, vehicle: &mut Vehicle) {
        if let Some(plate_number) = &self.plate_number {
            vehicle.plate_number = plate_number.clone();
        }
        if let Some(vehicle_type) = &self.vehicle_type {
            vehicle.vehicle_type = vehicle_type.clone();
        }
        if let Some(max_weight) = self.max_weight {
            vehicle.max_weight = max_weight;
        }
        if let Some(mileage) = self.mileage {
            vehicle.mileage = mileage;
        }
        if let Some(status) = self.status {
            vehicle.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing_is_case_insensitive() {
        assert_eq!("IN_SHOP".parse::<VehicleStatus>(), Ok(VehicleStatus::InShop));
        assert!("parked".parse::<VehicleStatus>().is_err());
    }

    #[test]
    fn test_patch_only_touches_set_fields() {
        let mut vehicle = Vehicle::new("AB12-34C".into(), "Van".into(), 3500.0, 100.0, VehicleStatus::Available);
        let id = vehicle.id;
        let patch = VehiclePatch {
            mileage: Some(250.0),
            ..Default::default()
        };
        patch.merge_into(&mut vehicle);
        assert_eq!(vehicle.mileage, 250.0);
        assert_eq!(vehicle.plate_number, "AB12-34C");
        assert_eq!(vehicle.id, id);
    }
}
