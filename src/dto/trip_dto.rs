use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Driver, Trip, TripStatus, Vehicle};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTripRequest {
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,

    #[validate(length(min = 1, max = 200))]
    pub destination: String,

    #[validate(range(min = 0.0))]
    pub cargo_weight: f64,
}

#[derive(Debug, Deserialize)]
pub struct TripStatusUpdate {
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TripVehicle {
    pub id: Uuid,
    pub plate_number: String,
    pub vehicle_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TripDriver {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// Response de viaje con resumen del vehículo y del conductor
#[derive(Debug, Clone, Serialize)]
pub struct TripResponse {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    pub destination: String,
    pub cargo_weight: f64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: TripStatus,
    pub created_at: DateTime<Utc>,
    pub vehicle: Option<TripVehicle>,
    pub driver: Option<TripDriver>,
}

impl TripResponse {
    pub fn build(trip: Trip, vehicle: Option<&Vehicle>, driver: Option<&Driver>) -> Self {
        Self {
            id: trip.id,
            vehicle_id: trip.vehicle_id,
            driver_id: trip.driver_id,
            destination: trip.destination,
            cargo_weight: trip.cargo_weight,
            start_time: trip.start_time,
            end_time: trip.end_time,
            status: trip.status,
            created_at: trip.created_at,
            vehicle: vehicle.map(|v| TripVehicle {
                id: v.id,
                plate_number: v.plate_number.clone(),
                vehicle_type: v.vehicle_type.clone(),
            }),
            driver: driver.map(|d| TripDriver {
                id: d.id,
                name: d.name.clone(),
                avatar_url: d.avatar_url.clone(),
            }),
        }
    }
}

/// Payload de `tripStatusUpdated`
#[derive(Debug, Clone, Serialize)]
pub struct TripStatusChange {
    pub trip_id: Uuid,
    pub status: TripStatus,
}
