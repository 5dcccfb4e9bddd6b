//! Conjuntos de mutaciones
//!
//! Un [`MutationSet`] es la unidad de confirmación del store: primero se
//! comprueban todas las guardas contra el estado persistido y después se
//! aplican todos los cambios, todo o nada.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::driver::DriverPatch;
use crate::models::vehicle::VehiclePatch;
use crate::models::{
    Driver, DutyStatus, FuelLog, MaintenanceLog, Trip, TripStatus, User, Vehicle, VehicleStatus,
};

/// Condición que debe seguir siendo cierta en el momento de confirmar
#[derive(Debug, Clone, PartialEq)]
pub enum Guard {
    VehicleStatusIs { vehicle_id: Uuid, expected: VehicleStatus },
    DriverDutyIs { driver_id: Uuid, expected: DutyStatus },
    TripStatusIs { trip_id: Uuid, expected: TripStatus },
    MaintenanceCountIs { vehicle_id: Uuid, expected: usize },
}

impl Guard {
    /// Mensaje cuando la guarda falla al confirmar
    pub fn failure_message(&self) -> String {
        match self {
            Guard::VehicleStatusIs { expected, .. } => format!(
                "Vehicle status changed concurrently (expected {}); retry the request",
                expected
            ),
            Guard::DriverDutyIs { expected, .. } => format!(
                "Driver duty status changed concurrently (expected {}); retry the request",
                expected
            ),
            Guard::TripStatusIs { expected, .. } => format!(
                "Trip status changed concurrently (expected {}); retry the request",
                expected
            ),
            Guard::MaintenanceCountIs { .. } => {
                "Maintenance logs for this vehicle changed concurrently; retry the request".to_string()
            }
        }
    }
}

/// Cambio a nivel de campo sobre una entidad
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    InsertVehicle(Vehicle),
    PatchVehicle { vehicle_id: Uuid, patch: VehiclePatch },
    SetVehicleStatus { vehicle_id: Uuid, status: VehicleStatus },
    AddVehicleMileage { vehicle_id: Uuid, km: f64 },

    InsertDriver(Driver),
    PatchDriver { driver_id: Uuid, patch: DriverPatch },
    SetDriverDuty { driver_id: Uuid, duty: DutyStatus },

    InsertTrip(Trip),
    /// `start_time` / `end_time` en `None` conservan el valor actual
    SetTripStatus {
        trip_id: Uuid,
        status: TripStatus,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
    },
    /// Borra el viaje y sus registros de combustible
    DeleteTrip { trip_id: Uuid },

    InsertMaintenance(MaintenanceLog),
    DeleteMaintenance { log_id: Uuid },

    InsertFuelLog(FuelLog),

    InsertUser(User),
    UpdateUserName { user_id: Uuid, name: String },
    UpdateUserPassword { user_id: Uuid, password_hash: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationSet {
    guards: Vec<Guard>,
    changes: Vec<Change>,
}

impl MutationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conjunto de un único cambio sin guardas
    pub fn single(change: Change) -> Self {
        Self::new().change(change)
    }

    pub fn guard(mut self, guard: Guard) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn change(mut self, change: Change) -> Self {
        self.changes.push(change);
        self
    }

    pub fn push_guard(&mut self, guard: Guard) {
        self.guards.push(guard);
    }

    pub fn push_change(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn guards(&self) -> &[Guard] {
        &self.guards
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}
