//! Modelos del sistema
//!
//! Este módulo contiene las entidades de la flota (vehículos, conductores,
//! viajes, mantenimiento, combustible), los usuarios y los tipos de eventos
//! derivados (alertas y estadísticas del dashboard).

pub mod alert;
pub mod driver;
pub mod fuel;
pub mod maintenance;
pub mod stats;
pub mod trip;
pub mod user;
pub mod vehicle;

pub use alert::{Alert, AlertKind, Severity};
pub use driver::{Driver, DutyStatus};
pub use fuel::FuelLog;
pub use maintenance::MaintenanceLog;
pub use stats::DashboardStats;
pub use trip::{Trip, TripStatus};
pub use user::{Role, User};
pub use vehicle::{Vehicle, VehicleStatus};

/// Error al convertir un texto en uno de los enums de estado
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("'{value}' is not a valid {kind}. Allowed: {allowed:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
    pub allowed: &'static [&'static str],
}
