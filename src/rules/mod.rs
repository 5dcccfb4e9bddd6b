//! Motor de reglas
//!
//! Funciones puras que evalúan si una transición solicitada es legal sobre
//! una instantánea de las entidades. Cada evaluación devuelve un
//! [`MutationSet`] aceptado (cambios por campo, posiblemente sobre varias
//! entidades, más las guardas que el store vuelve a comprobar al confirmar)
//! o un [`Rejection`] con un código de motivo.
//!
//! Nada en este módulo toca el store ni el hub de broadcast.

pub mod alert_rules;
pub mod fleet_rules;
pub mod maintenance_rules;
pub mod mutation;
pub mod trip_rules;

use std::fmt;

use crate::models::Alert;

pub use mutation::{Change, Guard, MutationSet};

/// Kilómetros estimados por kg de carga.
pub const KM_PER_KG: f64 = 0.01;

/// Distancia estimada de un viaje a partir del peso de la carga.
///
/// Fórmula provisional (`peso * 0.01`), sin base física; se mantiene tal cual
/// hasta disponer de la distancia real de la ruta.
pub fn estimated_distance_km(cargo_weight: f64) -> f64 {
    cargo_weight * KM_PER_KG
}

/// Motivo de rechazo de una regla de negocio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    OverweightCargo,
    VehicleNotAvailable,
    VehicleRetired,
    LicenseExpired,
    DriverNotOnDuty,
    InvalidStatus,
    InvalidTransition,
    DuplicatePlateNumber,
    DuplicateLicenseNumber,
}

impl RejectReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::OverweightCargo => "OVERWEIGHT_CARGO",
            RejectReason::VehicleNotAvailable => "VEHICLE_NOT_AVAILABLE",
            RejectReason::VehicleRetired => "VEHICLE_RETIRED",
            RejectReason::LicenseExpired => "EXPIRED_LICENSE",
            RejectReason::DriverNotOnDuty => "DRIVER_NOT_ON_DUTY",
            RejectReason::InvalidStatus => "INVALID_STATUS",
            RejectReason::InvalidTransition => "INVALID_TRANSITION",
            RejectReason::DuplicatePlateNumber => "DUPLICATE_PLATE_NUMBER",
            RejectReason::DuplicateLicenseNumber => "DUPLICATE_LICENSE_NUMBER",
        }
    }

    /// Unicidad y recursos ya ocupados se exponen como 409, igual que una
    /// guarda que falla en el commit
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            RejectReason::DuplicatePlateNumber
                | RejectReason::DuplicateLicenseNumber
                | RejectReason::VehicleNotAvailable
                | RejectReason::DriverNotOnDuty
        )
    }
}

/// Rechazo de una regla. Puede llevar una alerta que se emite aunque la
/// operación falle.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub reason: RejectReason,
    pub message: String,
    pub alert: Option<Alert>,
}

impl Rejection {
    pub fn new(reason: RejectReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
            alert: None,
        }
    }

    pub fn with_alert(mut self, alert: Alert) -> Self {
        self.alert = Some(alert);
        self
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.reason.code())
    }
}

/// Resultado aceptado: las mutaciones a confirmar y el valor derivado
#[derive(Debug, Clone, PartialEq)]
pub struct Accepted<T> {
    pub mutations: MutationSet,
    pub outcome: T,
}

impl<T> Accepted<T> {
    pub fn new(mutations: MutationSet, outcome: T) -> Self {
        Self { mutations, outcome }
    }
}

pub type Verdict<T> = Result<Accepted<T>, Rejection>;
