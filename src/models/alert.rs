//! Alertas emitidas por el sistema

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    OverweightCargo,
    ExpiredLicense,
    LicenseExpired,
    LicenseExpiring,
    MaintenanceStatusChange,
    VehicleInShop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Payload del evento `alert`: `{type, message, severity, entity_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub severity: Severity,
    pub entity_id: Uuid,
}

impl Alert {
    pub fn critical(kind: AlertKind, message: String, entity_id: Uuid) -> Self {
        Self { kind, message, severity: Severity::Critical, entity_id }
    }

    pub fn warning(kind: AlertKind, message: String, entity_id: Uuid) -> Self {
        Self { kind, message, severity: Severity::Warning, entity_id }
    }

    pub fn info(kind: AlertKind, message: String, entity_id: Uuid) -> Self {
        Self { kind, message, severity: Severity::Info, entity_id }
    }
}
