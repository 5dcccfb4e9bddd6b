//! Reglas de mantenimiento
//!
//! Abrir un registro manda el vehículo al taller; borrar el último registro
//! abierto lo devuelve a `available`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Accepted, Change, Guard, MutationSet, RejectReason, Rejection, Verdict};
use crate::models::{Alert, AlertKind, MaintenanceLog, Vehicle, VehicleStatus};

const REASON_PREVIEW_CHARS: usize = 60;

/// Resultado de abrir un registro de mantenimiento
#[derive(Debug, Clone, PartialEq)]
pub struct MaintenanceOpened {
    pub log: MaintenanceLog,
    pub previous_status: VehicleStatus,
    pub alert: Alert,
}

/// Evalúa la apertura de un registro de mantenimiento.
///
/// El vehículo pasa a `in_shop` venga del estado que venga, salvo `retired`,
/// que es terminal y se rechaza.
pub fn evaluate_maintenance_creation(
    vehicle: &Vehicle,
    description: &str,
    cost: f64,
    now: DateTime<Utc>,
) -> Verdict<MaintenanceOpened> {
    if vehicle.status.is_terminal() {
        return Err(Rejection::new(
            RejectReason::VehicleRetired,
            format!(
                "Vehicle {} is retired and cannot be sent to maintenance",
                vehicle.plate_number
            ),
        ));
    }

    let log = MaintenanceLog {
        id: Uuid::new_v4(),
        vehicle_id: vehicle.id,
        description: description.to_string(),
        cost,
        created_at: now,
    };

    let preview: String = description.chars().take(REASON_PREVIEW_CHARS).collect();
    let alert = Alert::warning(
        AlertKind::MaintenanceStatusChange,
        format!(
            "Vehicle {} sent to maintenance shop. Reason: {}",
            vehicle.plate_number, preview
        ),
        vehicle.id,
    );

    let mutations = MutationSet::new()
        .guard(Guard::VehicleStatusIs {
            vehicle_id: vehicle.id,
            expected: vehicle.status,
        })
        .change(Change::InsertMaintenance(log.clone()))
        .change(Change::SetVehicleStatus {
            vehicle_id: vehicle.id,
            status: VehicleStatus::InShop,
        });

    Ok(Accepted::new(
        mutations,
        MaintenanceOpened {
            log,
            previous_status: vehicle.status,
            alert,
        },
    ))
}

/// Evalúa el borrado de un registro de mantenimiento.
///
/// `open_logs` cuenta los registros del vehículo incluyendo el que se borra.
/// El resultado indica si el vehículo vuelve a `available`.
pub fn evaluate_maintenance_deletion(
    log: &MaintenanceLog,
    vehicle: Option<&Vehicle>,
    open_logs: usize,
) -> Verdict<bool> {
    let mut mutations = MutationSet::single(Change::DeleteMaintenance { log_id: log.id });

    let in_shop = vehicle.is_some_and(|v| v.status == VehicleStatus::InShop);
    let restores = in_shop && open_logs <= 1;

    // Recuento fijado también cuando no se restaura
    if in_shop {
        mutations.push_guard(Guard::VehicleStatusIs {
            vehicle_id: log.vehicle_id,
            expected: VehicleStatus::InShop,
        });
        mutations.push_guard(Guard::MaintenanceCountIs {
            vehicle_id: log.vehicle_id,
            expected: open_logs,
        });
    }

    if restores {
        mutations.push_change(Change::SetVehicleStatus {
            vehicle_id: log.vehicle_id,
            status: VehicleStatus::Available,
        });
    }

    Ok(Accepted::new(mutations, restores))
}
