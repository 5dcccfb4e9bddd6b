//! Reglas de vehículos, conductores y combustible
//!
//! Altas, patches parciales y bajas lógicas. Las bajas nunca borran filas:
//! un vehículo pasa a `retired` y un conductor a `suspended`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Accepted, Change, Guard, MutationSet, RejectReason, Rejection, Verdict};
use crate::dto::driver_dto::{CreateDriverRequest, UpdateDriverRequest};
use crate::dto::fuel_dto::CreateFuelLogRequest;
use crate::dto::vehicle_dto::{CreateVehicleRequest, UpdateVehicleRequest};
use crate::models::driver::DriverPatch;
use crate::models::vehicle::VehiclePatch;
use crate::models::{Driver, DutyStatus, FuelLog, Trip, Vehicle, VehicleStatus};

fn parse_vehicle_status(raw: &str) -> Result<VehicleStatus, Rejection> {
    raw.parse().map_err(|_| {
        Rejection::new(
            RejectReason::InvalidStatus,
            format!("Status must be one of: {:?}", VehicleStatus::ALLOWED),
        )
    })
}

fn parse_duty_status(raw: &str) -> Result<DutyStatus, Rejection> {
    raw.parse().map_err(|_| {
        Rejection::new(
            RejectReason::InvalidStatus,
            format!("Duty status must be one of: {:?}", DutyStatus::ALLOWED),
        )
    })
}

fn duplicate_plate() -> Rejection {
    Rejection::new(
        RejectReason::DuplicatePlateNumber,
        "Vehicle with this plate number already exists",
    )
}

fn duplicate_license() -> Rejection {
    Rejection::new(
        RejectReason::DuplicateLicenseNumber,
        "Driver with this license number already exists",
    )
}

/// Alta de vehículo. `plate_taken` indica si la matrícula ya existe.
pub fn evaluate_vehicle_creation(
    request: &CreateVehicleRequest,
    plate_taken: bool,
    now: DateTime<Utc>,
) -> Verdict<Vehicle> {
    if plate_taken {
        return Err(duplicate_plate());
    }
    let status = match request.status.as_deref() {
        Some(raw) => parse_vehicle_status(raw)?,
        None => VehicleStatus::Available,
    };

    let vehicle = Vehicle {
        id: Uuid::new_v4(),
        plate_number: request.plate_number.trim().to_string(),
        vehicle_type: request.vehicle_type.clone(),
        max_weight: request.max_weight,
        mileage: request.mileage,
        status,
        created_at: now,
    };

    Ok(Accepted::new(
        MutationSet::single(Change::InsertVehicle(vehicle.clone())),
        vehicle,
    ))
}

/// Patch parcial de vehículo.
///
/// `retired` es terminal: no se acepta ningún otro estado sobre un vehículo
/// retirado. Un patch vacío produce un conjunto vacío.
pub fn evaluate_vehicle_patch(
    current: &Vehicle,
    request: &UpdateVehicleRequest,
    plate_taken: bool,
) -> Verdict<VehiclePatch> {
    let status = request.status.as_deref().map(parse_vehicle_status).transpose()?;

    if let Some(status) = status {
        if current.status.is_terminal() && status != current.status {
            return Err(Rejection::new(
                RejectReason::VehicleRetired,
                format!(
                    "Vehicle {} is retired; its status can no longer change",
                    current.plate_number
                ),
            ));
        }
    }

    let plate_number = request.plate_number.as_ref().map(|plate| plate.trim().to_string());
    if let Some(plate) = &plate_number {
        if plate != &current.plate_number && plate_taken {
            return Err(duplicate_plate());
        }
    }

    let patch = VehiclePatch {
        plate_number,
        vehicle_type: request.vehicle_type.clone(),
        max_weight: request.max_weight,
        mileage: request.mileage,
        status,
    };

    if patch.is_empty() {
        return Ok(Accepted::new(MutationSet::new(), patch));
    }

    let mut mutations = MutationSet::new();
    if status.is_some() {
        mutations.push_guard(Guard::VehicleStatusIs {
            vehicle_id: current.id,
            expected: current.status,
        });
    }
    mutations.push_change(Change::PatchVehicle {
        vehicle_id: current.id,
        patch: patch.clone(),
    });

    Ok(Accepted::new(mutations, patch))
}

/// Baja lógica de vehículo. Idempotente: retirar un vehículo ya retirado no
/// produce cambios. El resultado indica si hubo cambio.
pub fn evaluate_vehicle_retirement(vehicle: &Vehicle) -> Verdict<bool> {
    if vehicle.status.is_terminal() {
        return Ok(Accepted::new(MutationSet::new(), false));
    }
    let mutations = MutationSet::new()
        .guard(Guard::VehicleStatusIs {
            vehicle_id: vehicle.id,
            expected: vehicle.status,
        })
        .change(Change::SetVehicleStatus {
            vehicle_id: vehicle.id,
            status: VehicleStatus::Retired,
        });
    Ok(Accepted::new(mutations, true))
}

/// Alta de conductor
pub fn evaluate_driver_creation(
    request: &CreateDriverRequest,
    license_taken: bool,
    now: DateTime<Utc>,
) -> Verdict<Driver> {
    if license_taken {
        return Err(duplicate_license());
    }
    let duty_status = match request.duty_status.as_deref() {
        Some(raw) => parse_duty_status(raw)?,
        None => DutyStatus::On,
    };

    let driver = Driver {
        id: Uuid::new_v4(),
        name: request.name.clone(),
        license_number: request.license_number.trim().to_string(),
        license_expiry_date: request.license_expiry_date,
        safety_score: request.safety_score.unwrap_or(100.0),
        duty_status,
        avatar_url: request.avatar_url.clone(),
        created_at: now,
    };

    Ok(Accepted::new(
        MutationSet::single(Change::InsertDriver(driver.clone())),
        driver,
    ))
}

/// Patch parcial de conductor
pub fn evaluate_driver_patch(
    current: &Driver,
    request: &UpdateDriverRequest,
    license_taken: bool,
) -> Verdict<DriverPatch> {
    let duty_status = request.duty_status.as_deref().map(parse_duty_status).transpose()?;

    let license_number = request.license_number.as_ref().map(|license| license.trim().to_string());
    if let Some(license) = &license_number {
        if license != &current.license_number && license_taken {
            return Err(duplicate_license());
        }
    }

    let patch = DriverPatch {
        name: request.name.clone(),
        license_number,
        license_expiry_date: request.license_expiry_date,
        safety_score: request.safety_score,
        duty_status,
        avatar_url: request.avatar_url.clone(),
    };

    if patch.is_empty() {
        return Ok(Accepted::new(MutationSet::new(), patch));
    }

    let mut mutations = MutationSet::new();
    if duty_status.is_some() {
        mutations.push_guard(Guard::DriverDutyIs {
            driver_id: current.id,
            expected: current.duty_status,
        });
    }
    mutations.push_change(Change::PatchDriver {
        driver_id: current.id,
        patch: patch.clone(),
    });

    Ok(Accepted::new(mutations, patch))
}

/// Baja lógica de conductor (`suspended`). Idempotente.
pub fn evaluate_driver_suspension(driver: &Driver) -> Verdict<bool> {
    if driver.duty_status == DutyStatus::Suspended {
        return Ok(Accepted::new(MutationSet::new(), false));
    }
    let mutations = MutationSet::new()
        .guard(Guard::DriverDutyIs {
            driver_id: driver.id,
            expected: driver.duty_status,
        })
        .change(Change::SetDriverDuty {
            driver_id: driver.id,
            duty: DutyStatus::Suspended,
        });
    Ok(Accepted::new(mutations, true))
}

/// Registro de combustible ligado a un viaje existente
pub fn evaluate_fuel_log(trip: &Trip, request: &CreateFuelLogRequest, now: DateTime<Utc>) -> Verdict<FuelLog> {
    let log = FuelLog {
        id: Uuid::new_v4(),
        trip_id: trip.id,
        fuel_used: request.fuel_used,
        fuel_cost: request.fuel_cost,
        created_at: now,
    };
    Ok(Accepted::new(MutationSet::single(Change::InsertFuelLog(log.clone())), log))
}
