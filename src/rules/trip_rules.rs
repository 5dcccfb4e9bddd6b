//! Reglas de viajes
//!
//! Creación (`draft`), transiciones `draft -> sent -> done`, cancelación y
//! borrado. Las transiciones que ocupan o liberan recursos escriben el estado
//! del vehículo y del conductor en el mismo [`MutationSet`] que el viaje.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::{estimated_distance_km, Accepted, Change, Guard, MutationSet, RejectReason, Rejection, Verdict};
use crate::models::{Alert, AlertKind, Driver, DutyStatus, Trip, TripStatus, Vehicle, VehicleStatus};

/// Datos de entrada de un nuevo viaje
#[derive(Debug, Clone)]
pub struct NewTrip<'a> {
    pub destination: &'a str,
    pub cargo_weight: f64,
}

fn check_capacity(vehicle: &Vehicle, cargo_weight: f64) -> Result<(), Rejection> {
    if cargo_weight <= vehicle.max_weight {
        return Ok(());
    }
    let alert = Alert::critical(
        AlertKind::OverweightCargo,
        format!(
            "Overweight attempt: {}kg on {} (max {}kg)",
            cargo_weight, vehicle.plate_number, vehicle.max_weight
        ),
        vehicle.id,
    );
    Err(Rejection::new(
        RejectReason::OverweightCargo,
        format!(
            "Cargo weight ({}kg) exceeds vehicle max capacity ({}kg)",
            cargo_weight, vehicle.max_weight
        ),
    )
    .with_alert(alert))
}

fn check_vehicle_available(vehicle: &Vehicle) -> Result<(), Rejection> {
    if vehicle.status == VehicleStatus::Available {
        return Ok(());
    }
    Err(Rejection::new(
        RejectReason::VehicleNotAvailable,
        format!("Vehicle is not available. Current status: {}", vehicle.status),
    ))
}

fn check_license(driver: &Driver, today: NaiveDate) -> Result<(), Rejection> {
    if !driver.license_expired_on(today) {
        return Ok(());
    }
    let alert = Alert::critical(
        AlertKind::ExpiredLicense,
        format!(
            "Trip blocked: {}'s license expired on {}",
            driver.name, driver.license_expiry_date
        ),
        driver.id,
    );
    Err(Rejection::new(
        RejectReason::LicenseExpired,
        format!("Driver {}'s license has expired on {}", driver.name, driver.license_expiry_date),
    )
    .with_alert(alert))
}

fn check_driver_on_duty(driver: &Driver) -> Result<(), Rejection> {
    if driver.duty_status == DutyStatus::On {
        return Ok(());
    }
    Err(Rejection::new(
        RejectReason::DriverNotOnDuty,
        format!("Driver {} is not on duty. Status: {}", driver.name, driver.duty_status),
    ))
}

/// Evalúa la creación de un viaje en `draft`.
///
/// Orden de comprobación: capacidad, disponibilidad del vehículo, licencia y
/// servicio del conductor. El primer fallo gana.
pub fn evaluate_trip_creation(
    vehicle: &Vehicle,
    driver: &Driver,
    request: NewTrip<'_>,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Verdict<Trip> {
    check_capacity(vehicle, request.cargo_weight)?;
    check_vehicle_available(vehicle)?;
    check_license(driver, today)?;
    check_driver_on_duty(driver)?;

    let trip = Trip {
        id: Uuid::new_v4(),
        vehicle_id: vehicle.id,
        driver_id: driver.id,
        destination: request.destination.to_string(),
        cargo_weight: request.cargo_weight,
        status: TripStatus::Draft,
        start_time: None,
        end_time: None,
        created_at: now,
    };

    let mutations = MutationSet::new()
        .guard(Guard::VehicleStatusIs {
            vehicle_id: vehicle.id,
            expected: VehicleStatus::Available,
        })
        .guard(Guard::DriverDutyIs {
            driver_id: driver.id,
            expected: DutyStatus::On,
        })
        .change(Change::InsertTrip(trip.clone()));

    Ok(Accepted::new(mutations, trip))
}

/// Devuelve vehículo y conductor ocupados por un viaje `sent`.
///
/// Solo se tocan los recursos que siguen en `on_trip`; un vehículo retirado o
/// un conductor suspendido durante el viaje conservan su estado.
fn release_resources(vehicle: &Vehicle, driver: &Driver, mutations: &mut MutationSet) {
    if vehicle.status == VehicleStatus::OnTrip {
        mutations.push_guard(Guard::VehicleStatusIs {
            vehicle_id: vehicle.id,
            expected: VehicleStatus::OnTrip,
        });
        mutations.push_change(Change::SetVehicleStatus {
            vehicle_id: vehicle.id,
            status: VehicleStatus::Available,
        });
    }
    if driver.duty_status == DutyStatus::OnTrip {
        mutations.push_guard(Guard::DriverDutyIs {
            driver_id: driver.id,
            expected: DutyStatus::OnTrip,
        });
        mutations.push_change(Change::SetDriverDuty {
            driver_id: driver.id,
            duty: DutyStatus::On,
        });
    }
}

/// Evalúa un cambio de estado solicitado como texto.
///
/// Tabla legal: `draft -> sent`, `sent -> done`, `draft|sent -> canceled`.
/// Todo lo demás (incluido pedir el estado actual) se rechaza.
pub fn evaluate_trip_transition(
    trip: &Trip,
    vehicle: &Vehicle,
    driver: &Driver,
    requested: &str,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Verdict<TripStatus> {
    let target: TripStatus = requested.parse().map_err(|_| {
        Rejection::new(
            RejectReason::InvalidStatus,
            format!("Status must be one of: {:?}", TripStatus::ALLOWED),
        )
    })?;

    let mut mutations = MutationSet::new().guard(Guard::TripStatusIs {
        trip_id: trip.id,
        expected: trip.status,
    });

    match (trip.status, target) {
        (TripStatus::Draft, TripStatus::Sent) => {
            check_vehicle_available(vehicle)?;
            check_driver_on_duty(driver)?;
            check_license(driver, today)?;

            mutations.push_guard(Guard::VehicleStatusIs {
                vehicle_id: vehicle.id,
                expected: VehicleStatus::Available,
            });
            mutations.push_guard(Guard::DriverDutyIs {
                driver_id: driver.id,
                expected: DutyStatus::On,
            });
            mutations.push_change(Change::SetTripStatus {
                trip_id: trip.id,
                status: TripStatus::Sent,
                start_time: Some(now),
                end_time: None,
            });
            mutations.push_change(Change::SetVehicleStatus {
                vehicle_id: vehicle.id,
                status: VehicleStatus::OnTrip,
            });
            mutations.push_change(Change::SetDriverDuty {
                driver_id: driver.id,
                duty: DutyStatus::OnTrip,
            });
        }
        (TripStatus::Sent, TripStatus::Done) => {
            mutations.push_change(Change::SetTripStatus {
                trip_id: trip.id,
                status: TripStatus::Done,
                start_time: None,
                end_time: Some(now),
            });
            mutations.push_change(Change::AddVehicleMileage {
                vehicle_id: vehicle.id,
                km: estimated_distance_km(trip.cargo_weight),
            });
            release_resources(vehicle, driver, &mut mutations);
        }
        (TripStatus::Draft | TripStatus::Sent, TripStatus::Canceled) => {
            mutations.push_change(Change::SetTripStatus {
                trip_id: trip.id,
                status: TripStatus::Canceled,
                start_time: None,
                end_time: None,
            });
            // Un borrador nunca ocupó recursos
            if trip.status == TripStatus::Sent {
                release_resources(vehicle, driver, &mut mutations);
            }
        }
        (from, _) if from.is_final() => {
            return Err(Rejection::new(
                RejectReason::InvalidTransition,
                format!("Trip is already {} and cannot change status", from),
            ));
        }
        (from, to) => {
            return Err(Rejection::new(
                RejectReason::InvalidTransition,
                format!("Cannot change trip status from {} to {}", from, to),
            ));
        }
    }

    Ok(Accepted::new(mutations, target))
}

/// Evalúa el borrado de un viaje. Un viaje `sent` libera sus recursos igual
/// que una cancelación.
pub fn evaluate_trip_deletion(trip: &Trip, vehicle: &Vehicle, driver: &Driver) -> Verdict<()> {
    let mut mutations = MutationSet::new().guard(Guard::TripStatusIs {
        trip_id: trip.id,
        expected: trip.status,
    });
    if trip.status == TripStatus::Sent {
        release_resources(vehicle, driver, &mut mutations);
    }
    mutations.push_change(Change::DeleteTrip { trip_id: trip.id });
    Ok(Accepted::new(mutations, ()))
}
