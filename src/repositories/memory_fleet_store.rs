//! Entity Store en memoria
//!
//! Usado por los tests y con `STORE_BACKEND=memory`. Cada commit toma el
//! lock de escritura, comprueba las guardas, aplica los cambios sobre una
//! copia de las tablas y solo la publica si todo ha ido bien.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::FleetStore;
use crate::models::{DashboardStats, Driver, FuelLog, MaintenanceLog, Trip, User, Vehicle};
use crate::rules::{Change, Guard, MutationSet};
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

#[derive(Debug, Clone, Default)]
struct Tables {
    vehicles: HashMap<Uuid, Vehicle>,
    drivers: HashMap<Uuid, Driver>,
    trips: HashMap<Uuid, Trip>,
    maintenance: HashMap<Uuid, MaintenanceLog>,
    fuel_logs: HashMap<Uuid, FuelLog>,
    users: HashMap<Uuid, User>,
}

impl Tables {
    fn check(&self, guard: &Guard) -> AppResult<()> {
        let holds = match guard {
            Guard::VehicleStatusIs { vehicle_id, expected } => {
                let vehicle = self.vehicles.get(vehicle_id).ok_or_else(|| not_found_error("Vehicle"))?;
                vehicle.status == *expected
            }
            Guard::DriverDutyIs { driver_id, expected } => {
                let driver = self.drivers.get(driver_id).ok_or_else(|| not_found_error("Driver"))?;
                driver.duty_status == *expected
            }
            Guard::TripStatusIs { trip_id, expected } => {
                let trip = self.trips.get(trip_id).ok_or_else(|| not_found_error("Trip"))?;
                trip.status == *expected
            }
            Guard::MaintenanceCountIs { vehicle_id, expected } => {
                self.maintenance_count(*vehicle_id) == *expected
            }
        };

        if holds {
            Ok(())
        } else {
            Err(AppError::Conflict(guard.failure_message()))
        }
    }

    fn maintenance_count(&self, vehicle_id: Uuid) -> usize {
        self.maintenance.values().filter(|log| log.vehicle_id == vehicle_id).count()
    }

    fn plate_in_use(&self, plate_number: &str, except: Option<Uuid>) -> bool {
        self.vehicles
            .values()
            .any(|v| v.plate_number == plate_number && Some(v.id) != except)
    }

    fn license_in_use(&self, license_number: &str, except: Option<Uuid>) -> bool {
        self.drivers
            .values()
            .any(|d| d.license_number == license_number && Some(d.id) != except)
    }

    fn vehicle_mut(&mut self, id: &Uuid) -> AppResult<&mut Vehicle> {
        self.vehicles.get_mut(id).ok_or_else(|| not_found_error("Vehicle"))
    }

    fn driver_mut(&mut self, id: &Uuid) -> AppResult<&mut Driver> {
        self.drivers.get_mut(id).ok_or_else(|| not_found_error("Driver"))
    }

    fn user_mut(&mut self, id: &Uuid) -> AppResult<&mut User> {
        self.users.get_mut(id).ok_or_else(|| not_found_error("User"))
    }

    fn apply(&mut self, change: &Change) -> AppResult<()> {
        match change {
            Change::InsertVehicle(vehicle) => {
                if self.plate_in_use(&vehicle.plate_number, None) {
                    return Err(conflict_error("vehicle", "plate number"));
                }
                self.vehicles.insert(vehicle.id, vehicle.clone());
            }
            Change::PatchVehicle { vehicle_id, patch } => {
                if let Some(plate) = &patch.plate_number {
                    if self.plate_in_use(plate, Some(*vehicle_id)) {
                        return Err(conflict_error("vehicle", "plate number"));
                    }
                }
                patch.merge_into(self.vehicle_mut(vehicle_id)?);
            }
            Change::SetVehicleStatus { vehicle_id, status } => {
                self.vehicle_mut(vehicle_id)?.status = *status;
            }
            Change::AddVehicleMileage { vehicle_id, km } => {
                self.vehicle_mut(vehicle_id)?.mileage += *km;
            }

            Change::InsertDriver(driver) => {
                if self.license_in_use(&driver.license_number, None) {
                    return Err(conflict_error("driver", "license number"));
                }
                self.drivers.insert(driver.id, driver.clone());
            }
            Change::PatchDriver { driver_id, patch } => {
                if let Some(license) = &patch.license_number {
                    if self.license_in_use(license, Some(*driver_id)) {
                        return Err(conflict_error("driver", "license number"));
                    }
                }
                patch.merge_into(self.driver_mut(driver_id)?);
            }
            Change::SetDriverDuty { driver_id, duty } => {
                self.driver_mut(driver_id)?.duty_status = *duty;
            }

            Change::InsertTrip(trip) => {
                if !self.vehicles.contains_key(&trip.vehicle_id) {
                    return Err(not_found_error("Vehicle"));
                }
                if !self.drivers.contains_key(&trip.driver_id) {
                    return Err(not_found_error("Driver"));
                }
                self.trips.insert(trip.id, trip.clone());
            }
            Change::SetTripStatus {
                trip_id,
                status,
                start_time,
                end_time,
            } => {
                let trip = self.trips.get_mut(trip_id).ok_or_else(|| not_found_error("Trip"))?;
                trip.status = *status;
                if start_time.is_some() {
                    trip.start_time = *start_time;
                }
                if end_time.is_some() {
                    trip.end_time = *end_time;
                }
            }
            Change::DeleteTrip { trip_id } => {
                self.trips.remove(trip_id).ok_or_else(|| not_found_error("Trip"))?;
                self.fuel_logs.retain(|_, log| log.trip_id != *trip_id);
            }

            Change::InsertMaintenance(log) => {
                if !self.vehicles.contains_key(&log.vehicle_id) {
                    return Err(not_found_error("Vehicle"));
                }
                self.maintenance.insert(log.id, log.clone());
            }
            Change::DeleteMaintenance { log_id } => {
                self.maintenance
                    .remove(log_id)
                    .ok_or_else(|| not_found_error("Maintenance log"))?;
            }

            Change::InsertFuelLog(log) => {
                if !self.trips.contains_key(&log.trip_id) {
                    return Err(not_found_error("Trip"));
                }
                self.fuel_logs.insert(log.id, log.clone());
            }

            Change::InsertUser(user) => {
                if self.users.values().any(|u| u.email == user.email) {
                    return Err(AppError::Conflict("User with this email already exists".to_string()));
                }
                self.users.insert(user.id, user.clone());
            }
            Change::UpdateUserName { user_id, name } => {
                self.user_mut(user_id)?.name = name.clone();
            }
            Change::UpdateUserPassword { user_id, password_hash } => {
                self.user_mut(user_id)?.password_hash = password_hash.clone();
            }
        }
        Ok(())
    }
}

fn newest_first<T>(rows: impl Iterator<Item = T>, created_at: impl Fn(&T) -> chrono::DateTime<chrono::Utc>) -> Vec<T> {
    let mut rows: Vec<T> = rows.collect();
    rows.sort_by_key(|row| std::cmp::Reverse(created_at(row)));
    rows
}

#[derive(Debug, Default)]
pub struct MemoryFleetStore {
    tables: RwLock<Tables>,
}

impl MemoryFleetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FleetStore for MemoryFleetStore {
    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        let tables = self.tables.read().await;
        Ok(newest_first(tables.vehicles.values().cloned(), |v| v.created_at))
    }

    async fn get_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        Ok(self.tables.read().await.vehicles.get(&id).cloned())
    }

    async fn plate_number_taken(&self, plate_number: &str) -> AppResult<bool> {
        Ok(self.tables.read().await.plate_in_use(plate_number, None))
    }

    async fn list_drivers(&self) -> AppResult<Vec<Driver>> {
        let tables = self.tables.read().await;
        Ok(newest_first(tables.drivers.values().cloned(), |d| d.created_at))
    }

    async fn get_driver(&self, id: Uuid) -> AppResult<Option<Driver>> {
        Ok(self.tables.read().await.drivers.get(&id).cloned())
    }

    async fn license_number_taken(&self, license_number: &str) -> AppResult<bool> {
        Ok(self.tables.read().await.license_in_use(license_number, None))
    }

    async fn list_trips(&self) -> AppResult<Vec<Trip>> {
        let tables = self.tables.read().await;
        Ok(newest_first(tables.trips.values().cloned(), |t| t.created_at))
    }

    async fn get_trip(&self, id: Uuid) -> AppResult<Option<Trip>> {
        Ok(self.tables.read().await.trips.get(&id).cloned())
    }

    async fn list_maintenance(&self) -> AppResult<Vec<MaintenanceLog>> {
        let tables = self.tables.read().await;
        Ok(newest_first(tables.maintenance.values().cloned(), |m| m.created_at))
    }

    async fn get_maintenance(&self, id: Uuid) -> AppResult<Option<MaintenanceLog>> {
        Ok(self.tables.read().await.maintenance.get(&id).cloned())
    }

    async fn count_maintenance_for_vehicle(&self, vehicle_id: Uuid) -> AppResult<usize> {
        Ok(self.tables.read().await.maintenance_count(vehicle_id))
    }

    async fn list_fuel_logs(&self) -> AppResult<Vec<FuelLog>> {
        let tables = self.tables.read().await;
        Ok(newest_first(tables.fuel_logs.values().cloned(), |f| f.created_at))
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        let tables = self.tables.read().await;
        Ok(DashboardStats::tally(
            tables.vehicles.values(),
            tables.drivers.values(),
            tables.trips.values(),
        ))
    }

    async fn commit(&self, mutations: MutationSet) -> AppResult<()> {
        if mutations.is_empty() {
            return Ok(());
        }

        let mut tables = self.tables.write().await;
        for guard in mutations.guards() {
            tables.check(guard)?;
        }

        let mut next = tables.clone();
        for change in mutations.changes() {
            next.apply(change)?;
        }
        *tables = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DutyStatus, TripStatus, VehicleStatus};
    use crate::rules::maintenance_rules::evaluate_maintenance_deletion;
    use chrono::{NaiveDate, Utc};

    fn vehicle(plate: &str) -> Vehicle {
        Vehicle::new(plate.into(), "Van".into(), 3500.0, 0.0, VehicleStatus::Available)
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing() {
        let store = MemoryFleetStore::new();
        let first = vehicle("VAN-01");
        store.commit(MutationSet::single(Change::InsertVehicle(first.clone()))).await.unwrap();

        let mutations = MutationSet::new()
            .change(Change::SetVehicleStatus {
                vehicle_id: first.id,
                status: VehicleStatus::InShop,
            })
            .change(Change::InsertVehicle(vehicle("VAN-01")));
        let result = store.commit(mutations).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        let stored = store.get_vehicle(first.id).await.unwrap().unwrap();
        assert_eq!(stored.status, VehicleStatus::Available);
        assert_eq!(store.list_vehicles().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_guard_rejects_commit() {
        let store = MemoryFleetStore::new();
        let van = vehicle("VAN-02");
        store.commit(MutationSet::single(Change::InsertVehicle(van.clone()))).await.unwrap();

        let mutations = MutationSet::new()
            .guard(Guard::VehicleStatusIs {
                vehicle_id: van.id,
                expected: VehicleStatus::OnTrip,
            })
            .change(Change::SetVehicleStatus {
                vehicle_id: van.id,
                status: VehicleStatus::Available,
            });
        assert!(matches!(store.commit(mutations).await, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_deleting_trip_cascades_fuel_logs() {
        let store = MemoryFleetStore::new();
        let van = vehicle("VAN-03");
        let driver = Driver::new(
            "Wade Warren".into(),
            "DL-5".into(),
            NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            DutyStatus::On,
        );
        let trip = Trip {
            id: Uuid::new_v4(),
            vehicle_id: van.id,
            driver_id: driver.id,
            destination: "Harbor".into(),
            cargo_weight: 500.0,
            status: TripStatus::Draft,
            start_time: None,
            end_time: None,
            created_at: Utc::now(),
        };
        let fuel = FuelLog {
            id: Uuid::new_v4(),
            trip_id: trip.id,
            fuel_used: 20.0,
            fuel_cost: 30.0,
            created_at: Utc::now(),
        };
        store
            .commit(
                MutationSet::new()
                    .change(Change::InsertVehicle(van))
                    .change(Change::InsertDriver(driver))
                    .change(Change::InsertTrip(trip.clone()))
                    .change(Change::InsertFuelLog(fuel)),
            )
            .await
            .unwrap();

        store
            .commit(MutationSet::single(Change::DeleteTrip { trip_id: trip.id }))
            .await
            .unwrap();
        assert!(store.list_fuel_logs().await.unwrap().is_empty());
        assert_eq!(store.dashboard_stats().await.unwrap().pending_shipments, 0);
    }

    #[tokio::test]
    async fn test_concurrent_log_deletions_never_strand_vehicle_in_shop() {
        let store = MemoryFleetStore::new();
        let mut van = vehicle("VAN-04");
        van.status = VehicleStatus::InShop;
        let log = |description: &str| MaintenanceLog {
            id: Uuid::new_v4(),
            vehicle_id: van.id,
            description: description.into(),
            cost: 100.0,
            created_at: Utc::now(),
        };
        let (brakes, tyres) = (log("Brakes"), log("Tyres"));
        store
            .commit(
                MutationSet::new()
                    .change(Change::InsertVehicle(van.clone()))
                    .change(Change::InsertMaintenance(brakes.clone()))
                    .change(Change::InsertMaintenance(tyres.clone())),
            )
            .await
            .unwrap();

        // Ambos borrados se evalúan sobre la misma lectura
        let first = evaluate_maintenance_deletion(&brakes, Some(&van), 2).unwrap();
        let second = evaluate_maintenance_deletion(&tyres, Some(&van), 2).unwrap();
        store.commit(first.mutations).await.unwrap();
        assert!(matches!(store.commit(second.mutations).await, Err(AppError::Conflict(_))));

        let open_logs = store.count_maintenance_for_vehicle(van.id).await.unwrap();
        assert_eq!(open_logs, 1);
        let retry = evaluate_maintenance_deletion(&tyres, Some(&van), open_logs).unwrap();
        assert!(retry.outcome);
        store.commit(retry.mutations).await.unwrap();

        let stored = store.get_vehicle(van.id).await.unwrap().unwrap();
        assert_eq!(stored.status, VehicleStatus::Available);
        assert_eq!(store.count_maintenance_for_vehicle(van.id).await.unwrap(), 0);
    }
}
