//! Entity Store sobre PostgreSQL
//!
//! Un commit es una transacción: cada guarda bloquea su fila con
//! `SELECT ... FOR UPDATE` antes de comprobarla y los cambios se aplican en
//! orden. Cualquier error hace rollback al soltar la transacción.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgQueryResult;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::FleetStore;
use crate::models::{DashboardStats, Driver, FuelLog, MaintenanceLog, Trip, User, Vehicle};
use crate::rules::{Change, Guard, MutationSet};
use crate::utils::errors::{map_unique_violation, not_found_error, AppError, AppResult};

// Filas tal como vienen de la base de datos; los estados se guardan como texto

#[derive(Debug, sqlx::FromRow)]
struct VehicleRow {
    id: Uuid,
    plate_number: String,
    vehicle_type: String,
    max_weight: f64,
    mileage: f64,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<VehicleRow> for Vehicle {
    type Error = AppError;

    fn try_from(row: VehicleRow) -> AppResult<Self> {
        Ok(Vehicle {
            id: row.id,
            plate_number: row.plate_number,
            vehicle_type: row.vehicle_type,
            max_weight: row.max_weight,
            mileage: row.mileage,
            status: row.status.parse().map_err(corrupt_row)?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DriverRow {
    id: Uuid,
    name: String,
    license_number: String,
    license_expiry_date: NaiveDate,
    safety_score: f64,
    duty_status: String,
    avatar_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<DriverRow> for Driver {
    type Error = AppError;

    fn try_from(row: DriverRow) -> AppResult<Self> {
        Ok(Driver {
            id: row.id,
            name: row.name,
            license_number: row.license_number,
            license_expiry_date: row.license_expiry_date,
            safety_score: row.safety_score,
            duty_status: row.duty_status.parse().map_err(corrupt_row)?,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TripRow {
    id: Uuid,
    vehicle_id: Uuid,
    driver_id: Uuid,
    destination: String,
    cargo_weight: f64,
    status: String,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TripRow> for Trip {
    type Error = AppError;

    fn try_from(row: TripRow) -> AppResult<Self> {
        Ok(Trip {
            id: row.id,
            vehicle_id: row.vehicle_id,
            driver_id: row.driver_id,
            destination: row.destination,
            cargo_weight: row.cargo_weight,
            status: row.status.parse().map_err(corrupt_row)?,
            start_time: row.start_time,
            end_time: row.end_time,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MaintenanceRow {
    id: Uuid,
    vehicle_id: Uuid,
    description: String,
    cost: f64,
    created_at: DateTime<Utc>,
}

impl From<MaintenanceRow> for MaintenanceLog {
    fn from(row: MaintenanceRow) -> Self {
        MaintenanceLog {
            id: row.id,
            vehicle_id: row.vehicle_id,
            description: row.description,
            cost: row.cost,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FuelRow {
    id: Uuid,
    trip_id: Uuid,
    fuel_used: f64,
    fuel_cost: f64,
    created_at: DateTime<Utc>,
}

impl From<FuelRow> for FuelLog {
    fn from(row: FuelRow) -> Self {
        FuelLog {
            id: row.id,
            trip_id: row.trip_id,
            fuel_used: row.fuel_used,
            fuel_cost: row.fuel_cost,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> AppResult<Self> {
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role: row.role.parse().map_err(corrupt_row)?,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

fn corrupt_row(error: crate::models::ParseEnumError) -> AppError {
    AppError::Internal(format!("Corrupt row: {}", error))
}

fn convert_all<R, T>(rows: Vec<R>) -> AppResult<Vec<T>>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn require_row(result: PgQueryResult, resource: &str) -> AppResult<()> {
    if result.rows_affected() == 0 {
        return Err(not_found_error(resource));
    }
    Ok(())
}

const VEHICLE_COLUMNS: &str = "id, plate_number, vehicle_type, max_weight, mileage, status, created_at";
const DRIVER_COLUMNS: &str =
    "id, name, license_number, license_expiry_date, safety_score, duty_status, avatar_url, created_at";
const TRIP_COLUMNS: &str =
    "id, vehicle_id, driver_id, destination, cargo_weight, status, start_time, end_time, created_at";
const USER_COLUMNS: &str = "id, name, email, password_hash, role, is_active, created_at";

#[derive(Debug, Clone)]
pub struct PgFleetStore {
    pool: PgPool,
}

impl PgFleetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn locked_status(conn: &mut PgConnection, table: &str, column: &str, id: Uuid) -> AppResult<Option<String>> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1 FOR UPDATE", column, table);
        let row: Option<(String,)> = sqlx::query_as(&sql).bind(id).fetch_optional(&mut *conn).await?;
        Ok(row.map(|(status,)| status))
    }

    async fn check_guard(conn: &mut PgConnection, guard: &Guard) -> AppResult<()> {
        let holds = match guard {
            Guard::VehicleStatusIs { vehicle_id, expected } => {
                let status = Self::locked_status(conn, "vehicles", "status", *vehicle_id)
                    .await?
                    .ok_or_else(|| not_found_error("Vehicle"))?;
                status == expected.as_str()
            }
            Guard::DriverDutyIs { driver_id, expected } => {
                let duty = Self::locked_status(conn, "drivers", "duty_status", *driver_id)
                    .await?
                    .ok_or_else(|| not_found_error("Driver"))?;
                duty == expected.as_str()
            }
            Guard::TripStatusIs { trip_id, expected } => {
                let status = Self::locked_status(conn, "trips", "status", *trip_id)
                    .await?
                    .ok_or_else(|| not_found_error("Trip"))?;
                status == expected.as_str()
            }
            Guard::MaintenanceCountIs { vehicle_id, expected } => {
                // El bloqueo del vehículo serializa altas y bajas de sus registros
                Self::locked_status(conn, "vehicles", "status", *vehicle_id)
                    .await?
                    .ok_or_else(|| not_found_error("Vehicle"))?;
                let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM maintenance_logs WHERE vehicle_id = $1")
                    .bind(vehicle_id)
                    .fetch_one(&mut *conn)
                    .await?;
                count == *expected as i64
            }
        };

        if holds {
            Ok(())
        } else {
            Err(AppError::Conflict(guard.failure_message()))
        }
    }

    async fn apply_change(conn: &mut PgConnection, change: &Change) -> AppResult<()> {
        match change {
            Change::InsertVehicle(vehicle) => {
                sqlx::query(
                    r#"
                    INSERT INTO vehicles (id, plate_number, vehicle_type, max_weight, mileage, status, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    "#,
                )
                .bind(vehicle.id)
                .bind(&vehicle.plate_number)
                .bind(&vehicle.vehicle_type)
                .bind(vehicle.max_weight)
                .bind(vehicle.mileage)
                .bind(vehicle.status.as_str())
                .bind(vehicle.created_at)
                .execute(&mut *conn)
                .await
                .map_err(map_unique_violation)?;
            }
            Change::PatchVehicle { vehicle_id, patch } => {
                let result = sqlx::query(
                    r#"
                    UPDATE vehicles
                    SET plate_number = COALESCE($2, plate_number),
                        vehicle_type = COALESCE($3, vehicle_type),
                        max_weight = COALESCE($4, max_weight),
                        mileage = COALESCE($5, mileage),
                        status = COALESCE($6, status)
                    WHERE id = $1
                    "#,
                )
                .bind(vehicle_id)
                .bind(patch.plate_number.as_deref())
                .bind(patch.vehicle_type.as_deref())
                .bind(patch.max_weight)
                .bind(patch.mileage)
                .bind(patch.status.map(|s| s.as_str()))
                .execute(&mut *conn)
                .await
                .map_err(map_unique_violation)?;
                require_row(result, "Vehicle")?;
            }
            Change::SetVehicleStatus { vehicle_id, status } => {
                let result = sqlx::query("UPDATE vehicles SET status = $2 WHERE id = $1")
                    .bind(vehicle_id)
                    .bind(status.as_str())
                    .execute(&mut *conn)
                    .await?;
                require_row(result, "Vehicle")?;
            }
            Change::AddVehicleMileage { vehicle_id, km } => {
                let result = sqlx::query("UPDATE vehicles SET mileage = mileage + $2 WHERE id = $1")
                    .bind(vehicle_id)
                    .bind(*km)
                    .execute(&mut *conn)
                    .await?;
                require_row(result, "Vehicle")?;
            }

            Change::InsertDriver(driver) => {
                sqlx::query(
                    r#"
                    INSERT INTO drivers (id, name, license_number, license_expiry_date, safety_score, duty_status, avatar_url, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    "#,
                )
                .bind(driver.id)
                .bind(&driver.name)
                .bind(&driver.license_number)
                .bind(driver.license_expiry_date)
                .bind(driver.safety_score)
                .bind(driver.duty_status.as_str())
                .bind(driver.avatar_url.as_deref())
                .bind(driver.created_at)
                .execute(&mut *conn)
                .await
                .map_err(map_unique_violation)?;
            }
            Change::PatchDriver { driver_id, patch } => {
                let result = sqlx::query(
                    r#"
                    UPDATE drivers
                    SET name = COALESCE($2, name),
                        license_number = COALESCE($3, license_number),
                        license_expiry_date = COALESCE($4, license_expiry_date),
                        safety_score = COALESCE($5, safety_score),
                        duty_status = COALESCE($6, duty_status),
                        avatar_url = COALESCE($7, avatar_url)
                    WHERE id = $1
                    "#,
                )
                .bind(driver_id)
                .bind(patch.name.as_deref())
                .bind(patch.license_number.as_deref())
                .bind(patch.license_expiry_date)
                .bind(patch.safety_score)
                .bind(patch.duty_status.map(|d| d.as_str()))
                .bind(patch.avatar_url.as_deref())
                .execute(&mut *conn)
                .await
                .map_err(map_unique_violation)?;
                require_row(result, "Driver")?;
            }
            Change::SetDriverDuty { driver_id, duty } => {
                let result = sqlx::query("UPDATE drivers SET duty_status = $2 WHERE id = $1")
                    .bind(driver_id)
                    .bind(duty.as_str())
                    .execute(&mut *conn)
                    .await?;
                require_row(result, "Driver")?;
            }

            Change::InsertTrip(trip) => {
                sqlx::query(
                    r#"
                    INSERT INTO trips (id, vehicle_id, driver_id, destination, cargo_weight, status, start_time, end_time, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    "#,
                )
                .bind(trip.id)
                .bind(trip.vehicle_id)
                .bind(trip.driver_id)
                .bind(&trip.destination)
                .bind(trip.cargo_weight)
                .bind(trip.status.as_str())
                .bind(trip.start_time)
                .bind(trip.end_time)
                .bind(trip.created_at)
                .execute(&mut *conn)
                .await?;
            }
            Change::SetTripStatus {
                trip_id,
                status,
                start_time,
                end_time,
            } => {
                let result = sqlx::query(
                    r#"
                    UPDATE trips
                    SET status = $2,
                        start_time = COALESCE($3, start_time),
                        end_time = COALESCE($4, end_time)
                    WHERE id = $1
                    "#,
                )
                .bind(trip_id)
                .bind(status.as_str())
                .bind(*start_time)
                .bind(*end_time)
                .execute(&mut *conn)
                .await?;
                require_row(result, "Trip")?;
            }
            Change::DeleteTrip { trip_id } => {
                sqlx::query("DELETE FROM fuel_logs WHERE trip_id = $1")
                    .bind(trip_id)
                    .execute(&mut *conn)
                    .await?;
                let result = sqlx::query("DELETE FROM trips WHERE id = $1")
                    .bind(trip_id)
                    .execute(&mut *conn)
                    .await?;
                require_row(result, "Trip")?;
            }

            Change::InsertMaintenance(log) => {
                sqlx::query(
                    r#"
                    INSERT INTO maintenance_logs (id, vehicle_id, description, cost, created_at)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(log.id)
                .bind(log.vehicle_id)
                .bind(&log.description)
                .bind(log.cost)
                .bind(log.created_at)
                .execute(&mut *conn)
                .await?;
            }
            Change::DeleteMaintenance { log_id } => {
                let result = sqlx::query("DELETE FROM maintenance_logs WHERE id = $1")
                    .bind(log_id)
                    .execute(&mut *conn)
                    .await?;
                require_row(result, "Maintenance log")?;
            }

            Change::InsertFuelLog(log) => {
                sqlx::query(
                    r#"
                    INSERT INTO fuel_logs (id, trip_id, fuel_used, fuel_cost, created_at)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(log.id)
                .bind(log.trip_id)
                .bind(log.fuel_used)
                .bind(log.fuel_cost)
                .bind(log.created_at)
                .execute(&mut *conn)
                .await?;
            }

            Change::InsertUser(user) => {
                sqlx::query(
                    r#"
                    INSERT INTO users (id, name, email, password_hash, role, is_active, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    "#,
                )
                .bind(user.id)
                .bind(&user.name)
                .bind(&user.email)
                .bind(&user.password_hash)
                .bind(user.role.as_str())
                .bind(user.is_active)
                .bind(user.created_at)
                .execute(&mut *conn)
                .await
                .map_err(map_unique_violation)?;
            }
            Change::UpdateUserName { user_id, name } => {
                let result = sqlx::query("UPDATE users SET name = $2 WHERE id = $1")
                    .bind(user_id)
                    .bind(name)
                    .execute(&mut *conn)
                    .await?;
                require_row(result, "User")?;
            }
            Change::UpdateUserPassword { user_id, password_hash } => {
                let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
                    .bind(user_id)
                    .bind(password_hash)
                    .execute(&mut *conn)
                    .await?;
                require_row(result, "User")?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl FleetStore for PgFleetStore {
    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        let sql = format!("SELECT {} FROM vehicles ORDER BY created_at DESC", VEHICLE_COLUMNS);
        let rows: Vec<VehicleRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        convert_all(rows)
    }

    async fn get_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let sql = format!("SELECT {} FROM vehicles WHERE id = $1", VEHICLE_COLUMNS);
        let row: Option<VehicleRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.map(Vehicle::try_from).transpose()
    }

    async fn plate_number_taken(&self, plate_number: &str) -> AppResult<bool> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM vehicles WHERE plate_number = $1)")
            .bind(plate_number)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn list_drivers(&self) -> AppResult<Vec<Driver>> {
        let sql = format!("SELECT {} FROM drivers ORDER BY created_at DESC", DRIVER_COLUMNS);
        let rows: Vec<DriverRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        convert_all(rows)
    }

    async fn get_driver(&self, id: Uuid) -> AppResult<Option<Driver>> {
        let sql = format!("SELECT {} FROM drivers WHERE id = $1", DRIVER_COLUMNS);
        let row: Option<DriverRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.map(Driver::try_from).transpose()
    }

    async fn license_number_taken(&self, license_number: &str) -> AppResult<bool> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM drivers WHERE license_number = $1)")
            .bind(license_number)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn list_trips(&self) -> AppResult<Vec<Trip>> {
        let sql = format!("SELECT {} FROM trips ORDER BY created_at DESC", TRIP_COLUMNS);
        let rows: Vec<TripRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        convert_all(rows)
    }

    async fn get_trip(&self, id: Uuid) -> AppResult<Option<Trip>> {
        let sql = format!("SELECT {} FROM trips WHERE id = $1", TRIP_COLUMNS);
        let row: Option<TripRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.map(Trip::try_from).transpose()
    }

    async fn list_maintenance(&self) -> AppResult<Vec<MaintenanceLog>> {
        let rows: Vec<MaintenanceRow> = sqlx::query_as(
            "SELECT id, vehicle_id, description, cost, created_at FROM maintenance_logs ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(MaintenanceLog::from).collect())
    }

    async fn get_maintenance(&self, id: Uuid) -> AppResult<Option<MaintenanceLog>> {
        let row: Option<MaintenanceRow> =
            sqlx::query_as("SELECT id, vehicle_id, description, cost, created_at FROM maintenance_logs WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(MaintenanceLog::from))
    }

    async fn count_maintenance_for_vehicle(&self, vehicle_id: Uuid) -> AppResult<usize> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM maintenance_logs WHERE vehicle_id = $1")
            .bind(vehicle_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as usize)
    }

    async fn list_fuel_logs(&self) -> AppResult<Vec<FuelLog>> {
        let rows: Vec<FuelRow> = sqlx::query_as(
            "SELECT id, trip_id, fuel_used, fuel_cost, created_at FROM fuel_logs ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(FuelLog::from).collect())
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row: Option<UserRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.map(User::try_from).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let row: Option<UserRow> = sqlx::query_as(&sql).bind(email).fetch_optional(&self.pool).await?;
        row.map(User::try_from).transpose()
    }

    async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        let (active_vehicles, maintenance_alerts, idle_vehicles, pending_shipments, total_drivers, suspended_drivers): (
            i64,
            i64,
            i64,
            i64,
            i64,
            i64,
        ) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM vehicles WHERE status IN ('available', 'on_trip')),
                (SELECT COUNT(*) FROM vehicles WHERE status = 'in_shop'),
                (SELECT COUNT(*) FROM vehicles WHERE status = 'available'),
                (SELECT COUNT(*) FROM trips WHERE status = 'draft'),
                (SELECT COUNT(*) FROM drivers),
                (SELECT COUNT(*) FROM drivers WHERE duty_status = 'suspended')
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardStats {
            active_vehicles,
            maintenance_alerts,
            idle_vehicles,
            pending_shipments,
            total_drivers,
            suspended_drivers,
        })
    }

    async fn commit(&self, mutations: MutationSet) -> AppResult<()> {
        if mutations.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for guard in mutations.guards() {
            Self::check_guard(&mut tx, guard).await?;
        }
        for change in mutations.changes() {
            Self::apply_change(&mut tx, change).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
