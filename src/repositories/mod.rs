//! Entity Store
//!
//! Interfaz de persistencia de la flota: lecturas tipadas más un único punto
//! de escritura, [`FleetStore::commit`], que comprueba las guardas y aplica los
//! cambios de un [`MutationSet`] todo o nada.

pub mod memory_fleet_store;
pub mod pg_fleet_store;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{DashboardStats, Driver, FuelLog, MaintenanceLog, Trip, User, Vehicle};
use crate::rules::MutationSet;
use crate::utils::errors::AppResult;

pub use memory_fleet_store::MemoryFleetStore;
pub use pg_fleet_store::PgFleetStore;

#[async_trait]
pub trait FleetStore: Send + Sync {
    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>>;
    async fn get_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>>;
    async fn plate_number_taken(&self, plate_number: &str) -> AppResult<bool>;

    async fn list_drivers(&self) -> AppResult<Vec<Driver>>;
    async fn get_driver(&self, id: Uuid) -> AppResult<Option<Driver>>;
    async fn license_number_taken(&self, license_number: &str) -> AppResult<bool>;

    async fn list_trips(&self) -> AppResult<Vec<Trip>>;
    async fn get_trip(&self, id: Uuid) -> AppResult<Option<Trip>>;

    async fn list_maintenance(&self) -> AppResult<Vec<MaintenanceLog>>;
    async fn get_maintenance(&self, id: Uuid) -> AppResult<Option<MaintenanceLog>>;
    async fn count_maintenance_for_vehicle(&self, vehicle_id: Uuid) -> AppResult<usize>;

    async fn list_fuel_logs(&self) -> AppResult<Vec<FuelLog>>;

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Se recalcula desde el estado actual en cada llamada
    async fn dashboard_stats(&self) -> AppResult<DashboardStats>;

    /// Confirma un conjunto de mutaciones de forma atómica.
    ///
    /// Una guarda que ya no se cumple devuelve `Conflict` sin aplicar nada.
    async fn commit(&self, mutations: MutationSet) -> AppResult<()>;
}
