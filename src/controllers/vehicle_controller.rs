use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::controllers::{broadcast_dashboard, settle};
use crate::dto::vehicle_dto::{CreateVehicleRequest, UpdateVehicleRequest, VehicleStatusChange};
use crate::middleware::AuthenticatedUser;
use crate::models::Vehicle;
use crate::realtime::FleetEvent;
use crate::rules::fleet_rules;
use crate::services::VehicleScope;
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppResult};

pub struct VehicleController {
    state: AppState,
}

impl VehicleController {
    pub fn new(state: &AppState) -> Self {
        Self { state: state.clone() }
    }

    async fn load(&self, id: Uuid) -> AppResult<Vehicle> {
        self.state
            .store
            .get_vehicle(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle"))
    }

    pub async fn list(&self, user: &AuthenticatedUser) -> AppResult<Vec<Vehicle>> {
        let scope = VehicleScope::for_role(user.role);
        let vehicles = self.state.store.list_vehicles().await?;
        Ok(vehicles.into_iter().filter(|v| scope.includes(v.status)).collect())
    }

    pub async fn create(&self, request: CreateVehicleRequest) -> AppResult<Vehicle> {
        request.validate()?;

        let plate_taken = self
            .state
            .store
            .plate_number_taken(request.plate_number.trim())
            .await?;
        let accepted = settle(
            &self.state,
            fleet_rules::evaluate_vehicle_creation(&request, plate_taken, Utc::now()),
        )?;

        self.state.store.commit(accepted.mutations).await?;
        let vehicle = accepted.outcome;
        info!("🚚 Vehículo {} creado ({})", vehicle.plate_number, vehicle.status);

        self.state.hub.publish(&FleetEvent::VehicleCreated(vehicle.clone()));
        broadcast_dashboard(&self.state).await;
        Ok(vehicle)
    }

    /// Patch parcial; siempre publica `vehicleStatusUpdated` con el estado final
    pub async fn update(&self, id: Uuid, request: UpdateVehicleRequest) -> AppResult<Vehicle> {
        request.validate()?;
        let current = self.load(id).await?;

        let plate_taken = match request.plate_number.as_deref().map(str::trim) {
            Some(plate) if plate != current.plate_number => self.state.store.plate_number_taken(plate).await?,
            _ => false,
        };
        let accepted = settle(
            &self.state,
            fleet_rules::evaluate_vehicle_patch(&current, &request, plate_taken),
        )?;

        self.state.store.commit(accepted.mutations).await?;
        let vehicle = self.load(id).await?;

        let previous_status = (vehicle.status != current.status).then_some(current.status);
        if let Some(previous) = previous_status {
            info!("🔄 Vehículo {}: {} -> {}", vehicle.plate_number, previous, vehicle.status);
        }

        self.state.hub.publish(&FleetEvent::VehicleStatusUpdated(VehicleStatusChange {
            vehicle: vehicle.clone(),
            previous_status,
        }));
        broadcast_dashboard(&self.state).await;
        Ok(vehicle)
    }

    /// Baja lógica (`retired`). Repetirla devuelve el vehículo sin publicar nada.
    pub async fn retire(&self, id: Uuid) -> AppResult<Vehicle> {
        let current = self.load(id).await?;
        let accepted = settle(&self.state, fleet_rules::evaluate_vehicle_retirement(&current))?;

        if !accepted.outcome {
            return Ok(current);
        }

        self.state.store.commit(accepted.mutations).await?;
        let vehicle = self.load(id).await?;
        info!("🪦 Vehículo {} retirado", vehicle.plate_number);

        self.state.hub.publish(&FleetEvent::VehicleStatusUpdated(VehicleStatusChange {
            vehicle: vehicle.clone(),
            previous_status: Some(current.status),
        }));
        broadcast_dashboard(&self.state).await;
        Ok(vehicle)
    }
}
