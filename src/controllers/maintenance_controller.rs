use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::controllers::{broadcast_dashboard, settle};
use crate::dto::maintenance_dto::CreateMaintenanceRequest;
use crate::dto::vehicle_dto::VehicleStatusChange;
use crate::models::{MaintenanceLog, VehicleStatus};
use crate::realtime::FleetEvent;
use crate::rules::maintenance_rules;
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppResult};

pub struct MaintenanceController {
    state: AppState,
}

impl MaintenanceController {
    pub fn new(state: &AppState) -> Self {
        Self { state: state.clone() }
    }

    pub async fn list(&self) -> AppResult<Vec<MaintenanceLog>> {
        self.state.store.list_maintenance().await
    }

    /// Abre un registro y manda el vehículo a taller
    pub async fn create(&self, request: CreateMaintenanceRequest) -> AppResult<MaintenanceLog> {
        request.validate()?;
        let vehicle = self
            .state
            .store
            .get_vehicle(request.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle"))?;

        let accepted = settle(
            &self.state,
            maintenance_rules::evaluate_maintenance_creation(&vehicle, &request.description, request.cost, Utc::now()),
        )?;
        self.state.store.commit(accepted.mutations).await?;

        let opened = accepted.outcome;
        info!(
            "🔧 Vehículo {} a taller ({} -> {})",
            vehicle.plate_number,
            opened.previous_status,
            VehicleStatus::InShop
        );

        if let Some(updated) = self.state.store.get_vehicle(vehicle.id).await? {
            self.state.hub.publish(&FleetEvent::VehicleStatusUpdated(VehicleStatusChange {
                vehicle: updated,
                previous_status: Some(opened.previous_status),
            }));
        }
        self.state.hub.publish(&FleetEvent::Alert(opened.alert));
        broadcast_dashboard(&self.state).await;
        Ok(opened.log)
    }

    /// Borra un registro; con el último abierto el vehículo vuelve a `available`
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let log = self
            .state
            .store
            .get_maintenance(id)
            .await?
            .ok_or_else(|| not_found_error("Maintenance log"))?;
        let vehicle = self.state.store.get_vehicle(log.vehicle_id).await?;
        let open_logs = self.state.store.count_maintenance_for_vehicle(log.vehicle_id).await?;

        let accepted = settle(
            &self.state,
            maintenance_rules::evaluate_maintenance_deletion(&log, vehicle.as_ref(), open_logs),
        )?;
        self.state.store.commit(accepted.mutations).await?;
        info!("🗑️ Registro de mantenimiento {} eliminado", log.id);

        if accepted.outcome {
            if let Some(updated) = self.state.store.get_vehicle(log.vehicle_id).await? {
                info!("✅ Vehículo {} vuelve a estar disponible", updated.plate_number);
                self.state.hub.publish(&FleetEvent::VehicleStatusUpdated(VehicleStatusChange {
                    vehicle: updated,
                    previous_status: Some(VehicleStatus::InShop),
                }));
            }
        }
        broadcast_dashboard(&self.state).await;
        Ok(())
    }
}
