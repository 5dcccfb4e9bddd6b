use chrono::Utc;
use tracing::info;
use validator::Validate;

use crate::controllers::settle;
use crate::dto::fuel_dto::CreateFuelLogRequest;
use crate::models::FuelLog;
use crate::rules::fleet_rules;
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppResult};

pub struct FuelController {
    state: AppState,
}

impl FuelController {
    pub fn new(state: &AppState) -> Self {
        Self { state: state.clone() }
    }

    pub async fn list(&self) -> AppResult<Vec<FuelLog>> {
        self.state.store.list_fuel_logs().await
    }

    // El combustible no cambia el estado de la flota: no se publica nada
    pub async fn create(&self, request: CreateFuelLogRequest) -> AppResult<FuelLog> {
        request.validate()?;
        let trip = self
            .state
            .store
            .get_trip(request.trip_id)
            .await?
            .ok_or_else(|| not_found_error("Trip"))?;

        let accepted = settle(&self.state, fleet_rules::evaluate_fuel_log(&trip, &request, Utc::now()))?;
        self.state.store.commit(accepted.mutations).await?;

        let log = accepted.outcome;
        info!("⛽ {} L registrados para el viaje {}", log.fuel_used, log.trip_id);
        Ok(log)
    }
}
