use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::controllers::{broadcast_dashboard, settle};
use crate::dto::driver_dto::{CreateDriverRequest, UpdateDriverRequest};
use crate::models::Driver;
use crate::rules::alert_rules::license_alerts;
use crate::rules::fleet_rules;
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppResult};

pub struct DriverController {
    state: AppState,
}

impl DriverController {
    pub fn new(state: &AppState) -> Self {
        Self { state: state.clone() }
    }

    async fn load(&self, id: Uuid) -> AppResult<Driver> {
        self.state
            .store
            .get_driver(id)
            .await?
            .ok_or_else(|| not_found_error("Driver"))
    }

    /// Lista los conductores y emite las alertas de licencia que no estén en
    /// cooldown
    pub async fn list(&self) -> AppResult<Vec<Driver>> {
        let drivers = self.state.store.list_drivers().await?;

        let alerts = license_alerts(&drivers, Utc::now().date_naive(), self.state.config.license_warning_days);
        let emitted = self.state.alerts.emit(&self.state.hub, alerts);
        if emitted > 0 {
            debug!("🪪 {} alerta(s) de licencia emitidas desde el listado", emitted);
        }

        Ok(drivers)
    }

    pub async fn create(&self, request: CreateDriverRequest) -> AppResult<Driver> {
        request.validate()?;

        let license_taken = self
            .state
            .store
            .license_number_taken(request.license_number.trim())
            .await?;
        let accepted = settle(
            &self.state,
            fleet_rules::evaluate_driver_creation(&request, license_taken, Utc::now()),
        )?;

        self.state.store.commit(accepted.mutations).await?;
        let driver = accepted.outcome;
        info!("🧑‍✈️ Conductor {} creado ({})", driver.name, driver.duty_status);

        broadcast_dashboard(&self.state).await;
        Ok(driver)
    }

    pub async fn update(&self, id: Uuid, request: UpdateDriverRequest) -> AppResult<Driver> {
        request.validate()?;
        let current = self.load(id).await?;

        let license_taken = match request.license_number.as_deref().map(str::trim) {
            Some(license) if license != current.license_number => {
                self.state.store.license_number_taken(license).await?
            }
            _ => false,
        };
        let accepted = settle(
            &self.state,
            fleet_rules::evaluate_driver_patch(&current, &request, license_taken),
        )?;

        self.state.store.commit(accepted.mutations).await?;
        let driver = self.load(id).await?;
        if driver.duty_status != current.duty_status {
            info!("🔄 Conductor {}: {} -> {}", driver.name, current.duty_status, driver.duty_status);
        }

        broadcast_dashboard(&self.state).await;
        Ok(driver)
    }

    /// Baja lógica (`suspended`). Idempotente.
    pub async fn suspend(&self, id: Uuid) -> AppResult<Driver> {
        let current = self.load(id).await?;
        let accepted = settle(&self.state, fleet_rules::evaluate_driver_suspension(&current))?;

        if !accepted.outcome {
            return Ok(current);
        }

        self.state.store.commit(accepted.mutations).await?;
        let driver = self.load(id).await?;
        info!("⛔ Conductor {} suspendido", driver.name);

        broadcast_dashboard(&self.state).await;
        Ok(driver)
    }
}
