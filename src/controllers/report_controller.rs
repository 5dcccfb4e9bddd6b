use chrono::Utc;

use crate::dto::report_dto::{FuelEfficiencyReport, MonthlyExpenseReport, VehicleProfitabilityReport};
use crate::models::Alert;
use crate::rules::alert_rules::fleet_alerts;
use crate::services::report_service;
use crate::state::AppState;
use crate::utils::errors::AppResult;

pub struct ReportController {
    state: AppState,
}

impl ReportController {
    pub fn new(state: &AppState) -> Self {
        Self { state: state.clone() }
    }

    pub async fn fuel_efficiency(&self) -> AppResult<Vec<FuelEfficiencyReport>> {
        let store = &self.state.store;
        let fuel_logs = store.list_fuel_logs().await?;
        let trips = store.list_trips().await?;
        let vehicles = store.list_vehicles().await?;
        Ok(report_service::fuel_efficiency(&fuel_logs, &trips, &vehicles))
    }

    pub async fn monthly_expenses(&self) -> AppResult<Vec<MonthlyExpenseReport>> {
        let store = &self.state.store;
        let maintenance = store.list_maintenance().await?;
        let fuel_logs = store.list_fuel_logs().await?;
        Ok(report_service::monthly_expenses(&maintenance, &fuel_logs))
    }

    pub async fn vehicle_profitability(&self) -> AppResult<Vec<VehicleProfitabilityReport>> {
        let store = &self.state.store;
        let vehicles = store.list_vehicles().await?;
        let trips = store.list_trips().await?;
        let maintenance = store.list_maintenance().await?;
        let fuel_logs = store.list_fuel_logs().await?;
        Ok(report_service::vehicle_profitability(&vehicles, &trips, &maintenance, &fuel_logs))
    }

    /// Evaluación pura: no emite nada por el hub
    pub async fn alerts(&self) -> AppResult<Vec<Alert>> {
        let drivers = self.state.store.list_drivers().await?;
        let vehicles = self.state.store.list_vehicles().await?;
        Ok(fleet_alerts(
            &drivers,
            &vehicles,
            Utc::now().date_naive(),
            self.state.config.license_warning_days,
        ))
    }
}
