use axum::{extract::State, routing::get, Json, Router};

use crate::controllers::report_controller::ReportController;
use crate::dto::report_dto::{FuelEfficiencyReport, MonthlyExpenseReport, VehicleProfitabilityReport};
use crate::models::Alert;
use crate::state::AppState;
use crate::utils::errors::AppResult;

pub fn create_report_router() -> Router<AppState> {
    Router::new()
        .route("/api/reports/fuel-efficiency", get(fuel_efficiency))
        .route("/api/reports/monthly-expenses", get(monthly_expenses))
        .route("/api/reports/vehicle-profitability", get(vehicle_profitability))
        .route("/api/reports/alerts", get(alerts))
}

async fn fuel_efficiency(State(state): State<AppState>) -> AppResult<Json<Vec<FuelEfficiencyReport>>> {
    Ok(Json(ReportController::new(&state).fuel_efficiency().await?))
}

async fn monthly_expenses(State(state): State<AppState>) -> AppResult<Json<Vec<MonthlyExpenseReport>>> {
    Ok(Json(ReportController::new(&state).monthly_expenses().await?))
}

async fn vehicle_profitability(State(state): State<AppState>) -> AppResult<Json<Vec<VehicleProfitabilityReport>>> {
    Ok(Json(ReportController::new(&state).vehicle_profitability().await?))
}

async fn alerts(State(state): State<AppState>) -> AppResult<Json<Vec<Alert>>> {
    Ok(Json(ReportController::new(&state).alerts().await?))
}
