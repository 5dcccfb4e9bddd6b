use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use crate::controllers::fuel_controller::FuelController;
use crate::dto::fuel_dto::CreateFuelLogRequest;
use crate::models::FuelLog;
use crate::state::AppState;
use crate::utils::errors::AppResult;

pub fn create_fuel_router() -> Router<AppState> {
    Router::new().route("/api/fuel", get(list_fuel_logs).post(create_fuel_log))
}

async fn list_fuel_logs(State(state): State<AppState>) -> AppResult<Json<Vec<FuelLog>>> {
    let controller = FuelController::new(&state);
    Ok(Json(controller.list().await?))
}

async fn create_fuel_log(
    State(state): State<AppState>,
    Json(request): Json<CreateFuelLogRequest>,
) -> AppResult<(StatusCode, Json<FuelLog>)> {
    let controller = FuelController::new(&state);
    let log = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(log)))
}
