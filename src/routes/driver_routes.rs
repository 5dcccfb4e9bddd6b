use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::driver_controller::DriverController;
use crate::dto::driver_dto::{CreateDriverRequest, UpdateDriverRequest};
use crate::models::Driver;
use crate::state::AppState;
use crate::utils::errors::AppResult;

pub fn create_driver_router() -> Router<AppState> {
    Router::new()
        .route("/api/drivers", get(list_drivers).post(create_driver))
        .route("/api/drivers/:id", patch(update_driver).delete(suspend_driver))
}

async fn list_drivers(State(state): State<AppState>) -> AppResult<Json<Vec<Driver>>> {
    let controller = DriverController::new(&state);
    Ok(Json(controller.list().await?))
}

async fn create_driver(
    State(state): State<AppState>,
    Json(request): Json<CreateDriverRequest>,
) -> AppResult<(StatusCode, Json<Driver>)> {
    let controller = DriverController::new(&state);
    let driver = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(driver)))
}

async fn update_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDriverRequest>,
) -> AppResult<Json<Driver>> {
    let controller = DriverController::new(&state);
    Ok(Json(controller.update(id, request).await?))
}

async fn suspend_driver(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Json<Driver>> {
    let controller = DriverController::new(&state);
    Ok(Json(controller.suspend(id).await?))
}
