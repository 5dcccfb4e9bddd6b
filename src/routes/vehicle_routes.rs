use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::vehicle_controller::VehicleController;
use crate::dto::vehicle_dto::{CreateVehicleRequest, UpdateVehicleRequest};
use crate::middleware::AuthenticatedUser;
use crate::models::Vehicle;
use crate::state::AppState;
use crate::utils::errors::AppResult;

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/api/vehicles", get(list_vehicles).post(create_vehicle))
        .route("/api/vehicles/:id", patch(update_vehicle).delete(retire_vehicle))
}

async fn list_vehicles(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<Vec<Vehicle>>> {
    let controller = VehicleController::new(&state);
    Ok(Json(controller.list(&user).await?))
}

async fn create_vehicle(
    State(state): State<AppState>,
    Json(request): Json<CreateVehicleRequest>,
) -> AppResult<(StatusCode, Json<Vehicle>)> {
    let controller = VehicleController::new(&state);
    let vehicle = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVehicleRequest>,
) -> AppResult<Json<Vehicle>> {
    let controller = VehicleController::new(&state);
    Ok(Json(controller.update(id, request).await?))
}

async fn retire_vehicle(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Json<Vehicle>> {
    let controller = VehicleController::new(&state);
    Ok(Json(controller.retire(id).await?))
}
