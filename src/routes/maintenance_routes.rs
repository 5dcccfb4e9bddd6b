use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::controllers::maintenance_controller::MaintenanceController;
use crate::dto::maintenance_dto::CreateMaintenanceRequest;
use crate::models::MaintenanceLog;
use crate::state::AppState;
use crate::utils::errors::AppResult;

pub fn create_maintenance_router() -> Router<AppState> {
    Router::new()
        .route("/api/maintenance", get(list_maintenance).post(create_maintenance))
        .route("/api/maintenance/:id", delete(delete_maintenance))
}

async fn list_maintenance(State(state): State<AppState>) -> AppResult<Json<Vec<MaintenanceLog>>> {
    let controller = MaintenanceController::new(&state);
    Ok(Json(controller.list().await?))
}

async fn create_maintenance(
    State(state): State<AppState>,
    Json(request): Json<CreateMaintenanceRequest>,
) -> AppResult<(StatusCode, Json<MaintenanceLog>)> {
    let controller = MaintenanceController::new(&state);
    let log = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(log)))
}

async fn delete_maintenance(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Json<Value>> {
    let controller = MaintenanceController::new(&state);
    controller.delete(id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Maintenance log deleted successfully"
    })))
}
