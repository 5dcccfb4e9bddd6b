use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch},
    Json, Router,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::controllers::trip_controller::TripController;
use crate::dto::trip_dto::{CreateTripRequest, TripResponse, TripStatusUpdate};
use crate::state::AppState;
use crate::utils::errors::AppResult;

pub fn create_trip_router() -> Router<AppState> {
    Router::new()
        .route("/api/trips", get(list_trips).post(create_trip))
        .route("/api/trips/:id", delete(delete_trip))
        .route("/api/trips/:id/status", patch(update_trip_status))
}

async fn list_trips(State(state): State<AppState>) -> AppResult<Json<Vec<TripResponse>>> {
    let controller = TripController::new(&state);
    Ok(Json(controller.list().await?))
}

async fn create_trip(
    State(state): State<AppState>,
    Json(request): Json<CreateTripRequest>,
) -> AppResult<(StatusCode, Json<TripResponse>)> {
    let controller = TripController::new(&state);
    let trip = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

async fn update_trip_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<TripStatusUpdate>,
) -> AppResult<Json<TripResponse>> {
    let controller = TripController::new(&state);
    Ok(Json(controller.update_status(id, request).await?))
}

async fn delete_trip(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Json<Value>> {
    let controller = TripController::new(&state);
    controller.delete(id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Trip deleted successfully"
    })))
}
