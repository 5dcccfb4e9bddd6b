//! Router de la API
//!
//! Todas las rutas protegidas pasan por [`authorize`]; las de registro, login
//! y refresh se añaden después del `route_layer` y quedan públicas.

pub mod auth_routes;
pub mod driver_routes;
pub mod fuel_routes;
pub mod maintenance_routes;
pub mod report_routes;
pub mod stream_routes;
pub mod trip_routes;
pub mod vehicle_routes;

use axum::{extract::State, middleware, response::Json, routing::get, Router};
use serde_json::{json, Value};

use crate::middleware::authorize;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(auth_routes::profile_routes())
        .merge(vehicle_routes::create_vehicle_router())
        .merge(driver_routes::create_driver_router())
        .merge(trip_routes::create_trip_router())
        .merge(maintenance_routes::create_maintenance_router())
        .merge(fuel_routes::create_fuel_router())
        .merge(report_routes::create_report_router())
        .merge(stream_routes::create_stream_router())
        .route_layer(middleware::from_fn_with_state(state.clone(), authorize));

    Router::new()
        .route("/", get(health))
        .merge(auth_routes::public_auth_routes())
        .merge(protected)
        .with_state(state)
}

/// Documento de salud
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "ok",
        "environment": state.config.environment,
        "observers": state.hub.observer_count(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
