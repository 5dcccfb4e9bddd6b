//! fleetflow
//!
//! Núcleo de transiciones de estado de una flota (vehículos, conductores,
//! viajes, mantenimiento y combustible) con difusión de eventos en tiempo
//! real a los observadores conectados.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod realtime;
pub mod repositories;
pub mod routes;
pub mod rules;
pub mod services;
pub mod state;
pub mod utils;

use std::time::Duration;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::middleware::cors_layer;
use crate::state::AppState;

/// Router completo con las capas transversales (trace, timeout y CORS)
pub fn build_app(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    let cors = cors_layer(&state.config);

    routes::create_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(timeout))
            .layer(cors),
    )
}
