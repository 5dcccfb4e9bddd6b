//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. El hub se construye aquí y se inyecta en cada
//! handler; no existe ningún hub global.

use std::sync::Arc;
use std::time::Duration;

use crate::config::EnvironmentConfig;
use crate::realtime::BroadcastHub;
use crate::repositories::FleetStore;
use crate::services::{AlertThrottle, JwtConfig, JwtService};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FleetStore>,
    pub hub: Arc<BroadcastHub>,
    pub config: Arc<EnvironmentConfig>,
    pub jwt: Arc<JwtService>,
    pub alerts: Arc<AlertThrottle>,
}

impl AppState {
    pub fn new(store: Arc<dyn FleetStore>, config: EnvironmentConfig) -> Self {
        let hub = BroadcastHub::new(config.observer_buffer);
        let jwt = JwtService::new(JwtConfig::from_environment(&config));
        let alerts = AlertThrottle::new(Duration::from_secs(config.alert_cooldown_secs));

        Self {
            store,
            hub: Arc::new(hub),
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            alerts: Arc::new(alerts),
        }
    }
}
