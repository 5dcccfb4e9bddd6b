//! Barrido periódico de licencias
//!
//! Evalúa las alertas de licencia cada `interval` y las emite a través del
//! `AlertThrottle`. Se lanza solo si `LICENSE_SWEEP_INTERVAL_SECS > 0`.

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::rules::alert_rules::license_alerts;
use crate::state::AppState;

pub async fn sweep_once(state: &AppState) -> usize {
    let drivers = match state.store.list_drivers().await {
        Ok(drivers) => drivers,
        Err(e) => {
            warn!("⚠️ Barrido de licencias fallido: {}", e);
            return 0;
        }
    };
    let alerts = license_alerts(&drivers, Utc::now().date_naive(), state.config.license_warning_days);
    let emitted = state.alerts.emit(&state.hub, alerts);
    debug!("🪪 Barrido de licencias: {} alerta(s) emitidas", emitted);
    emitted
}

pub fn spawn(state: AppState, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            sweep_once(&state).await;
        }
    })
}
