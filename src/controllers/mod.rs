//! Command handlers
//!
//! Cada controller secuencia store, reglas y hub: carga las entidades, evalúa
//! la regla, confirma las mutaciones y solo entonces publica los eventos.

pub mod auth_controller;
pub mod dashboard_controller;
pub mod driver_controller;
pub mod fuel_controller;
pub mod maintenance_controller;
pub mod report_controller;
pub mod trip_controller;
pub mod vehicle_controller;

use tracing::{debug, warn};

use crate::realtime::FleetEvent;
use crate::rules::{Accepted, Verdict};
use crate::state::AppState;
use crate::utils::errors::{AppError, AppResult};

/// Convierte el veredicto en resultado; un rechazo con alerta la publica antes
/// de devolver el error
pub(crate) fn settle<T>(state: &AppState, verdict: Verdict<T>) -> AppResult<Accepted<T>> {
    verdict.map_err(|rejection| {
        if let Some(alert) = &rejection.alert {
            warn!("🚨 Alerta {:?}: {}", alert.kind, alert.message);
            state.hub.publish(&FleetEvent::Alert(alert.clone()));
        }
        AppError::Rejected(rejection)
    })
}

/// Recalcula las estadísticas y las publica. Un fallo de lectura no afecta a
/// la operación ya confirmada.
pub async fn broadcast_dashboard(state: &AppState) {
    match state.store.dashboard_stats().await {
        Ok(stats) => {
            let report = state.hub.publish(&FleetEvent::DashboardUpdate(stats));
            debug!(
                "📊 dashboardUpdate entregado a {} observador(es), {} descartado(s)",
                report.delivered, report.dropped
            );
        }
        Err(e) => warn!("⚠️ No se pudieron recalcular las estadísticas: {}", e),
    }
}
