use crate::models::DashboardStats;
use crate::realtime::{FleetEvent, HubError, Subscription};
use crate::state::AppState;
use crate::utils::errors::{AppError, AppResult};

pub struct DashboardController {
    state: AppState,
}

impl DashboardController {
    pub fn new(state: &AppState) -> Self {
        Self { state: state.clone() }
    }

    pub async fn stats(&self) -> AppResult<DashboardStats> {
        self.state.store.dashboard_stats().await
    }

    /// Registra un observador con el snapshot del dashboard ya encolado
    pub async fn subscribe(&self) -> AppResult<Subscription> {
        let stats = self.stats().await?;
        self.state
            .hub
            .register_with_snapshot(&FleetEvent::DashboardUpdate(stats))
            .map_err(|e| match e {
                HubError::Closed => AppError::Internal("Event stream is shutting down".to_string()),
                HubError::Serialization(e) => AppError::Internal(format!("Snapshot serialization failed: {}", e)),
            })
    }
}
