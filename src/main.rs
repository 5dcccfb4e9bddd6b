use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};

use fleetflow::config::{DatabaseConfig, EnvironmentConfig, StoreBackend};
use fleetflow::database;
use fleetflow::repositories::{FleetStore, MemoryFleetStore, PgFleetStore};
use fleetflow::services::license_sweep;
use fleetflow::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();
    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    let level: tracing::Level = config
        .log_level
        .parse()
        .with_context(|| format!("LOG_LEVEL has an invalid value: '{}'", config.log_level))?;
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("🚚 FleetFlow - Gestión de flota en tiempo real");
    info!("================================================");
    info!("🌍 Entorno: {}", config.environment);

    let store: Arc<dyn FleetStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let db_config = DatabaseConfig::from_environment(&config)
                .context("DATABASE_URL is required for the postgres store")?;
            let pool = match database::connect(&db_config).await {
                Ok(pool) => pool,
                Err(e) => {
                    error!("❌ Error conectando a la base de datos: {}", e);
                    return Err(anyhow::anyhow!("Error de base de datos: {}", e));
                }
            };
            database::run_migrations(&pool).await?;
            info!("✅ Esquema de base de datos listo");
            Arc::new(PgFleetStore::new(pool))
        }
        StoreBackend::Memory => {
            warn!("⚠️ Store en memoria: los datos se pierden al reiniciar");
            Arc::new(MemoryFleetStore::new())
        }
    };

    let addr: SocketAddr = config
        .server_url()
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server_url()))?;
    let sweep_interval = config.license_sweep_interval_secs;

    let state = AppState::new(store, config);
    let hub = state.hub.clone();

    let sweep = (sweep_interval > 0).then(|| {
        info!("🪪 Barrido de licencias cada {}s", sweep_interval);
        license_sweep::spawn(state.clone(), Duration::from_secs(sweep_interval))
    });

    let app = fleetflow::build_app(state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   POST /auth/register | /auth/login | /auth/refresh");
    info!("   GET|PATCH /auth/me, PATCH /auth/me/password");
    info!("   /api/vehicles, /api/drivers, /api/trips, /api/maintenance, /api/fuel");
    info!("   GET /api/reports/*, GET /api/stats");
    info!("   GET /ws - Stream de eventos");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    // Cerrar el hub al recibir la señal cierra todos los websockets
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            hub.shutdown();
        })
        .await;

    if let Some(sweep) = sweep {
        sweep.abort();
    }

    if let Err(e) = served {
        error!("❌ Servidor terminó con error: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
