//! Conexión a PostgreSQL
//!
//! Este módulo crea el pool de conexiones y aplica el esquema inicial.

use sqlx::{Executor, PgPool};
use tracing::info;

use crate::config::DatabaseConfig;

const SCHEMA: &str = include_str!("schema.sql");

/// Crear un pool de conexiones a la base de datos
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!("🗄️ Conectando a la base de datos: {}", mask_database_url(&config.url));
    let pool = config.create_pool().await?;
    sqlx::query("SELECT 1").execute(&pool).await?;
    info!("✅ Conexión a la base de datos establecida");
    Ok(pool)
}

/// Ejecutar el esquema (idempotente, `CREATE ... IF NOT EXISTS`)
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    pool.execute(SCHEMA).await?;
    info!("✅ Esquema de base de datos aplicado");
    Ok(())
}

/// Función helper para enmascarar la URL de la base de datos en logs
pub fn mask_database_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if url[..at_pos].rfind(':').is_some() {
            let protocol = &url[..url.find("://").map(|p| p + 3).unwrap_or(0)];
            let host = &url[at_pos + 1..];
            format!("{}***:***@{}", protocol, host)
        } else {
            url.to_string()
        }
    } else {
        url.to_string()
    }
}
