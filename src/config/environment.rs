//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno. Cada clave tiene un valor
//! por defecto; un valor presente pero inválido es un error de arranque.

use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};

/// Backend del Entity Store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => anyhow::bail!("unknown store backend '{}', expected postgres or memory", other),
        }
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub log_level: String,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub jwt_secret: String,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Frames pendientes por observador antes de descartarlo
    pub observer_buffer: usize,
    pub alert_cooldown_secs: u64,
    pub license_warning_days: i64,
    /// 0 desactiva el barrido periódico de licencias
    pub license_sweep_interval_secs: u64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 8000,
            host: "0.0.0.0".to_string(),
            log_level: "info".to_string(),
            store_backend: StoreBackend::Postgres,
            database_url: None,
            db_max_connections: 20,
            db_min_connections: 2,
            jwt_secret: "change-me-in-production".to_string(),
            access_token_expire_minutes: 60,
            refresh_token_expire_days: 7,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            cors_origins: vec!["http://localhost:3000".to_string()],
            request_timeout_secs: 30,
            observer_buffer: 64,
            alert_cooldown_secs: 3600,
            license_warning_days: 30,
            license_sweep_interval_secs: 0,
        }
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("{} has an invalid value: '{}'", key, raw)),
        _ => Ok(default),
    }
}

fn string_var(key: &str, default: String) -> String {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(default)
}

impl EnvironmentConfig {
    /// Lee el entorno del proceso sobre los valores por defecto
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            environment: string_var("ENVIRONMENT", defaults.environment),
            port: parse_var("PORT", defaults.port)?,
            host: string_var("HOST", defaults.host),
            log_level: string_var("LOG_LEVEL", defaults.log_level),
            store_backend: parse_var("STORE_BACKEND", defaults.store_backend)?,
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            db_min_connections: parse_var("DB_MIN_CONNECTIONS", defaults.db_min_connections)?,
            jwt_secret: string_var("JWT_SECRET", defaults.jwt_secret),
            access_token_expire_minutes: parse_var(
                "ACCESS_TOKEN_EXPIRE_MINUTES",
                defaults.access_token_expire_minutes,
            )?,
            refresh_token_expire_days: parse_var("REFRESH_TOKEN_EXPIRE_DAYS", defaults.refresh_token_expire_days)?,
            bcrypt_cost: parse_var("BCRYPT_COST", defaults.bcrypt_cost)?,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?,
            observer_buffer: parse_var("OBSERVER_BUFFER", defaults.observer_buffer)?,
            alert_cooldown_secs: parse_var("ALERT_COOLDOWN_SECS", defaults.alert_cooldown_secs)?,
            license_warning_days: parse_var("LICENSE_WARNING_DAYS", defaults.license_warning_days)?,
            license_sweep_interval_secs: parse_var(
                "LICENSE_SWEEP_INTERVAL_SECS",
                defaults.license_sweep_interval_secs,
            )?,
        };

        if config.store_backend == StoreBackend::Postgres && config.database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when STORE_BACKEND=postgres");
        }
        if config.is_production() && config.jwt_secret == Self::default().jwt_secret {
            anyhow::bail!("JWT_SECRET must be set in production");
        }

        Ok(config)
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la dirección del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
