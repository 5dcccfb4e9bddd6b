//! Hash y verificación de contraseñas
//!
//! bcrypt es costoso en CPU; se ejecuta en el pool bloqueante de tokio.

use crate::utils::errors::{AppError, AppResult};

pub async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Hash task failed: {}", e)))?
        .map_err(|e| AppError::Hash(e.to_string()))
}

pub async fn verify_password(password: String, password_hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
        .await
        .map_err(|e| AppError::Internal(format!("Hash task failed: {}", e)))?
        .map_err(|e| AppError::Hash(e.to_string()))
}
