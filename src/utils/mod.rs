//! Utilidades del sistema
//!
//! Este módulo contiene el manejo de errores común a toda la API.

pub mod errors;

pub use errors::{AppError, AppResult};
