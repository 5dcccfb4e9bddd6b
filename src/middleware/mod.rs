//! Middleware del sistema
//!
//! Este módulo contiene el gate de autenticación/autorización y CORS.

pub mod auth;
pub mod cors;

pub use auth::{authorize, AuthenticatedUser};
pub use cors::cors_layer;
