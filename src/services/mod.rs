//! Services module
//!
//! Este módulo contiene los servicios transversales de la aplicación: emisión
//! de tokens, contraseñas, la tabla de autorización, la limitación de alertas,
//! el barrido de licencias y la agregación de informes.

pub mod alert_throttle;
pub mod auth_service;
pub mod authorization;
pub mod jwt_service;
pub mod license_sweep;
pub mod report_service;

pub use alert_throttle::AlertThrottle;
pub use authorization::{Operation, VehicleScope};
pub use jwt_service::{Claims, JwtConfig, JwtService, TokenType};
