//! Notificaciones en tiempo real
//!
//! El hub se construye una vez al arrancar, se inyecta en `AppState` y se
//! cierra en el apagado. Los handlers publican después de confirmar en el
//! store; el motor de reglas nunca lo ve.

pub mod events;
pub mod hub;

pub use events::FleetEvent;
pub use hub::{BroadcastHub, DeliveryReport, Frame, HubError, ObserverId, Subscription};
