//! Hub de broadcast
//!
//! Conjunto de observadores vivos protegido por un `RwLock`. Cada observador
//! tiene un canal acotado; `publish` serializa una sola vez y hace
//! `try_send` a cada uno, así que nunca espera a un observador lento. Un
//! observador lleno o desconectado se elimina en silencio.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::events::FleetEvent;

pub type ObserverId = Uuid;

/// Payload ya serializado, compartido entre todos los observadores
pub type Frame = Arc<str>;

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("Broadcast hub is shut down")]
    Closed,

    #[error("Event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Handle de un observador registrado
#[derive(Debug)]
pub struct Subscription {
    pub id: ObserverId,
    pub receiver: mpsc::Receiver<Frame>,
}

/// Resultado de un publish
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub dropped: usize,
}

#[derive(Debug)]
pub struct BroadcastHub {
    observers: RwLock<HashMap<ObserverId, mpsc::Sender<Frame>>>,
    buffer: usize,
    closed: AtomicBool,
}

impl BroadcastHub {
    /// `buffer` es el número de frames pendientes por observador antes de
    /// considerarlo atascado
    pub fn new(buffer: usize) -> Self {
        Self {
            observers: RwLock::new(HashMap::new()),
            buffer: buffer.max(1),
            closed: AtomicBool::new(false),
        }
    }

    /// Registra un observador. Solo recibe eventos publicados después.
    pub fn register(&self) -> Result<Subscription, HubError> {
        let (sender, receiver) = mpsc::channel(self.buffer);
        self.insert(sender, receiver)
    }

    /// Registra un observador con un primer frame ya encolado, de modo que
    /// ningún evento concurrente pueda llegarle antes.
    pub fn register_with_snapshot(&self, snapshot: &FleetEvent) -> Result<Subscription, HubError> {
        let frame: Frame = serde_json::to_string(snapshot)?.into();
        let (sender, receiver) = mpsc::channel(self.buffer);
        sender.try_send(frame).map_err(|_| HubError::Closed)?;
        self.insert(sender, receiver)
    }

    fn insert(&self, sender: mpsc::Sender<Frame>, receiver: mpsc::Receiver<Frame>) -> Result<Subscription, HubError> {
        let mut observers = self.observers.write().map_err(|_| HubError::Closed)?;
        if self.closed.load(Ordering::Acquire) {
            return Err(HubError::Closed);
        }
        let id = Uuid::new_v4();
        observers.insert(id, sender);
        debug!("📡 Observador {} registrado ({} activos)", id, observers.len());
        Ok(Subscription { id, receiver })
    }

    /// Idempotente
    pub fn unregister(&self, id: ObserverId) {
        if let Ok(mut observers) = self.observers.write() {
            if observers.remove(&id).is_some() {
                debug!("📡 Observador {} eliminado ({} activos)", id, observers.len());
            }
        }
    }

    pub fn publish(&self, event: &FleetEvent) -> DeliveryReport {
        match serde_json::to_string(event) {
            Ok(json) => self.fan_out(json.into()),
            Err(e) => {
                warn!("⚠️ No se pudo serializar el evento {}: {}", event.name(), e);
                DeliveryReport::default()
            }
        }
    }

    fn fan_out(&self, frame: Frame) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let mut dead = Vec::new();

        {
            let Ok(observers) = self.observers.read() else {
                return report;
            };
            for (id, sender) in observers.iter() {
                match sender.try_send(frame.clone()) {
                    Ok(()) => report.delivered += 1,
                    Err(_) => dead.push(*id),
                }
            }
        }

        if !dead.is_empty() {
            report.dropped = dead.len();
            if let Ok(mut observers) = self.observers.write() {
                for id in &dead {
                    observers.remove(id);
                }
            }
            debug!("📡 {} observador(es) descartados por entrega fallida", report.dropped);
        }

        report
    }

    pub fn observer_count(&self) -> usize {
        self.observers.read().map(|o| o.len()).unwrap_or(0)
    }

    /// Cierra todos los canales; los streams abiertos terminan al vaciarse
    pub fn shutdown(&self) {
        if let Ok(mut observers) = self.observers.write() {
            self.closed.store(true, Ordering::Release);
            let count = observers.len();
            observers.clear();
            debug!("📡 Hub cerrado, {} observador(es) desconectados", count);
        }
    }
}
