//! Limitación de alertas emitidas desde lecturas y barridos
//!
//! Una alerta con la misma clave `(tipo, entidad)` solo se vuelve a emitir
//! cuando ha pasado el cooldown.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::models::{Alert, AlertKind};
use crate::realtime::{BroadcastHub, FleetEvent};

#[derive(Debug)]
pub struct AlertThrottle {
    cooldown: Duration,
    last_sent: Mutex<HashMap<(AlertKind, Uuid), Instant>>,
}

impl AlertThrottle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_sent: Mutex::new(HashMap::new()),
        }
    }

    /// Marca la alerta como enviada si está fuera del cooldown
    pub fn should_emit(&self, alert: &Alert) -> bool {
        self.should_emit_at(alert, Instant::now())
    }

    fn should_emit_at(&self, alert: &Alert, now: Instant) -> bool {
        let Ok(mut last_sent) = self.last_sent.lock() else {
            return false;
        };
        let key = (alert.kind, alert.entity_id);
        match last_sent.get(&key) {
            Some(previous) if now.duration_since(*previous) < self.cooldown => false,
            _ => {
                last_sent.insert(key, now);
                true
            }
        }
    }

    /// Publica las alertas que pasan el filtro; devuelve cuántas se emitieron
    pub fn emit(&self, hub: &BroadcastHub, alerts: Vec<Alert>) -> usize {
        let mut emitted = 0;
        for alert in alerts {
            if self.should_emit(&alert) {
                hub.publish(&FleetEvent::Alert(alert));
                emitted += 1;
            }
        }
        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expiring(entity_id: Uuid) -> Alert {
        Alert::warning(AlertKind::LicenseExpiring, "expiring".into(), entity_id)
    }

    #[test]
    fn test_repeated_alert_is_suppressed_within_cooldown() {
        let throttle = AlertThrottle::new(Duration::from_secs(60));
        let driver = Uuid::new_v4();
        let start = Instant::now();

        assert!(throttle.should_emit_at(&expiring(driver), start));
        assert!(!throttle.should_emit_at(&expiring(driver), start + Duration::from_secs(30)));
        assert!(throttle.should_emit_at(&expiring(driver), start + Duration::from_secs(61)));
    }

    #[test]
    fn test_keys_are_per_kind_and_entity() {
        let throttle = AlertThrottle::new(Duration::from_secs(60));
        let driver = Uuid::new_v4();

        assert!(throttle.should_emit(&expiring(driver)));
        assert!(throttle.should_emit(&expiring(Uuid::new_v4())));
        assert!(throttle.should_emit(&Alert::critical(AlertKind::LicenseExpired, "expired".into(), driver)));
    }

    #[test]
    fn test_emit_publishes_to_hub_once() {
        let hub = BroadcastHub::new(8);
        let mut sub = hub.register().unwrap();
        let throttle = AlertThrottle::new(Duration::from_secs(60));
        let driver = Uuid::new_v4();

        assert_eq!(throttle.emit(&hub, vec![expiring(driver)]), 1);
        assert_eq!(throttle.emit(&hub, vec![expiring(driver)]), 0);
        assert!(sub.receiver.try_recv().is_ok());
        assert!(sub.receiver.try_recv().is_err());
    }
}
