//! Reglas de alertas derivadas del estado de la flota
//!
//! Las alertas de licencia se calculan en lectura. Quién las emite y con qué
//! frecuencia lo decide `services::alert_throttle`.

use chrono::{Duration, NaiveDate};

use crate::models::{Alert, AlertKind, Driver, Vehicle, VehicleStatus};

/// Alertas de licencia: `critical` si vence hoy o antes, `warning` si vence
/// dentro de `warning_days`.
pub fn license_alerts<'a>(
    drivers: impl IntoIterator<Item = &'a Driver>,
    today: NaiveDate,
    warning_days: i64,
) -> Vec<Alert> {
    let horizon = today + Duration::days(warning_days);

    drivers
        .into_iter()
        .filter_map(|driver| {
            let expiry = driver.license_expiry_date;
            if expiry <= today {
                Some(Alert::critical(
                    AlertKind::LicenseExpired,
                    format!("Driver {}'s license has EXPIRED on {}", driver.name, expiry),
                    driver.id,
                ))
            } else if expiry <= horizon {
                Some(Alert::warning(
                    AlertKind::LicenseExpiring,
                    format!("Driver {}'s license expires on {}", driver.name, expiry),
                    driver.id,
                ))
            } else {
                None
            }
        })
        .collect()
}

/// Alertas del informe: licencias más vehículos en taller
pub fn fleet_alerts(drivers: &[Driver], vehicles: &[Vehicle], today: NaiveDate, warning_days: i64) -> Vec<Alert> {
    let mut alerts = license_alerts(drivers, today, warning_days);
    alerts.extend(
        vehicles
            .iter()
            .filter(|vehicle| vehicle.status == VehicleStatus::InShop)
            .map(|vehicle| {
                Alert::info(
                    AlertKind::VehicleInShop,
                    format!("Vehicle {} is currently in maintenance shop", vehicle.plate_number),
                    vehicle.id,
                )
            }),
    );
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DutyStatus, Severity};

    fn driver_expiring(expiry: NaiveDate) -> Driver {
        Driver::new("Esther Howard".into(), "DL-77".into(), expiry, DutyStatus::On)
    }

    #[test]
    fn test_license_alert_buckets() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 20).unwrap();
        let drivers = vec![
            driver_expiring(today),
            driver_expiring(today + Duration::days(30)),
            driver_expiring(today + Duration::days(31)),
        ];

        let alerts = license_alerts(&drivers, today, 30);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[0].kind, AlertKind::LicenseExpired);
        assert_eq!(alerts[1].severity, Severity::Warning);
        assert_eq!(alerts[1].entity_id, drivers[1].id);
    }

    #[test]
    fn test_fleet_alerts_include_vehicles_in_shop() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 20).unwrap();
        let vehicles = vec![
            Vehicle::new("A-1".into(), "Van".into(), 1000.0, 0.0, VehicleStatus::InShop),
            Vehicle::new("A-2".into(), "Van".into(), 1000.0, 0.0, VehicleStatus::Available),
        ];
        let alerts = fleet_alerts(&[], &vehicles, today, 30);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::VehicleInShop);
        assert_eq!(alerts[0].severity, Severity::Info);
    }
}
