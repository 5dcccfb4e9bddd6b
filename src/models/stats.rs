//! Estadísticas del dashboard
//!
//! Se recalculan siempre desde el estado actual del store; nunca se mantienen
//! de forma incremental.

use serde::{Deserialize, Serialize};

use super::{Driver, DutyStatus, Trip, TripStatus, Vehicle, VehicleStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Vehículos `available` u `on_trip`
    pub active_vehicles: i64,
    /// Vehículos `in_shop`
    pub maintenance_alerts: i64,
    /// Vehículos `available`
    pub idle_vehicles: i64,
    /// Viajes en `draft`
    pub pending_shipments: i64,
    pub total_drivers: i64,
    pub suspended_drivers: i64,
}

impl DashboardStats {
    pub fn tally<'a>(
        vehicles: impl IntoIterator<Item = &'a Vehicle>,
        drivers: impl IntoIterator<Item = &'a Driver>,
        trips: impl IntoIterator<Item = &'a Trip>,
    ) -> Self {
        let mut stats = DashboardStats::default();

        for vehicle in vehicles {
            match vehicle.status {
                VehicleStatus::Available => {
                    stats.active_vehicles += 1;
                    stats.idle_vehicles += 1;
                }
                VehicleStatus::OnTrip => stats.active_vehicles += 1,
                VehicleStatus::InShop => stats.maintenance_alerts += 1,
                VehicleStatus::Retired => {}
            }
        }

        for driver in drivers {
            stats.total_drivers += 1;
            if driver.duty_status == DutyStatus::Suspended {
                stats.suspended_drivers += 1;
            }
        }

        stats.pending_shipments = trips
            .into_iter()
            .filter(|trip| trip.status == TripStatus::Draft)
            .count() as i64;

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_tally_counts_each_bucket() {
        let vehicles = vec![
            Vehicle::new("A".into(), "Van".into(), 1000.0, 0.0, VehicleStatus::Available),
            Vehicle::new("B".into(), "Van".into(), 1000.0, 0.0, VehicleStatus::OnTrip),
            Vehicle::new("C".into(), "Bike".into(), 100.0, 0.0, VehicleStatus::InShop),
            Vehicle::new("D".into(), "Truck".into(), 9000.0, 0.0, VehicleStatus::Retired),
        ];
        let expiry = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let drivers = vec![
            Driver::new("Robert Fox".into(), "LIC-1".into(), expiry, DutyStatus::On),
            Driver::new("Cody Fisher".into(), "LIC-2".into(), expiry, DutyStatus::Suspended),
        ];

        let stats = DashboardStats::tally(&vehicles, &drivers, std::iter::empty());
        assert_eq!(
            stats,
            DashboardStats {
                active_vehicles: 2,
                maintenance_alerts: 1,
                idle_vehicles: 1,
                pending_shipments: 0,
                total_drivers: 2,
                suspended_drivers: 1,
            }
        );
    }
}
