//! Eventos del stream en tiempo real
//!
//! Forma en el cable: `{"event": <nombre>, "data": <objeto>}`.

use serde::Serialize;

use crate::dto::trip_dto::TripStatusChange;
use crate::dto::vehicle_dto::VehicleStatusChange;
use crate::models::{Alert, DashboardStats, Vehicle};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum FleetEvent {
    DashboardUpdate(DashboardStats),
    VehicleCreated(Vehicle),
    VehicleStatusUpdated(VehicleStatusChange),
    TripStatusUpdated(TripStatusChange),
    Alert(Alert),
}

impl FleetEvent {
    pub fn name(&self) -> &'static str {
        match self {
            FleetEvent::DashboardUpdate(_) => "dashboardUpdate",
            FleetEvent::VehicleCreated(_) => "vehicleCreated",
            FleetEvent::VehicleStatusUpdated(_) => "vehicleStatusUpdated",
            FleetEvent::TripStatusUpdated(_) => "tripStatusUpdated",
            FleetEvent::Alert(_) => "alert",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertKind, VehicleStatus};
    use uuid::Uuid;

    #[test]
    fn test_event_envelope_shape() {
        let event = FleetEvent::Alert(Alert::critical(
            AlertKind::OverweightCargo,
            "Overweight attempt".into(),
            Uuid::nil(),
        ));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "alert");
        assert_eq!(json["data"]["type"], "overweight_cargo");
        assert_eq!(json["data"]["severity"], "critical");
        assert_eq!(json["data"]["entity_id"], Uuid::nil().to_string());
    }

    #[test]
    fn test_status_change_flattens_vehicle() {
        let vehicle = Vehicle::new("VAN-05".into(), "Van".into(), 3500.0, 0.0, VehicleStatus::InShop);
        let event = FleetEvent::VehicleStatusUpdated(VehicleStatusChange {
            vehicle,
            previous_status: Some(VehicleStatus::Available),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], event.name());
        assert_eq!(json["data"]["status"], "in_shop");
        assert_eq!(json["data"]["previous_status"], "available");
        assert_eq!(json["data"]["plate_number"], "VAN-05");
    }
}
