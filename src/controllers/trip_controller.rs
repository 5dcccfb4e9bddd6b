use std::collections::HashMap;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::controllers::{broadcast_dashboard, settle};
use crate::dto::trip_dto::{CreateTripRequest, TripResponse, TripStatusChange, TripStatusUpdate};
use crate::dto::vehicle_dto::VehicleStatusChange;
use crate::models::{Driver, Trip, Vehicle};
use crate::realtime::FleetEvent;
use crate::rules::trip_rules::{self, NewTrip};
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppResult};

pub struct TripController {
    state: AppState,
}

impl TripController {
    pub fn new(state: &AppState) -> Self {
        Self { state: state.clone() }
    }

    async fn load_trip(&self, id: Uuid) -> AppResult<Trip> {
        self.state
            .store
            .get_trip(id)
            .await?
            .ok_or_else(|| not_found_error("Trip"))
    }

    async fn load_vehicle(&self, id: Uuid) -> AppResult<Vehicle> {
        self.state
            .store
            .get_vehicle(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle"))
    }

    async fn load_driver(&self, id: Uuid) -> AppResult<Driver> {
        self.state
            .store
            .get_driver(id)
            .await?
            .ok_or_else(|| not_found_error("Driver"))
    }

    /// Publica `vehicleStatusUpdated` solo si el estado del vehículo cambió.
    /// Corre tras el commit, así que un fallo de lectura solo se registra.
    async fn announce_vehicle_change(&self, before: &Vehicle) {
        let after = match self.load_vehicle(before.id).await {
            Ok(after) => after,
            Err(e) => {
                warn!("⚠️ No se pudo releer el vehículo {}: {}", before.id, e);
                return;
            }
        };
        if after.status != before.status {
            self.state.hub.publish(&FleetEvent::VehicleStatusUpdated(VehicleStatusChange {
                vehicle: after,
                previous_status: Some(before.status),
            }));
        }
    }

    pub async fn list(&self) -> AppResult<Vec<TripResponse>> {
        let trips = self.state.store.list_trips().await?;
        let vehicles: HashMap<Uuid, Vehicle> = self
            .state
            .store
            .list_vehicles()
            .await?
            .into_iter()
            .map(|v| (v.id, v))
            .collect();
        let drivers: HashMap<Uuid, Driver> = self
            .state
            .store
            .list_drivers()
            .await?
            .into_iter()
            .map(|d| (d.id, d))
            .collect();

        Ok(trips
            .into_iter()
            .map(|trip| {
                let vehicle = vehicles.get(&trip.vehicle_id);
                let driver = drivers.get(&trip.driver_id);
                TripResponse::build(trip, vehicle, driver)
            })
            .collect())
    }

    pub async fn create(&self, request: CreateTripRequest) -> AppResult<TripResponse> {
        request.validate()?;
        let vehicle = self.load_vehicle(request.vehicle_id).await?;
        let driver = self.load_driver(request.driver_id).await?;

        let now = Utc::now();
        let accepted = settle(
            &self.state,
            trip_rules::evaluate_trip_creation(
                &vehicle,
                &driver,
                NewTrip {
                    destination: &request.destination,
                    cargo_weight: request.cargo_weight,
                },
                now.date_naive(),
                now,
            ),
        )?;

        self.state.store.commit(accepted.mutations).await?;
        let trip = accepted.outcome;
        info!("🗺️ Viaje {} creado hacia {} con {}", trip.id, trip.destination, vehicle.plate_number);

        broadcast_dashboard(&self.state).await;
        Ok(TripResponse::build(trip, Some(&vehicle), Some(&driver)))
    }

    pub async fn update_status(&self, id: Uuid, request: TripStatusUpdate) -> AppResult<TripResponse> {
        let trip = self.load_trip(id).await?;
        let vehicle = self.load_vehicle(trip.vehicle_id).await?;
        let driver = self.load_driver(trip.driver_id).await?;

        let now = Utc::now();
        let accepted = settle(
            &self.state,
            trip_rules::evaluate_trip_transition(&trip, &vehicle, &driver, &request.status, now.date_naive(), now),
        )?;

        self.state.store.commit(accepted.mutations).await?;
        info!("🔄 Viaje {}: {} -> {}", trip.id, trip.status, accepted.outcome);

        self.state.hub.publish(&FleetEvent::TripStatusUpdated(TripStatusChange {
            trip_id: trip.id,
            status: accepted.outcome,
        }));
        self.announce_vehicle_change(&vehicle).await;
        broadcast_dashboard(&self.state).await;

        let trip = self.load_trip(id).await?;
        let vehicle = self.load_vehicle(trip.vehicle_id).await?;
        let driver = self.load_driver(trip.driver_id).await?;
        Ok(TripResponse::build(trip, Some(&vehicle), Some(&driver)))
    }

    /// Borra el viaje y su combustible; un viaje `sent` libera sus recursos
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let trip = self.load_trip(id).await?;
        let vehicle = self.load_vehicle(trip.vehicle_id).await?;
        let driver = self.load_driver(trip.driver_id).await?;

        let accepted = settle(&self.state, trip_rules::evaluate_trip_deletion(&trip, &vehicle, &driver))?;
        self.state.store.commit(accepted.mutations).await?;
        info!("🗑️ Viaje {} eliminado ({})", trip.id, trip.status);

        self.announce_vehicle_change(&vehicle).await;
        broadcast_dashboard(&self.state).await;
        Ok(())
    }
}
