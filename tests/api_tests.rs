use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use fleetflow::config::{EnvironmentConfig, StoreBackend};
use fleetflow::controllers::dashboard_controller::DashboardController;
use fleetflow::models::{DashboardStats, Driver, FuelLog, MaintenanceLog, Role, Trip, User, Vehicle, VehicleStatus};
use fleetflow::realtime::Subscription;
use fleetflow::repositories::{FleetStore, MemoryFleetStore};
use fleetflow::rules::{Change, MutationSet};
use fleetflow::state::AppState;
use fleetflow::utils::errors::{AppError, AppResult};

struct TestApp {
    app: Router,
    state: AppState,
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn token_for(&self, role: Role) -> String {
        let user = User {
            id: Uuid::new_v4(),
            name: format!("{} user", role),
            email: format!("{}@fleetflow.test", Uuid::new_v4()),
            password_hash: "not-used".to_string(),
            role,
            is_active: true,
            created_at: Utc::now(),
        };
        self.state
            .store
            .commit(MutationSet::single(Change::InsertUser(user.clone())))
            .await
            .unwrap();
        self.state.jwt.generate_access_token(&user).unwrap()
    }

    async fn create_vehicle(&self, token: &str, plate: &str, max_weight: f64, mileage: f64) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/vehicles",
                Some(token),
                Some(json!({
                    "plate_number": plate,
                    "vehicle_type": "Van",
                    "max_weight": max_weight,
                    "mileage": mileage
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body
    }

    async fn create_driver(&self, token: &str, license: &str, expiry: chrono::NaiveDate) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/drivers",
                Some(token),
                Some(json!({
                    "name": "Jane Cooper",
                    "license_number": license,
                    "license_expiry_date": expiry.to_string()
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body
    }

    async fn create_trip(&self, token: &str, vehicle: &Value, driver: &Value, cargo_weight: f64) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/trips",
            Some(token),
            Some(json!({
                "vehicle_id": vehicle["id"],
                "driver_id": driver["id"],
                "destination": "North Depot",
                "cargo_weight": cargo_weight
            })),
        )
        .await
    }

    async fn set_trip_status(&self, token: &str, trip: &Value, status: &str) -> (StatusCode, Value) {
        let uri = format!("/api/trips/{}/status", trip["id"].as_str().unwrap());
        self.send(Method::PATCH, &uri, Some(token), Some(json!({ "status": status })))
            .await
    }

    async fn vehicle(&self, token: &str, id: &Value) -> Value {
        let (_, vehicles) = self.send(Method::GET, "/api/vehicles", Some(token), None).await;
        vehicles
            .as_array()
            .unwrap()
            .iter()
            .find(|v| v["id"] == *id)
            .cloned()
            .unwrap_or(Value::Null)
    }

    async fn driver(&self, token: &str, id: &Value) -> Value {
        let (_, drivers) = self.send(Method::GET, "/api/drivers", Some(token), None).await;
        drivers
            .as_array()
            .unwrap()
            .iter()
            .find(|d| d["id"] == *id)
            .cloned()
            .unwrap_or(Value::Null)
    }
}

fn create_test_app() -> TestApp {
    create_test_app_with(Arc::new(MemoryFleetStore::new()))
}

fn create_test_app_with(store: Arc<dyn FleetStore>) -> TestApp {
    let config = EnvironmentConfig {
        store_backend: StoreBackend::Memory,
        jwt_secret: "test-secret".to_string(),
        bcrypt_cost: 4,
        ..EnvironmentConfig::default()
    };
    let state = AppState::new(store, config);
    TestApp {
        app: fleetflow::build_app(state.clone()),
        state,
    }
}

fn far_future() -> chrono::NaiveDate {
    Utc::now().date_naive() + Duration::days(365 * 3)
}

fn drain(subscription: &mut Subscription) -> Vec<Value> {
    let mut frames = Vec::new();
    while let Ok(frame) = subscription.receiver.try_recv() {
        frames.push(serde_json::from_str(&frame).unwrap());
    }
    frames
}

fn named<'a>(frames: &'a [Value], event: &str) -> Vec<&'a Value> {
    frames.iter().filter(|f| f["event"] == event).collect()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();
    let (status, body) = app.send(Method::GET, "/", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["name"], "fleetflow");
}

#[tokio::test]
async fn test_overweight_trip_is_rejected_with_critical_alert() {
    let app = create_test_app();
    let manager = app.token_for(Role::FleetManager).await;
    let vehicle = app.create_vehicle(&manager, "VAN-05", 3500.0, 0.0).await;
    let driver = app.create_driver(&manager, "DL-1001", far_future()).await;

    let mut observer = app.state.hub.register().unwrap();
    let (status, body) = app.create_trip(&manager, &vehicle, &driver, 4000.0).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cargo weight (4000kg) exceeds vehicle max capacity (3500kg)");
    assert_eq!(body["code"], "OVERWEIGHT_CARGO");

    let frames = drain(&mut observer);
    let alerts = named(&frames, "alert");
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["data"]["type"], "overweight_cargo");
    assert_eq!(alerts[0]["data"]["severity"], "critical");
    assert_eq!(alerts[0]["data"]["entity_id"], vehicle["id"]);

    let (_, trips) = app.send(Method::GET, "/api/trips", Some(manager.as_str()), None).await;
    assert!(trips.as_array().unwrap().is_empty());
    assert_eq!(app.vehicle(&manager, &vehicle["id"]).await["status"], "available");
}

#[tokio::test]
async fn test_expired_license_blocks_trip_creation() {
    let app = create_test_app();
    let manager = app.token_for(Role::FleetManager).await;
    let vehicle = app.create_vehicle(&manager, "VAN-06", 3500.0, 0.0).await;
    let yesterday = Utc::now().date_naive() - Duration::days(1);
    let driver = app.create_driver(&manager, "DL-1002", yesterday).await;

    let mut observer = app.state.hub.register().unwrap();
    let (status, body) = app.create_trip(&manager, &vehicle, &driver, 500.0).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "EXPIRED_LICENSE");

    let frames = drain(&mut observer);
    let alerts = named(&frames, "alert");
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["data"]["type"], "expired_license");
    assert_eq!(alerts[0]["data"]["severity"], "critical");
}

#[tokio::test]
async fn test_trip_round_trip_adds_estimated_mileage() {
    let app = create_test_app();
    let token = app.token_for(Role::FleetManager).await;
    let vehicle = app.create_vehicle(&token, "TRK-01", 8000.0, 1000.0).await;
    let driver = app.create_driver(&token, "DL-2001", far_future()).await;

    let (status, trip) = app.create_trip(&token, &vehicle, &driver, 2000.0).await;
    assert_eq!(status, StatusCode::CREATED, "{}", trip);
    assert_eq!(trip["status"], "draft");
    assert_eq!(trip["vehicle"]["plate_number"], "TRK-01");

    let (status, sent) = app.set_trip_status(&token, &trip, "sent").await;
    assert_eq!(status, StatusCode::OK, "{}", sent);
    assert!(sent["start_time"].is_string());
    assert_eq!(app.vehicle(&token, &vehicle["id"]).await["status"], "on_trip");
    assert_eq!(app.driver(&token, &driver["id"]).await["duty_status"], "on_trip");

    let mut observer = app.state.hub.register().unwrap();
    let (status, done) = app.set_trip_status(&token, &trip, "done").await;
    assert_eq!(status, StatusCode::OK, "{}", done);
    assert!(done["end_time"].is_string());

    let frames = drain(&mut observer);
    let trip_events = named(&frames, "tripStatusUpdated");
    assert_eq!(trip_events.len(), 1);
    assert_eq!(trip_events[0]["data"]["status"], "done");
    let vehicle_events = named(&frames, "vehicleStatusUpdated");
    assert_eq!(vehicle_events.len(), 1);
    assert_eq!(vehicle_events[0]["data"]["previous_status"], "on_trip");
    assert_eq!(named(&frames, "dashboardUpdate").len(), 1);

    let vehicle_after = app.vehicle(&token, &vehicle["id"]).await;
    assert_eq!(vehicle_after["status"], "available");
    assert_eq!(vehicle_after["mileage"].as_f64(), Some(1020.0));
    assert_eq!(app.driver(&token, &driver["id"]).await["duty_status"], "on");

    let (status, body) = app.set_trip_status(&token, &trip, "sent").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_TRANSITION");
}

#[tokio::test]
async fn test_cancel_after_dispatch_restores_resources_without_mileage() {
    let app = create_test_app();
    let token = app.token_for(Role::Dispatcher).await;
    let manager = app.token_for(Role::FleetManager).await;
    let vehicle = app.create_vehicle(&manager, "VAN-07", 3500.0, 400.0).await;
    let driver = app.create_driver(&manager, "DL-3001", far_future()).await;

    let (_, trip) = app.create_trip(&token, &vehicle, &driver, 1000.0).await;
    app.set_trip_status(&token, &trip, "sent").await;
    let (status, canceled) = app.set_trip_status(&token, &trip, "canceled").await;

    assert_eq!(status, StatusCode::OK, "{}", canceled);
    assert_eq!(canceled["status"], "canceled");
    let vehicle_after = app.vehicle(&manager, &vehicle["id"]).await;
    assert_eq!(vehicle_after["status"], "available");
    assert_eq!(vehicle_after["mileage"].as_f64(), Some(400.0));
    assert_eq!(app.driver(&manager, &driver["id"]).await["duty_status"], "on");
}

#[tokio::test]
async fn test_unknown_trip_status_is_rejected() {
    let app = create_test_app();
    let token = app.token_for(Role::FleetManager).await;
    let vehicle = app.create_vehicle(&token, "VAN-08", 3500.0, 0.0).await;
    let driver = app.create_driver(&token, "DL-3002", far_future()).await;
    let (_, trip) = app.create_trip(&token, &vehicle, &driver, 100.0).await;

    let (status, body) = app.set_trip_status(&token, &trip, "flying").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_STATUS");
}

#[tokio::test]
async fn test_deleting_sent_trip_releases_vehicle_and_driver() {
    let app = create_test_app();
    let token = app.token_for(Role::FleetManager).await;
    let vehicle = app.create_vehicle(&token, "VAN-09", 3500.0, 0.0).await;
    let driver = app.create_driver(&token, "DL-3003", far_future()).await;
    let (_, trip) = app.create_trip(&token, &vehicle, &driver, 100.0).await;
    app.set_trip_status(&token, &trip, "sent").await;

    let uri = format!("/api/trips/{}", trip["id"].as_str().unwrap());
    let (status, _) = app.send(Method::DELETE, &uri, Some(token.as_str()), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.vehicle(&token, &vehicle["id"]).await["status"], "available");
    assert_eq!(app.driver(&token, &driver["id"]).await["duty_status"], "on");
    let (status, _) = app.send(Method::DELETE, &uri, Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_maintenance_forces_in_shop_even_mid_trip() {
    let app = create_test_app();
    let manager = app.token_for(Role::FleetManager).await;
    let dispatcher = app.token_for(Role::Dispatcher).await;
    let vehicle = app.create_vehicle(&manager, "TRK-02", 8000.0, 0.0).await;
    let driver = app.create_driver(&manager, "DL-4001", far_future()).await;
    let (_, trip) = app.create_trip(&dispatcher, &vehicle, &driver, 100.0).await;
    app.set_trip_status(&dispatcher, &trip, "sent").await;

    let mut observer = app.state.hub.register().unwrap();
    let (status, log) = app
        .send(
            Method::POST,
            "/api/maintenance",
            Some(manager.as_str()),
            Some(json!({
                "vehicle_id": vehicle["id"],
                "description": "Brake pads replacement",
                "cost": 320.5
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", log);

    let frames = drain(&mut observer);
    let updates = named(&frames, "vehicleStatusUpdated");
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0]["data"]["status"], "in_shop");
    assert_eq!(updates[0]["data"]["previous_status"], "on_trip");
    let alerts = named(&frames, "alert");
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["data"]["type"], "maintenance_status_change");

    assert_eq!(app.vehicle(&manager, &vehicle["id"]).await["status"], "in_shop");
    assert_eq!(app.vehicle(&dispatcher, &vehicle["id"]).await, Value::Null);

    let uri = format!("/api/maintenance/{}", log["id"].as_str().unwrap());
    let (status, _) = app.send(Method::DELETE, &uri, Some(manager.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.vehicle(&manager, &vehicle["id"]).await["status"], "available");
}

#[tokio::test]
async fn test_role_gate() {
    let app = create_test_app();
    let analyst = app.token_for(Role::FinancialAnalyst).await;
    let safety = app.token_for(Role::SafetyOfficer).await;

    let body = json!({ "plate_number": "X-1", "vehicle_type": "Van", "max_weight": 1000.0 });
    let (status, error) = app.send(Method::POST, "/api/vehicles", Some(analyst.as_str()), Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error["code"], "FORBIDDEN");

    let (status, _) = app.send(Method::POST, "/api/vehicles", None, Some(body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(Method::GET, "/api/reports/alerts", Some(safety.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send(Method::GET, "/api/fuel", Some(safety.as_str()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_retiring_twice_is_idempotent() {
    let app = create_test_app();
    let token = app.token_for(Role::FleetManager).await;
    let vehicle = app.create_vehicle(&token, "OLD-01", 2000.0, 90000.0).await;
    let uri = format!("/api/vehicles/{}", vehicle["id"].as_str().unwrap());

    let (status, first) = app.send(Method::DELETE, &uri, Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["status"], "retired");

    let mut observer = app.state.hub.register().unwrap();
    let (status, second) = app.send(Method::DELETE, &uri, Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["status"], "retired");
    assert!(drain(&mut observer).is_empty());
}

#[tokio::test]
async fn test_duplicate_plate_is_conflict() {
    let app = create_test_app();
    let token = app.token_for(Role::FleetManager).await;
    app.create_vehicle(&token, "DUP-01", 2000.0, 0.0).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/vehicles",
            Some(token.as_str()),
            Some(json!({ "plate_number": "DUP-01", "vehicle_type": "Van", "max_weight": 1000.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DUPLICATE_PLATE_NUMBER");
}

#[tokio::test]
async fn test_patch_fans_out_identical_payload_to_live_observers() {
    let app = create_test_app();
    let token = app.token_for(Role::FleetManager).await;
    let vehicle = app.create_vehicle(&token, "VAN-10", 3500.0, 0.0).await;

    let mut observers: Vec<Subscription> = (0..3).map(|_| app.state.hub.register().unwrap()).collect();
    // Un observador que se desconecta antes del PATCH
    let gone = app.state.hub.register().unwrap();
    drop(gone);

    let uri = format!("/api/vehicles/{}", vehicle["id"].as_str().unwrap());
    let (status, _) = app
        .send(Method::PATCH, &uri, Some(token.as_str()), Some(json!({ "status": "in_shop" })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let payloads: Vec<Value> = observers
        .iter_mut()
        .map(|observer| {
            let frames = drain(observer);
            let updates = named(&frames, "vehicleStatusUpdated");
            assert_eq!(updates.len(), 1);
            updates[0].clone()
        })
        .collect();
    assert!(payloads.iter().all(|p| *p == payloads[0]));
    assert_eq!(payloads[0]["data"]["status"], "in_shop");
    assert_eq!(app.state.hub.observer_count(), 3);
}

#[tokio::test]
async fn test_patch_rejects_immutable_fields() {
    let app = create_test_app();
    let token = app.token_for(Role::FleetManager).await;
    let vehicle = app.create_vehicle(&token, "VAN-11", 3500.0, 0.0).await;

    let uri = format!("/api/vehicles/{}", vehicle["id"].as_str().unwrap());
    let (status, _) = app
        .send(Method::PATCH, &uri, Some(token.as_str()), Some(json!({ "id": Uuid::new_v4() })))
        .await;
    assert!(status.is_client_error());
    assert_eq!(app.vehicle(&token, &vehicle["id"]).await["id"], vehicle["id"]);
}

#[tokio::test]
async fn test_new_observer_receives_dashboard_snapshot_first() {
    let app = create_test_app();
    let token = app.token_for(Role::FleetManager).await;
    app.create_vehicle(&token, "VAN-12", 3500.0, 0.0).await;

    let mut subscription = DashboardController::new(&app.state).subscribe().await.unwrap();
    let frames = drain(&mut subscription);

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["event"], "dashboardUpdate");
    assert_eq!(frames[0]["data"]["active_vehicles"], 1);
    assert_eq!(frames[0]["data"]["idle_vehicles"], 1);
}

#[tokio::test]
async fn test_register_login_and_profile() {
    let app = create_test_app();
    let (status, user) = app
        .send(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "name": "Robert Fox",
                "email": "Robert@Fleet.test",
                "password": "s3cret!",
                "role": "Safety Officer"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", user);
    assert_eq!(user["email"], "robert@fleet.test");

    let (status, _) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "robert@fleet.test", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, tokens) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "robert@fleet.test", "password": "s3cret!" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tokens["role"], "Safety Officer");

    let access = tokens["token"].as_str().unwrap();
    let (status, me) = app.send(Method::GET, "/auth/me", Some(access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["name"], "Robert Fox");

    let refresh = tokens["refresh_token"].as_str().unwrap();
    let (status, _) = app.send(Method::GET, "/api/stats", Some(refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, renewed) = app
        .send(Method::POST, "/auth/refresh", None, Some(json!({ "refresh_token": refresh })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(renewed["token"].is_string());

    let (status, _) = app
        .send(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "name": "Other", "email": "robert@fleet.test", "password": "another1" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

/// Store en memoria cuyas lecturas de vehículos fallan después del primer
/// commit desde que se arma
#[derive(Default)]
struct FailingReloadStore {
    inner: MemoryFleetStore,
    armed: AtomicBool,
    tripped: AtomicBool,
}

impl FailingReloadStore {
    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl FleetStore for FailingReloadStore {
    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        self.inner.list_vehicles().await
    }
    async fn get_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        if self.tripped.load(Ordering::SeqCst) {
            return Err(AppError::Internal("vehicle read failed".to_string()));
        }
        self.inner.get_vehicle(id).await
    }
    async fn plate_number_taken(&self, plate_number: &str) -> AppResult<bool> {
        self.inner.plate_number_taken(plate_number).await
    }
    async fn list_drivers(&self) -> AppResult<Vec<Driver>> {
        self.inner.list_drivers().await
    }
    async fn get_driver(&self, id: Uuid) -> AppResult<Option<Driver>> {
        self.inner.get_driver(id).await
    }
    async fn license_number_taken(&self, license_number: &str) -> AppResult<bool> {
        self.inner.license_number_taken(license_number).await
    }
    async fn list_trips(&self) -> AppResult<Vec<Trip>> {
        self.inner.list_trips().await
    }
    async fn get_trip(&self, id: Uuid) -> AppResult<Option<Trip>> {
        self.inner.get_trip(id).await
    }
    async fn list_maintenance(&self) -> AppResult<Vec<MaintenanceLog>> {
        self.inner.list_maintenance().await
    }
    async fn get_maintenance(&self, id: Uuid) -> AppResult<Option<MaintenanceLog>> {
        self.inner.get_maintenance(id).await
    }
    async fn count_maintenance_for_vehicle(&self, vehicle_id: Uuid) -> AppResult<usize> {
        self.inner.count_maintenance_for_vehicle(vehicle_id).await
    }
    async fn list_fuel_logs(&self) -> AppResult<Vec<FuelLog>> {
        self.inner.list_fuel_logs().await
    }
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        self.inner.get_user(id).await
    }
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.inner.find_user_by_email(email).await
    }
    async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        self.inner.dashboard_stats().await
    }
    async fn commit(&self, mutations: MutationSet) -> AppResult<()> {
        self.inner.commit(mutations).await?;
        if self.armed.load(Ordering::SeqCst) {
            self.tripped.store(true, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_driver_list_emits_license_alerts_once_per_cooldown() {
    let app = create_test_app();
    let safety = app.token_for(Role::SafetyOfficer).await;
    let today = Utc::now().date_naive();
    let expired = app.create_driver(&safety, "DL-6001", today).await;
    let expiring = app.create_driver(&safety, "DL-6002", today + Duration::days(10)).await;
    app.create_driver(&safety, "DL-6003", today + Duration::days(40)).await;
    app.create_driver(&safety, "DL-6004", far_future()).await;

    let mut observer = app.state.hub.register().unwrap();
    let (status, drivers) = app.send(Method::GET, "/api/drivers", Some(safety.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(drivers.as_array().unwrap().len(), 4);

    let frames = drain(&mut observer);
    let alerts = named(&frames, "alert");
    assert_eq!(alerts.len(), 2);
    let critical = alerts.iter().find(|a| a["data"]["type"] == "license_expired").unwrap();
    assert_eq!(critical["data"]["severity"], "critical");
    assert_eq!(critical["data"]["entity_id"], expired["id"]);
    let warning = alerts.iter().find(|a| a["data"]["type"] == "license_expiring").unwrap();
    assert_eq!(warning["data"]["severity"], "warning");
    assert_eq!(warning["data"]["entity_id"], expiring["id"]);

    // Un segundo listado inmediato queda dentro del cooldown
    let (status, _) = app.send(Method::GET, "/api/drivers", Some(safety.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(named(&drain(&mut observer), "alert").is_empty());
}

#[tokio::test]
async fn test_two_trips_racing_for_one_vehicle_claim_it_once() {
    let app = create_test_app();
    let manager = app.token_for(Role::FleetManager).await;
    let dispatcher = app.token_for(Role::Dispatcher).await;
    let vehicle = app.create_vehicle(&manager, "VAN-20", 3500.0, 0.0).await;
    let first_driver = app.create_driver(&manager, "DL-7001", far_future()).await;
    let second_driver = app.create_driver(&manager, "DL-7002", far_future()).await;
    let (_, first) = app.create_trip(&dispatcher, &vehicle, &first_driver, 100.0).await;
    let (_, second) = app.create_trip(&dispatcher, &vehicle, &second_driver, 200.0).await;

    let mut observer = app.state.hub.register().unwrap();
    let ((first_status, _), (second_status, _)) = tokio::join!(
        app.set_trip_status(&dispatcher, &first, "sent"),
        app.set_trip_status(&dispatcher, &second, "sent"),
    );

    let mut statuses = [first_status, second_status];
    statuses.sort_by_key(|status| status.as_u16());
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);

    assert_eq!(app.vehicle(&manager, &vehicle["id"]).await["status"], "on_trip");
    let (_, drivers) = app.send(Method::GET, "/api/drivers", Some(manager.as_str()), None).await;
    let on_trip = drivers
        .as_array()
        .unwrap()
        .iter()
        .filter(|d| d["duty_status"] == "on_trip")
        .count();
    assert_eq!(on_trip, 1);

    let (_, trips) = app.send(Method::GET, "/api/trips", Some(manager.as_str()), None).await;
    let sent = trips.as_array().unwrap().iter().filter(|t| t["status"] == "sent").count();
    assert_eq!(sent, 1);

    let frames = drain(&mut observer);
    assert_eq!(named(&frames, "tripStatusUpdated").len(), 1);
    assert_eq!(named(&frames, "vehicleStatusUpdated").len(), 1);
}

#[tokio::test]
async fn test_completing_trip_keeps_vehicle_sent_to_shop_in_shop() {
    let app = create_test_app();
    let manager = app.token_for(Role::FleetManager).await;
    let vehicle = app.create_vehicle(&manager, "TRK-30", 8000.0, 500.0).await;
    let driver = app.create_driver(&manager, "DL-8001", far_future()).await;
    let (_, trip) = app.create_trip(&manager, &vehicle, &driver, 2000.0).await;
    app.set_trip_status(&manager, &trip, "sent").await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/maintenance",
            Some(manager.as_str()),
            Some(json!({ "vehicle_id": vehicle["id"], "description": "Engine noise", "cost": 150.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.set_trip_status(&manager, &trip, "done").await;
    assert_eq!(status, StatusCode::OK);

    let vehicle_after = app.vehicle(&manager, &vehicle["id"]).await;
    assert_eq!(vehicle_after["status"], "in_shop");
    assert_eq!(vehicle_after["mileage"].as_f64(), Some(520.0));
    assert_eq!(app.driver(&manager, &driver["id"]).await["duty_status"], "on");
}

#[tokio::test]
async fn test_failed_reload_after_commit_keeps_success_and_dashboard() {
    let store = Arc::new(FailingReloadStore::default());
    let app = create_test_app_with(store.clone());
    let manager = app.token_for(Role::FleetManager).await;
    let vehicle = app.create_vehicle(&manager, "VAN-40", 3500.0, 0.0).await;
    let driver = app.create_driver(&manager, "DL-9001", far_future()).await;
    let (_, trip) = app.create_trip(&manager, &vehicle, &driver, 100.0).await;
    app.set_trip_status(&manager, &trip, "sent").await;

    let mut observer = app.state.hub.register().unwrap();
    store.arm();
    let uri = format!("/api/trips/{}", trip["id"].as_str().unwrap());
    let (status, body) = app.send(Method::DELETE, &uri, Some(manager.as_str()), None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let frames = drain(&mut observer);
    assert!(named(&frames, "vehicleStatusUpdated").is_empty());
    assert_eq!(named(&frames, "dashboardUpdate").len(), 1);

    let vehicle_id: Uuid = vehicle["id"].as_str().unwrap().parse().unwrap();
    let stored = store.inner.list_vehicles().await.unwrap();
    let stored = stored.iter().find(|v| v.id == vehicle_id).unwrap();
    assert_eq!(stored.status, VehicleStatus::Available);
}
