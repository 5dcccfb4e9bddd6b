use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelEfficiencyReport {
    pub trip_id: Uuid,
    pub vehicle_plate: String,
    pub destination: String,
    pub fuel_used: f64,
    pub fuel_cost: f64,
    pub efficiency_km_per_l: Option<f64>,
    pub cost_per_km: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyExpenseReport {
    pub month: String,
    pub total_maintenance_cost: f64,
    pub total_fuel_cost: f64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleProfitabilityReport {
    pub vehicle_id: Uuid,
    pub plate_number: String,
    pub vehicle_type: String,
    pub total_mileage: f64,
    pub total_maintenance_cost: f64,
    pub total_fuel_cost: f64,
    pub total_cost: f64,
    pub cost_per_km: Option<f64>,
}
