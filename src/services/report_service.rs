//! Agregación de informes
//!
//! Funciones puras sobre listas ya cargadas del store. Importes redondeados a
//! 2 decimales; las divisiones por cero producen `None`.

use std::collections::{BTreeMap, HashMap};

use uuid::Uuid;

use crate::dto::report_dto::{FuelEfficiencyReport, MonthlyExpenseReport, VehicleProfitabilityReport};
use crate::models::{FuelLog, MaintenanceLog, Trip, Vehicle};
use crate::rules::estimated_distance_km;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Eficiencia por registro de combustible. Se omiten los registros cuyo viaje
/// o vehículo ya no existe.
pub fn fuel_efficiency(fuel_logs: &[FuelLog], trips: &[Trip], vehicles: &[Vehicle]) -> Vec<FuelEfficiencyReport> {
    let trips: HashMap<Uuid, &Trip> = trips.iter().map(|t| (t.id, t)).collect();
    let vehicles: HashMap<Uuid, &Vehicle> = vehicles.iter().map(|v| (v.id, v)).collect();

    fuel_logs
        .iter()
        .filter_map(|log| {
            let trip = trips.get(&log.trip_id)?;
            let vehicle = vehicles.get(&trip.vehicle_id)?;
            let distance = estimated_distance_km(trip.cargo_weight);

            Some(FuelEfficiencyReport {
                trip_id: trip.id,
                vehicle_plate: vehicle.plate_number.clone(),
                destination: trip.destination.clone(),
                fuel_used: log.fuel_used,
                fuel_cost: log.fuel_cost,
                efficiency_km_per_l: (log.fuel_used > 0.0).then(|| round2(distance / log.fuel_used)),
                cost_per_km: (distance > 0.0).then(|| round2(log.fuel_cost / distance)),
            })
        })
        .collect()
}

/// Gastos por mes `YYYY-MM`, en orden ascendente
pub fn monthly_expenses(maintenance: &[MaintenanceLog], fuel_logs: &[FuelLog]) -> Vec<MonthlyExpenseReport> {
    let mut months: BTreeMap<String, (f64, f64)> = BTreeMap::new();

    for log in maintenance {
        months.entry(log.created_at.format("%Y-%m").to_string()).or_default().0 += log.cost;
    }
    for log in fuel_logs {
        months.entry(log.created_at.format("%Y-%m").to_string()).or_default().1 += log.fuel_cost;
    }

    months
        .into_iter()
        .map(|(month, (maintenance_cost, fuel_cost))| MonthlyExpenseReport {
            month,
            total_maintenance_cost: round2(maintenance_cost),
            total_fuel_cost: round2(fuel_cost),
            total_cost: round2(maintenance_cost + fuel_cost),
        })
        .collect()
}

/// Coste acumulado por vehículo
pub fn vehicle_profitability(
    vehicles: &[Vehicle],
    trips: &[Trip],
    maintenance: &[MaintenanceLog],
    fuel_logs: &[FuelLog],
) -> Vec<VehicleProfitabilityReport> {
    let mut maintenance_by_vehicle: HashMap<Uuid, f64> = HashMap::new();
    for log in maintenance {
        *maintenance_by_vehicle.entry(log.vehicle_id).or_default() += log.cost;
    }

    let trip_vehicle: HashMap<Uuid, Uuid> = trips.iter().map(|t| (t.id, t.vehicle_id)).collect();
    let mut fuel_by_vehicle: HashMap<Uuid, f64> = HashMap::new();
    for log in fuel_logs {
        if let Some(vehicle_id) = trip_vehicle.get(&log.trip_id) {
            *fuel_by_vehicle.entry(*vehicle_id).or_default() += log.fuel_cost;
        }
    }

    vehicles
        .iter()
        .map(|vehicle| {
            let maintenance_cost = maintenance_by_vehicle.get(&vehicle.id).copied().unwrap_or(0.0);
            let fuel_cost = fuel_by_vehicle.get(&vehicle.id).copied().unwrap_or(0.0);
            let total = maintenance_cost + fuel_cost;

            VehicleProfitabilityReport {
                vehicle_id: vehicle.id,
                plate_number: vehicle.plate_number.clone(),
                vehicle_type: vehicle.vehicle_type.clone(),
                total_mileage: vehicle.mileage,
                total_maintenance_cost: round2(maintenance_cost),
                total_fuel_cost: round2(fuel_cost),
                total_cost: round2(total),
                cost_per_km: (vehicle.mileage > 0.0).then(|| round2(total / vehicle.mileage)),
            }
        })
        .collect()
}
