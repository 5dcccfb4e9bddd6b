//! Tabla de autorización
//!
//! Cada ruta protegida se traduce a una [`Operation`] y cada operación declara
//! los roles que pueden ejecutarla. El middleware de auth es el único que
//! consulta esta tabla.

use axum::http::Method;

use crate::models::{Role, VehicleStatus};

const ALL: &[Role] = Role::ALL;
const FM: &[Role] = &[Role::FleetManager];
const FM_DISPATCH: &[Role] = &[Role::FleetManager, Role::Dispatcher];
const FM_SAFETY: &[Role] = &[Role::FleetManager, Role::SafetyOfficer];
const FM_FINANCE: &[Role] = &[Role::FleetManager, Role::FinancialAnalyst];
const FM_DISPATCH_SAFETY: &[Role] = &[Role::FleetManager, Role::Dispatcher, Role::SafetyOfficer];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ViewProfile,
    UpdateProfile,
    ChangePassword,
    ViewStats,
    StreamEvents,

    ListVehicles,
    CreateVehicle,
    UpdateVehicle,
    RetireVehicle,

    ListDrivers,
    CreateDriver,
    UpdateDriver,
    SuspendDriver,

    ListTrips,
    CreateTrip,
    UpdateTripStatus,
    DeleteTrip,

    ListMaintenance,
    CreateMaintenance,
    DeleteMaintenance,

    ListFuelLogs,
    CreateFuelLog,

    ReportFuelEfficiency,
    ReportMonthlyExpenses,
    ReportVehicleProfitability,
    ReportAlerts,
}

impl Operation {
    pub fn required_roles(&self) -> &'static [Role] {
        match self {
            Operation::ViewProfile
            | Operation::UpdateProfile
            | Operation::ChangePassword
            | Operation::ViewStats
            | Operation::StreamEvents
            | Operation::ReportAlerts => ALL,

            Operation::ListVehicles => FM_DISPATCH,
            Operation::CreateVehicle | Operation::UpdateVehicle | Operation::RetireVehicle => FM,

            Operation::ListDrivers => FM_DISPATCH_SAFETY,
            Operation::CreateDriver | Operation::UpdateDriver => FM_SAFETY,
            Operation::SuspendDriver => FM,

            Operation::ListTrips | Operation::CreateTrip | Operation::UpdateTripStatus | Operation::DeleteTrip => {
                FM_DISPATCH
            }

            Operation::ListMaintenance => FM_SAFETY,
            Operation::CreateMaintenance | Operation::DeleteMaintenance => FM,

            Operation::ListFuelLogs => FM_FINANCE,
            Operation::CreateFuelLog => FM_DISPATCH,

            Operation::ReportFuelEfficiency
            | Operation::ReportMonthlyExpenses
            | Operation::ReportVehicleProfitability => FM_FINANCE,
        }
    }

    pub fn permits(&self, role: Role) -> bool {
        self.required_roles().contains(&role)
    }

    /// Traduce método + ruta registrada en axum (`MatchedPath`) a operación
    pub fn for_route(method: &Method, path: &str) -> Option<Operation> {
        let operation = match (method.as_str(), path) {
            ("GET", "/auth/me") => Operation::ViewProfile,
            ("PATCH", "/auth/me") => Operation::UpdateProfile,
            ("PATCH", "/auth/me/password") => Operation::ChangePassword,
            ("GET", "/api/stats") => Operation::ViewStats,
            ("GET", "/ws") => Operation::StreamEvents,

            ("GET", "/api/vehicles") => Operation::ListVehicles,
            ("POST", "/api/vehicles") => Operation::CreateVehicle,
            ("PATCH", "/api/vehicles/:id") => Operation::UpdateVehicle,
            ("DELETE", "/api/vehicles/:id") => Operation::RetireVehicle,

            ("GET", "/api/drivers") => Operation::ListDrivers,
            ("POST", "/api/drivers") => Operation::CreateDriver,
            ("PATCH", "/api/drivers/:id") => Operation::UpdateDriver,
            ("DELETE", "/api/drivers/:id") => Operation::SuspendDriver,

            ("GET", "/api/trips") => Operation::ListTrips,
            ("POST", "/api/trips") => Operation::CreateTrip,
            ("PATCH", "/api/trips/:id/status") => Operation::UpdateTripStatus,
            ("DELETE", "/api/trips/:id") => Operation::DeleteTrip,

            ("GET", "/api/maintenance") => Operation::ListMaintenance,
            ("POST", "/api/maintenance") => Operation::CreateMaintenance,
            ("DELETE", "/api/maintenance/:id") => Operation::DeleteMaintenance,

            ("GET", "/api/fuel") => Operation::ListFuelLogs,
            ("POST", "/api/fuel") => Operation::CreateFuelLog,

            ("GET", "/api/reports/fuel-efficiency") => Operation::ReportFuelEfficiency,
            ("GET", "/api/reports/monthly-expenses") => Operation::ReportMonthlyExpenses,
            ("GET", "/api/reports/vehicle-profitability") => Operation::ReportVehicleProfitability,
            ("GET", "/api/reports/alerts") => Operation::ReportAlerts,

            _ => return None,
        };
        Some(operation)
    }
}

/// Alcance de lectura de vehículos según el rol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleScope {
    All,
    /// Despacho nunca ve vehículos en taller
    Dispatch,
}

impl VehicleScope {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Dispatcher => VehicleScope::Dispatch,
            _ => VehicleScope::All,
        }
    }

    pub fn includes(&self, status: VehicleStatus) -> bool {
        match self {
            VehicleScope::All => true,
            VehicleScope::Dispatch => status != VehicleStatus::InShop,
        }
    }
}
