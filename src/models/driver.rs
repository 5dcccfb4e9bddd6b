//! Modelo de Driver
//!
//! Conductores con su licencia y su estado de servicio.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ParseEnumError;

/// Estado de servicio del conductor, independiente de la validez de la licencia
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyStatus {
    On,
    Off,
    OnTrip,
    Suspended,
}

impl DutyStatus {
    pub const ALLOWED: &'static [&'static str] = &["on", "off", "on_trip", "suspended"];

    pub fn as_str(&self) -> &'static str {
        match self {
            DutyStatus::On => "on",
            DutyStatus::Off => "off",
            DutyStatus::OnTrip => "on_trip",
            DutyStatus::Suspended => "suspended",
        }
    }
}

impl fmt::Display for DutyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DutyStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "on" => Ok(DutyStatus::On),
            "off" => Ok(DutyStatus::Off),
            "on_trip" => Ok(DutyStatus::OnTrip),
            "suspended" => Ok(DutyStatus::Suspended),
            _ => Err(ParseEnumError {
                kind: "duty status",
                value: s.to_string(),
                allowed: Self::ALLOWED,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub license_number: String,
    pub license_expiry_date: NaiveDate,
    pub safety_score: f64,
    pub duty_status: DutyStatus,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Driver {
    pub fn new(name: String, license_number: String, license_expiry_date: NaiveDate, duty_status: DutyStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            license_number,
            license_expiry_date,
            safety_score: 100.0,
            duty_status,
            avatar_url: None,
            created_at: Utc::now(),
        }
    }

    /// Una licencia que vence hoy todavía es válida para despachar
    pub fn license_expired_on(&self, today: NaiveDate) -> bool {
        self.license_expiry_date < today
    }
}

/// Cambios parciales permitidos sobre un conductor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverPatch {
    pub name: Option<String>,
    pub license_number: Option<String>,
    pub license_expiry_date: Option<NaiveDate>,
    pub safety_score: Option<f64>,
    pub duty_status: Option<DutyStatus>,
    pub avatar_url: Option<String>,
}

impl DriverPatch {
    pub fn is_empty(&self) -> bool {
        *self == DriverPatch::default()
    }

    pub fn merge_into(&self, driver: &mut Driver) {
        if let Some(name) = &self.name {
            driver.name = name.clone();
        }
        if let Some(license_number) = &self.license_number {
            driver.license_number = license_number.clone();
        }
        if let Some(expiry) = self.license_expiry_date {
            driver.license_expiry_date = expiry;
        }
        if let Some(score) = self.safety_score {
            driver.safety_score = score;
        }
        if let Some(duty) = self.duty_status {
            driver.duty_status = duty;
        }
        if let Some(avatar_url) = &self.avatar_url {
            driver.avatar_url = Some(avatar_url.clone());
        }
    }
}
