//! Modelo de Trip

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Draft,
    Sent,
    Done,
    Canceled,
}

impl TripStatus {
    pub const ALLOWED: &'static [&'static str] = &["draft", "sent", "done", "canceled"];

    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Draft => "draft",
            TripStatus::Sent => "sent",
            TripStatus::Done => "done",
            TripStatus::Canceled => "canceled",
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, TripStatus::Done | TripStatus::Canceled)
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(TripStatus::Draft),
            "sent" => Ok(TripStatus::Sent),
            "done" => Ok(TripStatus::Done),
            "canceled" => Ok(TripStatus::Canceled),
            _ => Err(ParseEnumError {
                kind: "trip status",
                value: s.to_string(),
                allowed: Self::ALLOWED,
            }),
        }
    }
}

/// Trip - referencia a Vehicle y Driver solo por id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    pub destination: String,
    pub cargo_weight: f64,
    pub status: TripStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
