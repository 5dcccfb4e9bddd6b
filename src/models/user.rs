//! Modelo de User
//!
//! Usuarios del panel y los roles que gobiernan el acceso a cada operación.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ParseEnumError;

/// Roles del sistema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Fleet Manager")]
    FleetManager,
    #[serde(rename = "Dispatcher")]
    Dispatcher,
    #[serde(rename = "Safety Officer")]
    SafetyOfficer,
    #[serde(rename = "Financial Analyst")]
    FinancialAnalyst,
}

impl Role {
    pub const ALL: &'static [Role] = &[
        Role::FleetManager,
        Role::Dispatcher,
        Role::SafetyOfficer,
        Role::FinancialAnalyst,
    ];

    pub const ALLOWED: &'static [&'static str] =
        &["Fleet Manager", "Dispatcher", "Safety Officer", "Financial Analyst"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::FleetManager => "Fleet Manager",
            Role::Dispatcher => "Dispatcher",
            Role::SafetyOfficer => "Safety Officer",
            Role::FinancialAnalyst => "Financial Analyst",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == s.trim())
            .ok_or_else(|| ParseEnumError {
                kind: "role",
                value: s.to_string(),
                allowed: Self::ALLOWED,
            })
    }
}

/// User - mapea a la tabla users
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Response de usuario para la API (sin hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            is_active: user.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_labels_round_trip_through_serde() {
        let json = serde_json::to_string(&Role::SafetyOfficer).unwrap();
        assert_eq!(json, "\"Safety Officer\"");
        assert_eq!("Financial Analyst".parse::<Role>(), Ok(Role::FinancialAnalyst));
        assert!("Admin".parse::<Role>().is_err());
    }
}
