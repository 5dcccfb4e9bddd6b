use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFuelLogRequest {
    pub trip_id: Uuid,

    #[validate(range(min = 0.0))]
    pub fuel_used: f64,

    #[validate(range(min = 0.0))]
    pub fuel_cost: f64,
}
