use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMaintenanceRequest {
    pub vehicle_id: Uuid,

    #[validate(length(min = 1, max = 2000))]
    pub description: String,

    #[validate(range(min = 0.0))]
    pub cost: f64,
}
