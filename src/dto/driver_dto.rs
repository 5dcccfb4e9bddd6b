use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDriverRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(min = 1, max = 50))]
    pub license_number: String,

    pub license_expiry_date: NaiveDate,

    #[validate(range(min = 0.0, max = 100.0))]
    pub safety_score: Option<f64>,

    pub duty_status: Option<String>,

    #[validate(url)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateDriverRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub license_number: Option<String>,

    pub license_expiry_date: Option<NaiveDate>,

    #[validate(range(min = 0.0, max = 100.0))]
    pub safety_score: Option<f64>,

    pub duty_status: Option<String>,

    #[validate(url)]
    pub avatar_url: Option<String>,
}
