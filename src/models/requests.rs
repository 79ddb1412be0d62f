use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::Urgency;

/// Donor ranking request
///
/// `blood_group` defaults to an empty string when absent so that a missing
/// field surfaces as a validation error rather than a JSON error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct MatchQuery {
    #[validate(length(min = 1, message = "blood_group is required"))]
    #[serde(default, alias = "bloodGroup")]
    pub blood_group: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub urgency: Option<Urgency>,
}

impl MatchQuery {
    /// City hint, with blank values treated as unspecified
    pub fn city_hint(&self) -> Option<&str> {
        self.city
            .as_deref()
            .map(str::trim)
            .filter(|city| !city.is_empty())
    }

    pub fn urgency(&self) -> Urgency {
        self.urgency.unwrap_or_default()
    }
}

/// Query string for the manual donor search
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchDonorsQuery {
    pub blood_group: Option<String>,
    pub city: Option<String>,
    pub pincode: Option<String>,
}

/// Request to open a connection with a donor
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateConnectionRequest {
    #[validate(length(min = 1))]
    pub hospital_id: String,
    #[validate(length(min = 1))]
    pub donor_id: String,
    #[serde(default)]
    pub blood_request_id: Option<String>,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub message: Option<String>,
}

/// Request to accept or reject a connection request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConnectionRequest {
    pub status: String,
}
