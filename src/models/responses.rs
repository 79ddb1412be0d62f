use serde::{Deserialize, Serialize};
use crate::models::domain::{ConnectionRequest, DonorRecord};

/// Response for the match-donors endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchDonorsResponse {
    pub matches: Vec<DonorRecord>,
    pub insights: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<String>,
}

/// Response for the manual donor search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDonorsResponse {
    pub donors: Vec<DonorRecord>,
    pub total: usize,
}

/// Connection requests addressed to one donor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRequestsResponse {
    pub requests: Vec<ConnectionRequest>,
    pub total: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>, status_code: u16) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status_code,
        }
    }
}
