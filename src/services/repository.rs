use async_trait::async_trait;
use thiserror::Error;
use crate::models::{ConnectionRequest, ConnectionStatus, DonorFilter, DonorRecord, NewConnectionRequest};

/// Errors that can occur when talking to the donor store
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Read/write access to donors and connection requests
///
/// Handed to the ranker and the HTTP handlers as `Arc<dyn DonorRepository>`
/// so tests can substitute an in-memory fake.
#[async_trait]
pub trait DonorRepository: Send + Sync {
    /// Donors flagged available, narrowed by the filter, in store order
    async fn fetch_available_donors(&self, filter: &DonorFilter) -> Result<Vec<DonorRecord>, RepositoryError>;

    async fn create_connection_request(
        &self,
        request: &NewConnectionRequest,
    ) -> Result<ConnectionRequest, RepositoryError>;

    /// Newest first
    async fn connection_requests_for_donor(&self, donor_id: &str) -> Result<Vec<ConnectionRequest>, RepositoryError>;

    /// Requests a hospital has sent, newest first
    async fn connection_requests_for_hospital(
        &self,
        hospital_id: &str,
    ) -> Result<Vec<ConnectionRequest>, RepositoryError>;

    async fn update_connection_status(
        &self,
        request_id: &str,
        status: ConnectionStatus,
    ) -> Result<ConnectionRequest, RepositoryError>;

    async fn health_check(&self) -> Result<bool, RepositoryError>;
}
