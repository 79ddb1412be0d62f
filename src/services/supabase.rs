use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;
use crate::models::{ConnectionRequest, ConnectionStatus, DonorFilter, DonorRecord, NewConnectionRequest};
use crate::services::repository::{DonorRepository, RepositoryError};

const DONORS_TABLE: &str = "donors";
const CONNECTION_REQUESTS_TABLE: &str = "donor_connection_requests";

/// Supabase REST (PostgREST) client
///
/// Handles all communication with the hosted database:
/// - Searching available donors
/// - Creating and updating connection requests
pub struct SupabaseClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl SupabaseClient {
    /// Create a new Supabase client
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, RepositoryError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// Build the PostgREST query string for a donor search
    pub fn donor_query(filter: &DonorFilter) -> String {
        let mut params = vec!["select=*".to_string(), "available=eq.true".to_string()];

        if let Some(group) = filter.blood_group {
            params.push(format!("blood_group=eq.{}", urlencoding::encode(group.as_str())));
        }
        if let Some(city) = filter.city.as_deref() {
            params.push(format!("city=ilike.{}", urlencoding::encode(&format!("*{}*", city))));
        }
        if let Some(pincode) = filter.pincode.as_deref() {
            params.push(format!("pincode=eq.{}", urlencoding::encode(pincode)));
        }

        params.join("&")
    }

    async fn ensure_success(response: Response, action: &str) -> Result<Response, RepositoryError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
        tracing::error!("Supabase request failed ({}): {} - {}", action, status, body);
        Err(RepositoryError::ApiError {
            status: status.as_u16(),
            message: format!("Failed to {}: {}", action, status),
        })
    }

    async fn rows(response: Response) -> Result<Vec<Value>, RepositoryError> {
        let json: Value = response.json().await?;
        match json {
            Value::Array(rows) => Ok(rows),
            _ => Err(RepositoryError::InvalidResponse("Expected an array of rows".into())),
        }
    }

    /// Connection requests where `column` equals `value`, newest first
    async fn connection_requests_by(&self, column: &str, value: &str) -> Result<Vec<ConnectionRequest>, RepositoryError> {
        let url = format!(
            "{}?select=*&{}=eq.{}&order=created_at.desc",
            self.table_url(CONNECTION_REQUESTS_TABLE),
            column,
            urlencoding::encode(value)
        );

        let response = self.authorized(self.client.get(&url)).send().await?;
        let response = Self::ensure_success(response, "fetch connection requests").await?;

        Self::rows(response)
            .await?
            .into_iter()
            .map(Self::parse_connection_request)
            .collect()
    }

    fn parse_connection_request(row: Value) -> Result<ConnectionRequest, RepositoryError> {
        serde_json::from_value(row)
            .map_err(|e| RepositoryError::InvalidResponse(format!("Failed to parse connection request: {}", e)))
    }
}

#[async_trait]
impl DonorRepository for SupabaseClient {
    async fn fetch_available_donors(&self, filter: &DonorFilter) -> Result<Vec<DonorRecord>, RepositoryError> {
        let url = format!("{}?{}", self.table_url(DONORS_TABLE), Self::donor_query(filter));

        tracing::debug!("Fetching donors from: {}", url);

        let response = self.authorized(self.client.get(&url)).send().await?;
        let response = Self::ensure_success(response, "fetch donors").await?;
        let rows = Self::rows(response).await?;
        let total = rows.len();

        let donors: Vec<DonorRecord> = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<DonorRecord>(row) {
                Ok(donor) => Some(donor),
                Err(e) => {
                    tracing::warn!("Skipping malformed donor row: {}", e);
                    None
                }
            })
            .filter(|donor| donor.available)
            .collect();

        tracing::debug!("Fetched {} donors ({} rows)", donors.len(), total);

        Ok(donors)
    }

    async fn create_connection_request(
        &self,
        request: &NewConnectionRequest,
    ) -> Result<ConnectionRequest, RepositoryError> {
        let response = self
            .authorized(self.client.post(self.table_url(CONNECTION_REQUESTS_TABLE)))
            .header("Prefer", "return=representation")
            .json(request)
            .send()
            .await?;

        let response = Self::ensure_success(response, "create connection request").await?;
        let row = Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::InvalidResponse("Insert returned no rows".into()))?;

        let created = Self::parse_connection_request(row)?;
        tracing::debug!("Created connection request {} ({} -> {})", created.id, created.hospital_id, created.donor_id);

        Ok(created)
    }

    async fn connection_requests_for_donor(&self, donor_id: &str) -> Result<Vec<ConnectionRequest>, RepositoryError> {
        self.connection_requests_by("donor_id", donor_id).await
    }

    async fn connection_requests_for_hospital(
        &self,
        hospital_id: &str,
    ) -> Result<Vec<ConnectionRequest>, RepositoryError> {
        self.connection_requests_by("hospital_id", hospital_id).await
    }

    async fn update_connection_status(
        &self,
        request_id: &str,
        status: ConnectionStatus,
    ) -> Result<ConnectionRequest, RepositoryError> {
        let url = format!(
            "{}?id=eq.{}",
            self.table_url(CONNECTION_REQUESTS_TABLE),
            urlencoding::encode(request_id)
        );

        let payload = serde_json::json!({
            "status": status,
            "updated_at": chrono::Utc::now(),
        });

        let response = self
            .authorized(self.client.patch(&url))
            .header("Prefer", "return=representation")
            .json(&payload)
            .send()
            .await?;

        let response = Self::ensure_success(response, "update connection request").await?;
        let row = Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::NotFound(format!("Connection request {}", request_id)))?;

        Self::parse_connection_request(row)
    }

    async fn health_check(&self) -> Result<bool, RepositoryError> {
        let url = format!("{}?select=id&limit=1", self.table_url(DONORS_TABLE));
        let response = self.authorized(self.client.get(&url)).send().await?;
        Ok(response.status().is_success())
    }
}
