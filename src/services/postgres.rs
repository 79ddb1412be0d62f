use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use crate::models::{BloodGroup, ConnectionRequest, ConnectionStatus, DonorFilter, DonorRecord, NewConnectionRequest};
use crate::services::repository::{DonorRepository, RepositoryError};

const DONOR_COLUMNS: &str = r#"
    id::text AS id,
    user_id::text AS user_id,
    name,
    blood_group::text AS blood_group,
    city,
    pincode,
    phone,
    available,
    total_donations,
    age,
    gender,
    last_donation_date::timestamptz AS last_donation_date
"#;

const CONNECTION_COLUMNS: &str = r#"
    id::text AS id,
    hospital_id::text AS hospital_id,
    donor_id::text AS donor_id,
    blood_request_id::text AS blood_request_id,
    message,
    status,
    created_at,
    updated_at
"#;

/// Direct PostgreSQL access to the donor schema
///
/// Alternative to the REST client for deployments that can reach the
/// database directly. The schema itself is owned by the hosted store;
/// no migrations are run from here.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Create a new repository from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create a new repository from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, RepositoryError> {
        tracing::info!("Connecting to PostgreSQL donor store");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    fn donor_from_row(row: &PgRow) -> Result<DonorRecord, RepositoryError> {
        let blood_group: String = row.try_get("blood_group")?;
        let blood_group = blood_group
            .parse::<BloodGroup>()
            .map_err(|e| RepositoryError::InvalidResponse(e.to_string()))?;
        let total_donations: i32 = row.try_get("total_donations")?;
        let age: Option<i32> = row.try_get("age")?;

        Ok(DonorRecord {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            name: row.try_get("name")?,
            blood_group,
            city: row.try_get("city")?,
            pincode: row.try_get("pincode")?,
            phone: row.try_get("phone")?,
            available: row.try_get("available")?,
            total_donations: total_donations.max(0) as u32,
            age: age.map(|age| age.max(0) as u32),
            gender: row.try_get("gender")?,
            last_donation_date: row.try_get("last_donation_date")?,
        })
    }

    fn connection_from_row(row: &PgRow) -> Result<ConnectionRequest, RepositoryError> {
        let status: String = row.try_get("status")?;
        let status = ConnectionStatus::parse(&status)
            .ok_or_else(|| RepositoryError::InvalidResponse(format!("Unknown connection status: {}", status)))?;

        Ok(ConnectionRequest {
            id: row.try_get("id")?,
            hospital_id: row.try_get("hospital_id")?,
            donor_id: row.try_get("donor_id")?,
            blood_request_id: row.try_get("blood_request_id")?,
            message: row.try_get("message")?,
            status,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl DonorRepository for PostgresRepository {
    async fn fetch_available_donors(&self, filter: &DonorFilter) -> Result<Vec<DonorRecord>, RepositoryError> {
        let query = format!(
            r#"
            SELECT {DONOR_COLUMNS}
            FROM donors
            WHERE available = true
              AND ($1::text IS NULL OR blood_group::text = $1)
              AND ($2::text IS NULL OR city ILIKE '%' || $2 || '%')
              AND ($3::text IS NULL OR pincode = $3)
            "#
        );

        let rows = sqlx::query(&query)
            .bind(filter.blood_group.map(|group| group.as_str()))
            .bind(filter.city.as_deref())
            .bind(filter.pincode.as_deref())
            .fetch_all(&self.pool)
            .await?;

        let donors = rows
            .iter()
            .map(Self::donor_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Fetched {} available donors", donors.len());

        Ok(donors)
    }

    async fn create_connection_request(
        &self,
        request: &NewConnectionRequest,
    ) -> Result<ConnectionRequest, RepositoryError> {
        let query = format!(
            r#"
            INSERT INTO donor_connection_requests (hospital_id, donor_id, blood_request_id, message, status)
            VALUES ($1::uuid, $2::uuid, $3::uuid, $4, $5)
            RETURNING {CONNECTION_COLUMNS}
            "#
        );

        let row = sqlx::query(&query)
            .bind(&request.hospital_id)
            .bind(&request.donor_id)
            .bind(request.blood_request_id.as_deref())
            .bind(request.message.as_deref())
            .bind(request.status.as_str())
            .fetch_one(&self.pool)
            .await?;

        Self::connection_from_row(&row)
    }

    async fn connection_requests_for_donor(&self, donor_id: &str) -> Result<Vec<ConnectionRequest>, RepositoryError> {
        let query = format!(
            r#"
            SELECT {CONNECTION_COLUMNS}
            FROM donor_connection_requests
            WHERE donor_id = $1::uuid
            ORDER BY created_at DESC
            "#
        );

        let rows = sqlx::query(&query).bind(donor_id).fetch_all(&self.pool).await?;

        rows.iter().map(Self::connection_from_row).collect()
    }

    async fn connection_requests_for_hospital(
        &self,
        hospital_id: &str,
    ) -> Result<Vec<ConnectionRequest>, RepositoryError> {
        let query = format!(
            r#"
            SELECT {CONNECTION_COLUMNS}
            FROM donor_connection_requests
            WHERE hospital_id = $1::uuid
            ORDER BY created_at DESC
            "#
        );

        let rows = sqlx::query(&query).bind(hospital_id).fetch_all(&self.pool).await?;

        rows.iter().map(Self::connection_from_row).collect()
    }

    async fn update_connection_status(
        &self,
        request_id: &str,
        status: ConnectionStatus,
    ) -> Result<ConnectionRequest, RepositoryError> {
        let query = format!(
            r#"
            UPDATE donor_connection_requests
            SET status = $2, updated_at = NOW()
            WHERE id = $1::uuid
            RETURNING {CONNECTION_COLUMNS}
            "#
        );

        let row = sqlx::query(&query)
            .bind(request_id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Connection request {}", request_id)))?;

        tracing::info!("Connection request {} marked {}", request_id, status.as_str());

        Self::connection_from_row(&row)
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, RepositoryError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
