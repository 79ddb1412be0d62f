// Shared fakes for crate-level tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use donor_match::models::{
    BloodGroup, ConnectionRequest, ConnectionStatus, DonorFilter, DonorRecord, NewConnectionRequest,
};
use donor_match::services::{DonorRepository, Prompt, RankingService, RankingServiceError, RepositoryError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn donor(id: &str, city: &str, total_donations: u32) -> DonorRecord {
    donor_with_group(id, BloodGroup::ONegative, city, total_donations)
}

pub fn donor_with_group(id: &str, blood_group: BloodGroup, city: &str, total_donations: u32) -> DonorRecord {
    DonorRecord {
        id: id.to_string(),
        user_id: None,
        name: format!("Donor {}", id),
        blood_group,
        city: city.to_string(),
        pincode: Some("411001".to_string()),
        phone: None,
        available: true,
        total_donations,
        age: None,
        gender: None,
        last_donation_date: None,
    }
}

pub fn ids(donors: &[DonorRecord]) -> Vec<String> {
    donors.iter().map(|d| d.id.clone()).collect()
}

/// In-memory donor store that records how it was called
#[derive(Default)]
pub struct FakeRepository {
    donors: Vec<DonorRecord>,
    fail: bool,
    pub fetches: AtomicUsize,
    pub last_filter: Mutex<Option<DonorFilter>>,
    pub requests: Mutex<Vec<ConnectionRequest>>,
}

impl FakeRepository {
    pub fn with_donors(donors: Vec<DonorRecord>) -> Self {
        Self {
            donors,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.fail {
            return Err(RepositoryError::ApiError {
                status: 503,
                message: "store unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DonorRepository for FakeRepository {
    async fn fetch_available_donors(&self, filter: &DonorFilter) -> Result<Vec<DonorRecord>, RepositoryError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        *self.last_filter.lock().unwrap() = Some(filter.clone());
        self.check()?;

        Ok(self
            .donors
            .iter()
            .filter(|d| d.available)
            .filter(|d| filter.blood_group.map_or(true, |g| d.blood_group == g))
            .filter(|d| {
                filter
                    .city
                    .as_deref()
                    .map_or(true, |c| d.city.to_lowercase().contains(&c.to_lowercase()))
            })
            .filter(|d| filter.pincode.as_deref().map_or(true, |p| d.pincode.as_deref() == Some(p)))
            .cloned()
            .collect())
    }

    async fn create_connection_request(
        &self,
        request: &NewConnectionRequest,
    ) -> Result<ConnectionRequest, RepositoryError> {
        self.check()?;
        let now = Utc::now();
        let created = ConnectionRequest {
            id: uuid::Uuid::new_v4().to_string(),
            hospital_id: request.hospital_id.clone(),
            donor_id: request.donor_id.clone(),
            blood_request_id: request.blood_request_id.clone(),
            message: request.message.clone(),
            status: request.status,
            created_at: now,
            updated_at: now,
        };
        self.requests.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn connection_requests_for_donor(&self, donor_id: &str) -> Result<Vec<ConnectionRequest>, RepositoryError> {
        self.check()?;
        let mut found: Vec<ConnectionRequest> = self
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.donor_id == donor_id)
            .cloned()
            .collect();
        found.reverse();
        Ok(found)
    }

    async fn connection_requests_for_hospital(
        &self,
        hospital_id: &str,
    ) -> Result<Vec<ConnectionRequest>, RepositoryError> {
        self.check()?;
        let mut found: Vec<ConnectionRequest> = self
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.hospital_id == hospital_id)
            .cloned()
            .collect();
        found.reverse();
        Ok(found)
    }

    async fn update_connection_status(
        &self,
        request_id: &str,
        status: ConnectionStatus,
    ) -> Result<ConnectionRequest, RepositoryError> {
        self.check()?;
        let mut requests = self.requests.lock().unwrap();
        let request = requests
            .iter_mut()
            .find(|r| r.id == request_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("Connection request {}", request_id)))?;
        request.status = status;
        request.updated_at = Utc::now();
        Ok(request.clone())
    }

    async fn health_check(&self) -> Result<bool, RepositoryError> {
        Ok(!self.fail)
    }
}

/// How the fake ranking service answers
pub enum Reply {
    Text(String),
    Fail,
    Hang,
}

/// Scripted ranking service
pub struct FakeRanking {
    reply: Reply,
    pub calls: AtomicUsize,
    pub last_prompt: Mutex<Option<Prompt>>,
}

impl FakeRanking {
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(Reply::Text(text.into()))
    }

    pub fn rankings(ids: &[&str]) -> Self {
        let body = serde_json::json!({
            "rankings": ids,
            "insights": "Ranked by proximity",
            "recommendations": "Contact the first three donors"
        });
        Self::replying(format!("Here you go:\n```json\n{}\n```", body))
    }

    pub fn failing() -> Self {
        Self::new(Reply::Fail)
    }

    pub fn hanging() -> Self {
        Self::new(Reply::Hang)
    }

    fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RankingService for FakeRanking {
    async fn complete(&self, prompt: &Prompt) -> Result<String, RankingServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.clone());

        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail => Err(RankingServiceError::ApiError {
                status: 502,
                body: "bad gateway".to_string(),
            }),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(r#"{"rankings": []}"#.to_string())
            }
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}
