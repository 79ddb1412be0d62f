//! Donor Match - ranking service for hospitals looking for blood donors
//!
//! Fetches available donors for a blood group, asks an external
//! text-completion service to order them, and falls back to a deterministic
//! city/experience ordering whenever that answer is missing or unusable.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{DonorMatchRanker, MatchResult, RankError, RankingOutcome, fallback_rank, merge_rankings};
pub use models::{BloodGroup, DonorRecord, MatchQuery, Urgency, MatchDonorsResponse};
