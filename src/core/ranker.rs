use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use validator::Validate;
use crate::core::{
    analysis::{parse_analysis, truncate_chars},
    ordering::{fallback_rank, merge_rankings},
    prompt::build_prompt,
};
use crate::models::{BloodGroup, DonorFilter, DonorRecord, MatchQuery, Urgency};
use crate::services::{DonorRepository, RankingService, RankingServiceError, RepositoryError};

/// Upper bound on returned matches
pub const MAX_MATCHES: usize = 10;

/// Raw completion text kept when the structured answer is unusable
pub const MAX_EXCERPT_CHARS: usize = 200;

pub const NO_DONORS_INSIGHT: &str = "No donors found matching the criteria";
pub const UNAVAILABLE_INSIGHT: &str =
    "Showing top donors based on location and experience (AI analysis unavailable)";
pub const UNPARSABLE_INSIGHT: &str = "AI provided textual analysis. Using default ranking.";
pub const RANKED_INSIGHT: &str = "AI analysis complete";

/// Failures that reach the caller
///
/// Ranking-service failures are not in here: they degrade to the
/// deterministic ordering instead.
#[derive(Debug, Error)]
pub enum RankError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Failed to fetch donors: {0}")]
    UpstreamFetch(#[from] RepositoryError),
}

/// Which path produced the ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingOutcome {
    /// Nothing matched; the ranking service was not called
    NoDonors,
    /// Ordered by the service's rankings
    Ranked,
    /// The service answered but its payload had no usable rankings
    Unparsable,
    /// The service failed, timed out, or is disabled
    Unavailable,
}

impl RankingOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankingOutcome::NoDonors => "no_donors",
            RankingOutcome::Ranked => "ranked",
            RankingOutcome::Unparsable => "unparsable",
            RankingOutcome::Unavailable => "unavailable",
        }
    }
}

/// Result of one ranking request
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub matches: Vec<DonorRecord>,
    pub insights: String,
    pub recommendations: Option<String>,
    pub outcome: RankingOutcome,
}

impl MatchResult {
    pub fn no_donors() -> Self {
        Self {
            matches: Vec::new(),
            insights: NO_DONORS_INSIGHT.to_string(),
            recommendations: None,
            outcome: RankingOutcome::NoDonors,
        }
    }

    /// Deterministic ordering with the "unavailable" insight
    pub fn fallback(donors: Vec<DonorRecord>, city: Option<&str>) -> Self {
        Self {
            matches: fallback_rank(donors, city),
            insights: UNAVAILABLE_INSIGHT.to_string(),
            recommendations: None,
            outcome: RankingOutcome::Unavailable,
        }
    }

    /// Turn a completion into an ordering
    ///
    /// An unusable completion keeps the donors in fetch order.
    pub fn from_completion(donors: Vec<DonorRecord>, completion: &str) -> Self {
        match parse_analysis(completion) {
            Ok(analysis) => Self {
                matches: merge_rankings(donors, &analysis.rankings),
                insights: analysis.insights.unwrap_or_else(|| RANKED_INSIGHT.to_string()),
                recommendations: analysis.recommendations,
                outcome: RankingOutcome::Ranked,
            },
            Err(e) => {
                tracing::warn!("Ranking completion unusable ({}), keeping fetch order", e);
                let excerpt = truncate_chars(completion.trim(), MAX_EXCERPT_CHARS);
                Self {
                    matches: donors,
                    insights: UNPARSABLE_INSIGHT.to_string(),
                    recommendations: Some(excerpt).filter(|text| !text.is_empty()),
                    outcome: RankingOutcome::Unparsable,
                }
            }
        }
    }

    fn truncated(mut self) -> Self {
        self.matches.truncate(MAX_MATCHES);
        self
    }
}

/// Ranks available donors for a blood request
///
/// Stateless per request: one repository read, then at most one bounded
/// ranking call. Collaborators are injected so the ranker can run against
/// fakes.
#[derive(Clone)]
pub struct DonorMatchRanker {
    repository: Arc<dyn DonorRepository>,
    ranking: Option<Arc<dyn RankingService>>,
    timeout: Duration,
}

impl DonorMatchRanker {
    pub fn new(
        repository: Arc<dyn DonorRepository>,
        ranking: Option<Arc<dyn RankingService>>,
        timeout: Duration,
    ) -> Self {
        Self {
            repository,
            ranking,
            timeout,
        }
    }

    pub fn ranking_enabled(&self) -> bool {
        self.ranking.is_some()
    }

    /// Rank eligible donors for `query`
    ///
    /// Fails only on validation (before any I/O) or when the donor fetch
    /// fails. Whatever the ranking service does, the result holds at most
    /// `MAX_MATCHES` unique donors drawn from the fetched set.
    pub async fn rank(&self, query: &MatchQuery) -> Result<MatchResult, RankError> {
        query
            .validate()
            .map_err(|e| RankError::Validation(e.to_string()))?;
        let blood_group = query
            .blood_group
            .parse::<BloodGroup>()
            .map_err(|e| RankError::Validation(e.to_string()))?;
        let city = query.city_hint();
        let urgency = query.urgency();

        tracing::info!(
            "Ranking donors: blood_group={}, city={:?}, urgency={}",
            blood_group,
            city,
            urgency.as_str()
        );

        let donors: Vec<DonorRecord> = self
            .repository
            .fetch_available_donors(&DonorFilter::by_blood_group(blood_group))
            .await?
            .into_iter()
            .filter(|donor| donor.available && donor.blood_group == blood_group)
            .collect();

        if donors.is_empty() {
            tracing::info!("No available {} donors", blood_group);
            return Ok(MatchResult::no_donors());
        }

        let fetched = donors.len();
        let result = self.order(donors, blood_group, city, urgency).await.truncated();

        tracing::info!(
            "Returning {} of {} donors (ranking: {})",
            result.matches.len(),
            fetched,
            result.outcome.as_str()
        );

        Ok(result)
    }

    async fn order(
        &self,
        donors: Vec<DonorRecord>,
        blood_group: BloodGroup,
        city: Option<&str>,
        urgency: Urgency,
    ) -> MatchResult {
        let Some(service) = self.ranking.as_ref() else {
            tracing::debug!("Ranking service disabled, using deterministic ordering");
            return MatchResult::fallback(donors, city);
        };

        let prompt = match build_prompt(blood_group, city, urgency, &donors) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::warn!("Failed to serialize donors for ranking: {}", e);
                return MatchResult::fallback(donors, city);
            }
        };

        let completion = match tokio::time::timeout(self.timeout, service.complete(&prompt)).await {
            Ok(result) => result,
            Err(_) => Err(RankingServiceError::Timeout(self.timeout)),
        };

        match completion {
            Ok(text) => MatchResult::from_completion(donors, &text),
            Err(e) => {
                tracing::warn!("Ranking service {} unavailable: {}", service.name(), e);
                MatchResult::fallback(donors, city)
            }
        }
    }
}
