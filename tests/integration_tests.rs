// Integration tests for the donor match ranker

mod common;

use common::{donor, donor_with_group, ids, FakeRanking, FakeRepository};
use donor_match::core::ranker::{NO_DONORS_INSIGHT, RANKED_INSIGHT, UNAVAILABLE_INSIGHT, UNPARSABLE_INSIGHT};
use donor_match::core::{fallback_rank, DonorMatchRanker, RankError, RankingOutcome, MAX_MATCHES};
use donor_match::models::{BloodGroup, DonorFilter, DonorRecord, MatchQuery, Urgency};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

fn query(blood_group: &str, city: Option<&str>) -> MatchQuery {
    MatchQuery {
        blood_group: blood_group.to_string(),
        city: city.map(String::from),
        urgency: None,
    }
}

fn ranker(repo: &Arc<FakeRepository>, ranking: Option<&Arc<FakeRanking>>) -> DonorMatchRanker {
    DonorMatchRanker::new(
        repo.clone(),
        ranking.map(|r| r.clone() as Arc<dyn donor_match::services::RankingService>),
        Duration::from_millis(200),
    )
}

fn pool(size: usize) -> Vec<DonorRecord> {
    (0..size)
        .map(|i| donor(&format!("d{}", i), if i % 3 == 0 { "Pune" } else { "Nashik" }, (i * 7 % 11) as u32))
        .collect()
}

fn assert_permutation(result: &[DonorRecord], fetched: &[DonorRecord]) {
    let mut got = ids(result);
    let mut expected = ids(fetched);
    got.sort();
    expected.sort();
    assert_eq!(got, expected, "result is not a permutation of the eligible set");
}

#[tokio::test]
async fn test_small_sets_are_fully_covered_on_every_path() {
    for size in 1..=MAX_MATCHES {
        let donors = pool(size);
        let repo = Arc::new(FakeRepository::with_donors(donors.clone()));

        let partial = Arc::new(FakeRanking::rankings(&["d0", "ghost"]));
        let failing = Arc::new(FakeRanking::failing());
        let prose = Arc::new(FakeRanking::replying("No structured answer today."));

        for service in [Some(&partial), Some(&failing), Some(&prose), None] {
            let result = assert_ok!(ranker(&repo, service).rank(&query("O-", Some("Pune"))).await);
            assert_permutation(&result.matches, &donors);
        }
    }
}

#[tokio::test]
async fn test_large_sets_return_ten_unique_eligible_donors() {
    let donors = pool(25);
    let eligible: HashSet<String> = ids(&donors).into_iter().collect();
    let repo = Arc::new(FakeRepository::with_donors(donors));
    let ranking = Arc::new(FakeRanking::rankings(&["d24", "d3", "d24", "d7"]));

    let result = assert_ok!(ranker(&repo, Some(&ranking)).rank(&query("O-", None)).await);

    assert_eq!(result.matches.len(), MAX_MATCHES);
    let unique: HashSet<String> = ids(&result.matches).into_iter().collect();
    assert_eq!(unique.len(), MAX_MATCHES);
    assert!(unique.is_subset(&eligible));
    assert_eq!(&ids(&result.matches)[..3], &["d24", "d3", "d7"]);
}

#[tokio::test]
async fn test_failed_call_matches_deterministic_fallback() {
    let donors = pool(8);
    let repo = Arc::new(FakeRepository::with_donors(donors.clone()));
    let ranking = Arc::new(FakeRanking::failing());

    let result = assert_ok!(ranker(&repo, Some(&ranking)).rank(&query("O-", Some("pune"))).await);

    assert_eq!(ranking.call_count(), 1);
    assert_eq!(result.outcome, RankingOutcome::Unavailable);
    assert_eq!(result.insights, UNAVAILABLE_INSIGHT);
    assert_eq!(result.recommendations, None);
    assert_eq!(ids(&result.matches), ids(&fallback_rank(donors, Some("pune"))));
}

#[tokio::test]
async fn test_timed_out_call_falls_back() {
    let donors = vec![donor("a", "Mumbai", 1), donor("b", "Pune", 0), donor("c", "Mumbai", 6)];
    let repo = Arc::new(FakeRepository::with_donors(donors));
    let ranking = Arc::new(FakeRanking::hanging());

    let result = assert_ok!(ranker(&repo, Some(&ranking)).rank(&query("O-", Some("Pune"))).await);

    assert_eq!(result.outcome, RankingOutcome::Unavailable);
    assert_eq!(ids(&result.matches), vec!["b", "c", "a"]);
}

#[tokio::test]
async fn test_subset_rankings_lead_then_fetch_order() {
    let donors = vec![
        donor("a", "X", 9),
        donor("b", "X", 8),
        donor("c", "X", 7),
        donor("d", "X", 6),
        donor("e", "X", 5),
    ];
    let repo = Arc::new(FakeRepository::with_donors(donors));
    let ranking = Arc::new(FakeRanking::rankings(&["d", "b"]));

    let result = assert_ok!(ranker(&repo, Some(&ranking)).rank(&query("O-", None)).await);

    assert_eq!(result.outcome, RankingOutcome::Ranked);
    assert_eq!(ids(&result.matches), vec!["d", "b", "a", "c", "e"]);
    assert_eq!(result.insights, "Ranked by proximity");
    assert_eq!(result.recommendations.as_deref(), Some("Contact the first three donors"));
}

#[tokio::test]
async fn test_unknown_ids_are_dropped() {
    let donors = vec![donor("a", "X", 1), donor("b", "X", 2)];
    let repo = Arc::new(FakeRepository::with_donors(donors));
    let ranking = Arc::new(FakeRanking::rankings(&["hallucinated", "b", "also-missing"]));

    let result = assert_ok!(ranker(&repo, Some(&ranking)).rank(&query("O-", None)).await);

    assert_eq!(ids(&result.matches), vec!["b", "a"]);
}

#[tokio::test]
async fn test_empty_blood_group_fails_before_any_io() {
    let repo = Arc::new(FakeRepository::with_donors(pool(3)));
    let ranking = Arc::new(FakeRanking::rankings(&["d0"]));

    let err = assert_err!(ranker(&repo, Some(&ranking)).rank(&query("", Some("Pune"))).await);

    assert!(matches!(err, RankError::Validation(_)));
    assert_eq!(repo.fetch_count(), 0);
    assert_eq!(ranking.call_count(), 0);
}

#[tokio::test]
async fn test_unknown_blood_group_fails_validation() {
    let repo = Arc::new(FakeRepository::with_donors(pool(3)));

    let err = assert_err!(ranker(&repo, None).rank(&query("o-", None)).await);

    assert!(matches!(err, RankError::Validation(_)));
    assert_eq!(repo.fetch_count(), 0);
}

#[tokio::test]
async fn test_no_eligible_donors_skips_ranking() {
    let repo = Arc::new(FakeRepository::with_donors(vec![donor_with_group("a", BloodGroup::APositive, "Pune", 3)]));
    let ranking = Arc::new(FakeRanking::rankings(&["a"]));

    let result = assert_ok!(ranker(&repo, Some(&ranking)).rank(&query("O-", Some("Pune"))).await);

    assert!(result.matches.is_empty());
    assert_eq!(result.insights, NO_DONORS_INSIGHT);
    assert_eq!(result.outcome, RankingOutcome::NoDonors);
    assert_eq!(ranking.call_count(), 0);
    assert_eq!(repo.fetch_count(), 1);
}

#[tokio::test]
async fn test_unavailable_donors_are_never_ranked() {
    let mut resting = donor("resting", "Pune", 20);
    resting.available = false;
    let repo = Arc::new(FakeRepository::with_donors(vec![resting, donor("ready", "Pune", 1)]));

    let result = assert_ok!(ranker(&repo, None).rank(&query("O-", None)).await);

    assert_eq!(ids(&result.matches), vec!["ready"]);
}

#[tokio::test]
async fn test_fetch_uses_blood_group_only() {
    let repo = Arc::new(FakeRepository::with_donors(vec![donor("a", "Nagpur", 1)]));

    assert_ok!(ranker(&repo, None).rank(&query("O-", Some("Pune"))).await);

    let filter = repo.last_filter.lock().unwrap().clone();
    assert_eq!(filter, Some(DonorFilter::by_blood_group(BloodGroup::ONegative)));
}

#[tokio::test]
async fn test_repository_failure_is_fatal() {
    let repo = Arc::new(FakeRepository::failing());
    let ranking = Arc::new(FakeRanking::rankings(&["a"]));

    let err = assert_err!(ranker(&repo, Some(&ranking)).rank(&query("O-", None)).await);

    assert!(matches!(err, RankError::UpstreamFetch(_)));
    assert_eq!(ranking.call_count(), 0);
}

#[tokio::test]
async fn test_prose_answer_keeps_fetch_order_and_excerpt() {
    let donors = vec![donor("a", "Mumbai", 1), donor("b", "Pune", 0), donor("c", "Mumbai", 6)];
    let repo = Arc::new(FakeRepository::with_donors(donors));
    let prose = format!("I would suggest calling donor b first because {}", "they live nearby. ".repeat(20));
    let ranking = Arc::new(FakeRanking::replying(prose.clone()));

    let result = assert_ok!(ranker(&repo, Some(&ranking)).rank(&query("O-", Some("Pune"))).await);

    assert_eq!(result.outcome, RankingOutcome::Unparsable);
    assert_eq!(result.insights, UNPARSABLE_INSIGHT);
    let excerpt = result.recommendations.unwrap();
    assert_eq!(excerpt.chars().count(), 200);
    assert!(prose.starts_with(&excerpt));
    assert_eq!(ids(&result.matches), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_empty_rankings_keep_fetch_order() {
    let repo = Arc::new(FakeRepository::with_donors(vec![donor("a", "X", 1), donor("b", "X", 4)]));
    let ranking = Arc::new(FakeRanking::replying(r#"{"rankings": [], "insights": "nothing to say"}"#));

    let result = assert_ok!(ranker(&repo, Some(&ranking)).rank(&query("O-", None)).await);

    assert_eq!(result.outcome, RankingOutcome::Unparsable);
    assert_eq!(ids(&result.matches), vec!["a", "b"]);
}

#[tokio::test]
async fn test_ranked_answer_without_insights_gets_default() {
    let repo = Arc::new(FakeRepository::with_donors(vec![donor("a", "X", 1), donor("b", "X", 4)]));
    let ranking = Arc::new(FakeRanking::replying(r#"{"rankings": ["a", "b"]}"#));

    let result = assert_ok!(ranker(&repo, Some(&ranking)).rank(&query("O-", None)).await);

    assert_eq!(result.insights, RANKED_INSIGHT);
    assert_eq!(ids(&result.matches), vec!["a", "b"]);
}

#[tokio::test]
async fn test_disabled_ranking_uses_fallback() {
    let repo = Arc::new(FakeRepository::with_donors(vec![donor("a", "X", 1), donor("b", "Pune", 0)]));
    let ranker = ranker(&repo, None);

    assert!(!ranker.ranking_enabled());
    let result = assert_ok!(ranker.rank(&query("O-", Some("PUNE"))).await);

    assert_eq!(result.outcome, RankingOutcome::Unavailable);
    assert_eq!(ids(&result.matches), vec!["b", "a"]);
}

#[tokio::test]
async fn test_prompt_carries_query_and_donors() {
    let repo = Arc::new(FakeRepository::with_donors(vec![donor("a", "X", 1)]));
    let ranking = Arc::new(FakeRanking::rankings(&["a"]));

    let mut q = query("O-", None);
    q.urgency = Some(Urgency::High);
    assert_ok!(ranker(&repo, Some(&ranking)).rank(&q).await);

    let prompt = ranking.last_prompt.lock().unwrap().clone().unwrap();
    assert!(prompt.user.contains("Blood group needed: O-"));
    assert!(prompt.user.contains("City: Not specified"));
    assert!(prompt.user.contains("Urgency: high"));
    assert!(prompt.user.contains("\"id\": \"a\""));
}

#[tokio::test]
async fn test_pune_scenario_fallback_ordering() {
    let mut donors = vec![donor("pune-5", "Pune", 5), donor("pune-2", "pune", 2), donor("pune-9", "PUNE", 9)];
    let elsewhere = [3, 8, 1, 7, 4, 6, 0, 10, 2];
    donors.extend(
        elsewhere
            .iter()
            .map(|&count| donor(&format!("mumbai-{}", count), "Mumbai", count)),
    );
    assert_eq!(donors.len(), 12);

    let repo = Arc::new(FakeRepository::with_donors(donors));
    let ranking = Arc::new(FakeRanking::failing());
    let mut q = query("O-", Some("Pune"));
    q.urgency = Some(Urgency::High);

    let result = assert_ok!(ranker(&repo, Some(&ranking)).rank(&q).await);

    let counts: Vec<u32> = result.matches.iter().map(|d| d.total_donations).collect();
    assert_eq!(counts, vec![9, 5, 2, 10, 8, 7, 6, 4, 3, 2]);
    assert_eq!(&ids(&result.matches)[..3], &["pune-9", "pune-5", "pune-2"]);
    assert_eq!(result.matches[9].id, "mumbai-2");
}
