// Core algorithm exports
pub mod analysis;
pub mod ordering;
pub mod prompt;
pub mod ranker;

pub use analysis::{extract_json_object, parse_analysis, truncate_chars, AnalysisError, RankingAnalysis};
pub use ordering::{fallback_rank, merge_rankings};
pub use prompt::build_prompt;
pub use ranker::{DonorMatchRanker, MatchResult, RankError, RankingOutcome, MAX_MATCHES};
