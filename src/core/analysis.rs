use serde_json::{Map, Value};
use thiserror::Error;

/// Why a completion could not be used as a ranking
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("no JSON object found in completion")]
    NoObject,

    #[error("\"rankings\" is missing or not a list")]
    MissingRankings,

    #[error("\"rankings\" contains no donor ids")]
    EmptyRankings,
}

/// Structured answer embedded in a ranking completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingAnalysis {
    /// Donor ids, best first. May reference ids that were never fetched.
    pub rankings: Vec<String>,
    pub insights: Option<String>,
    pub recommendations: Option<String>,
}

/// Byte ranges of every balanced `{...}` in `bytes`, ordered by start
///
/// One pass with a stack of open braces. Quotes only open string literals
/// while some brace is open, so braces inside strings do not count and
/// quotes in surrounding prose are ignored.
fn balanced_spans(bytes: &[u8]) -> Vec<(usize, usize)> {
    let mut open: Vec<usize> = Vec::new();
    let mut spans = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' if !open.is_empty() => in_string = true,
            b'{' => open.push(offset),
            b'}' => {
                if let Some(start) = open.pop() {
                    spans.push((start, offset));
                }
            }
            _ => {}
        }
    }

    spans.sort_unstable_by_key(|&(start, _)| start);
    spans
}

/// Find the first balanced `{...}` substring of `text` that parses as a
/// JSON object
///
/// Completions are untrusted and often wrap the object in prose or a
/// markdown fence, so candidates are tried left to right. They are all
/// found in a single pass over `text`.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    balanced_spans(text.as_bytes())
        .into_iter()
        .find_map(|(start, end)| match serde_json::from_str::<Value>(&text[start..=end]) {
            Ok(Value::Object(object)) => Some(object),
            _ => None,
        })
}

fn non_empty_string(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
}

/// Parse a completion into a ranking analysis
pub fn parse_analysis(text: &str) -> Result<RankingAnalysis, AnalysisError> {
    let object = extract_json_object(text).ok_or(AnalysisError::NoObject)?;

    let rankings: Vec<String> = match object.get("rankings") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect(),
        _ => return Err(AnalysisError::MissingRankings),
    };

    if rankings.is_empty() {
        return Err(AnalysisError::EmptyRankings);
    }

    Ok(RankingAnalysis {
        rankings,
        insights: non_empty_string(&object, "insights"),
        recommendations: non_empty_string(&object, "recommendations"),
    })
}

/// First `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
