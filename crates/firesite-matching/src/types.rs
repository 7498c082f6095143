//! Result types produced by entity resolution.

use std::collections::BTreeMap;

use serde::Serialize;

/// Acceptance threshold for facility-directory name matching.
pub const FACILITY_MATCH_THRESHOLD: f64 = 0.62;
/// Acceptance threshold for closure-notice matching; notice hints are noisier free text.
pub const CLOSURE_MATCH_THRESHOLD: f64 = 0.68;

/// Which dataset is being joined, selecting the fuzzy acceptance threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchProfile {
    Facilities,
    Closures,
}

impl MatchProfile {
    #[must_use]
    pub fn threshold(self) -> f64 {
        match self {
            MatchProfile::Facilities => FACILITY_MATCH_THRESHOLD,
            MatchProfile::Closures => CLOSURE_MATCH_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
    Exact,
    Fuzzy,
    Unmatched,
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            MatchType::Exact => "exact",
            MatchType::Fuzzy => "fuzzy",
            MatchType::Unmatched => "unmatched",
        })
    }
}

/// Outcome of matching one source name.
///
/// `score` is `Some(1.0)` for exact matches, the accepted score for fuzzy
/// matches, the best rejected score for unmatched names that had candidates,
/// and `None` only when there was nothing left to compare against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub match_type: MatchType,
    pub matched_name: Option<String>,
    pub score: Option<f64>,
}

impl MatchResult {
    #[must_use]
    pub fn exact(matched_name: &str) -> Self {
        Self {
            match_type: MatchType::Exact,
            matched_name: Some(matched_name.to_string()),
            score: Some(1.0),
        }
    }

    #[must_use]
    pub fn fuzzy(matched_name: &str, score: f64) -> Self {
        Self {
            match_type: MatchType::Fuzzy,
            matched_name: Some(matched_name.to_string()),
            score: Some(score),
        }
    }

    #[must_use]
    pub fn unmatched(best_rejected_score: Option<f64>) -> Self {
        Self {
            match_type: MatchType::Unmatched,
            matched_name: None,
            score: best_rejected_score,
        }
    }
}

/// A source name's match plus the attributes merged from every consumed target.
///
/// `attributes` is `None` for unmatched names: "never determined" rather than
/// "known absent".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment<A> {
    pub source_name: String,
    pub result: MatchResult,
    /// Every target row consumed by this source, sorted.
    pub matched_names: Vec<String>,
    pub attributes: Option<A>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuzzyMatchRecord {
    pub source_name: String,
    pub target_name: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolutionDiagnostics {
    /// Target names never referenced by any source name.
    pub unconsumed_targets: Vec<String>,
    /// Accepted fuzzy matches, for user-facing transparency warnings.
    pub fuzzy_matches: Vec<FuzzyMatchRecord>,
    pub unmatched_sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution<A> {
    pub assignments: BTreeMap<String, Assignment<A>>,
    pub diagnostics: ResolutionDiagnostics,
}
