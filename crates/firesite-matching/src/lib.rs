//! Forest-name entity resolution.
//!
//! Normalizes inconsistently spelled forest names from independent sources,
//! scores their similarity, and assigns per-source records (facility rows,
//! closure notices) to a canonical forest-name universe.

pub mod attributes;
pub mod fuzzy;
pub mod normalize;
pub mod resolver;
pub mod types;

pub use attributes::{
    classify_closures, ClosureImpact, ClosureImpactClassifier, ClosureNotice, ClosureNotices,
    ForestFacilities, ImpactLevel, MergeAttributes,
};
pub use fuzzy::{
    best_match, has_directional_conflict, significant_tokens, similarity, FuzzyCandidate,
    STOP_WORDS,
};
pub use normalize::{normalize_name, CanonicalName};
pub use resolver::resolve;
pub use types::{
    Assignment, FuzzyMatchRecord, MatchProfile, MatchResult, MatchType, Resolution,
    ResolutionDiagnostics, CLOSURE_MATCH_THRESHOLD, FACILITY_MATCH_THRESHOLD,
};
