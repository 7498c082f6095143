//! Token-based similarity scoring between forest names.
//!
//! Names are compared on their *significant* tokens: at least three characters
//! long and not one of the generic geography/administrative [`STOP_WORDS`].
//! Each token is paired with its closest counterpart in the other name
//! (Jaro-Winkler); pairs below [`TOKEN_MATCH_FLOOR`] count as zero, so tokens
//! present in only one name drag the score down.

use crate::normalize::normalize_name;

/// Generic terms that carry no forest identity.
pub const STOP_WORDS: &[&str] = &[
    "and",
    "area",
    "conservation",
    "flora",
    "forest",
    "forests",
    "national",
    "nature",
    "nsw",
    "park",
    "plantation",
    "plantations",
    "regional",
    "reserve",
    "state",
    "the",
];

/// Minimum per-token similarity for two tokens to be considered the same word.
pub const TOKEN_MATCH_FLOOR: f64 = 0.85;

const MIN_SIGNIFICANT_LEN: usize = 3;

const OPPOSING_DIRECTIONS: &[(&str, &str)] = &[("east", "west"), ("north", "south")];

/// Best candidate returned by [`best_match`].
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyCandidate {
    pub name: String,
    pub score: f64,
}

/// Returns the significant tokens of `text`, in order, without duplicates.
#[must_use]
pub fn significant_tokens(text: &str) -> Vec<String> {
    let key = normalize_name(text);
    let mut tokens: Vec<String> = Vec::new();
    for token in key.split_whitespace() {
        if token.chars().count() < MIN_SIGNIFICANT_LEN || STOP_WORDS.contains(&token) {
            continue;
        }
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

/// Scores the similarity of two names in `[0, 1]`.
///
/// Identical comparison keys score `1.0`. When neither name has a significant
/// token the whole keys are compared directly; when only one side does, the
/// names share nothing meaningful and score `0.0`.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    let key_a = normalize_name(a);
    let key_b = normalize_name(b);
    if key_a == key_b {
        return 1.0;
    }

    let tokens_a = significant_tokens(&key_a);
    let tokens_b = significant_tokens(&key_b);

    match (tokens_a.is_empty(), tokens_b.is_empty()) {
        (true, true) => strsim::jaro_winkler(&key_a, &key_b).clamp(0.0, 1.0),
        (true, false) | (false, true) => 0.0,
        (false, false) => {
            let covered = coverage(&tokens_a, &tokens_b) + coverage(&tokens_b, &tokens_a);
            #[allow(clippy::cast_precision_loss)]
            let total = (tokens_a.len() + tokens_b.len()) as f64;
            (covered / total).clamp(0.0, 1.0)
        }
    }
}

fn coverage(from: &[String], to: &[String]) -> f64 {
    from.iter()
        .map(|token| {
            let best = to
                .iter()
                .map(|other| strsim::jaro_winkler(token, other))
                .fold(0.0_f64, f64::max);
            if best >= TOKEN_MATCH_FLOOR {
                best
            } else {
                0.0
            }
        })
        .sum()
}

/// Picks the highest-scoring candidate for `source`.
///
/// Returns `None` only when `candidates` is empty. Equal scores resolve to the
/// lexicographically smallest candidate name so results are reproducible.
#[must_use]
pub fn best_match<S: AsRef<str>>(source: &str, candidates: &[S]) -> Option<FuzzyCandidate> {
    let mut sorted: Vec<&str> = candidates.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();
    sorted.dedup();

    let mut best: Option<FuzzyCandidate> = None;
    for candidate in sorted {
        let score = similarity(source, candidate);
        let better = best.as_ref().is_none_or(|current| score > current.score);
        if better {
            best = Some(FuzzyCandidate {
                name: candidate.to_string(),
                score,
            });
        }
    }
    best
}

/// Returns `true` when one name carries a compass term and the other carries
/// its opposite ("X East" vs "X West").
#[must_use]
pub fn has_directional_conflict(a: &str, b: &str) -> bool {
    let key_a = normalize_name(a);
    let key_b = normalize_name(b);
    let has = |key: &str, word: &str| key.split_whitespace().any(|t| t == word);

    OPPOSING_DIRECTIONS.iter().any(|(first, second)| {
        (has(&key_a, first) && has(&key_b, second) && !has(&key_a, second))
            || (has(&key_a, second) && has(&key_b, first) && !has(&key_a, first))
    })
}
