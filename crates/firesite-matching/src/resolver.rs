//! Two-pass entity resolution of source names against a target universe.
//!
//! 1. **Exact pass**: source and target names sharing a comparison key are
//!    joined. A source whose key is unique among sources absorbs *every*
//!    target with that key (legitimate variants recorded as separate rows);
//!    otherwise it takes the lexicographically first available one.
//! 2. **Fuzzy pass**: remaining sources are scored against the still
//!    unconsumed targets. Matches below the profile threshold, or between
//!    names with opposite compass terms, are rejected.
//!
//! Targets are consumed one-to-one in both passes.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::attributes::MergeAttributes;
use crate::fuzzy::{best_match, has_directional_conflict};
use crate::normalize::normalize_name;
use crate::types::{
    Assignment, FuzzyMatchRecord, MatchProfile, MatchResult, Resolution, ResolutionDiagnostics,
};

/// Resolves every distinct `source_names` entry against `target_universe`.
///
/// Targets missing from `target_attributes` contribute default attributes.
#[must_use]
pub fn resolve<S, T, A>(
    source_names: &[S],
    target_universe: &[T],
    target_attributes: &HashMap<String, A>,
    profile: MatchProfile,
) -> Resolution<A>
where
    S: AsRef<str>,
    T: AsRef<str>,
    A: MergeAttributes,
{
    let sources: BTreeSet<&str> = source_names
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| !name.trim().is_empty())
        .collect();

    let mut source_key_counts: HashMap<String, usize> = HashMap::new();
    for source in &sources {
        *source_key_counts.entry(normalize_name(source)).or_default() += 1;
    }

    let mut available: BTreeSet<String> = target_universe
        .iter()
        .map(|t| t.as_ref().to_string())
        .filter(|name| !name.trim().is_empty())
        .collect();

    let mut targets_by_key: HashMap<String, BTreeSet<String>> = HashMap::new();
    for target in &available {
        targets_by_key
            .entry(normalize_name(target))
            .or_default()
            .insert(target.clone());
    }

    let mut assignments: BTreeMap<String, Assignment<A>> = BTreeMap::new();

    for source in &sources {
        let key = normalize_name(source);
        let Some(candidates) = targets_by_key.get_mut(&key) else {
            continue;
        };
        if candidates.is_empty() {
            continue;
        }

        let unique_source = source_key_counts.get(&key).copied() == Some(1);
        let consumed: Vec<String> = if unique_source {
            std::mem::take(candidates).into_iter().collect()
        } else {
            candidates.pop_first().into_iter().collect()
        };

        for name in &consumed {
            available.remove(name);
        }
        if consumed.len() > 1 {
            tracing::debug!(
                source = %source,
                targets = ?consumed,
                "merging variant target rows into one exact match"
            );
        }

        let primary = consumed[0].clone();
        assignments.insert(
            (*source).to_string(),
            Assignment {
                source_name: (*source).to_string(),
                result: MatchResult::exact(&primary),
                attributes: Some(merged_attributes(&consumed, target_attributes)),
                matched_names: consumed,
            },
        );
    }

    let threshold = profile.threshold();
    let mut fuzzy_matches = Vec::new();
    let mut unmatched_sources = Vec::new();

    for source in &sources {
        if assignments.contains_key(*source) {
            continue;
        }

        let pool: Vec<&str> = available.iter().map(String::as_str).collect();
        let assignment = match best_match(source, &pool) {
            Some(candidate)
                if candidate.score >= threshold
                    && !has_directional_conflict(source, &candidate.name) =>
            {
                available.remove(&candidate.name);
                fuzzy_matches.push(FuzzyMatchRecord {
                    source_name: (*source).to_string(),
                    target_name: candidate.name.clone(),
                    score: candidate.score,
                });
                let consumed = vec![candidate.name.clone()];
                Assignment {
                    source_name: (*source).to_string(),
                    result: MatchResult::fuzzy(&candidate.name, candidate.score),
                    attributes: Some(merged_attributes(&consumed, target_attributes)),
                    matched_names: consumed,
                }
            }
            Some(candidate) => {
                tracing::debug!(
                    source = %source,
                    candidate = %candidate.name,
                    score = candidate.score,
                    threshold,
                    "fuzzy candidate rejected"
                );
                unmatched_sources.push((*source).to_string());
                unmatched(source, Some(candidate.score))
            }
            None => {
                unmatched_sources.push((*source).to_string());
                unmatched(source, None)
            }
        };
        assignments.insert((*source).to_string(), assignment);
    }

    Resolution {
        assignments,
        diagnostics: ResolutionDiagnostics {
            unconsumed_targets: available.into_iter().collect(),
            fuzzy_matches,
            unmatched_sources,
        },
    }
}

fn unmatched<A>(source: &str, best_rejected_score: Option<f64>) -> Assignment<A> {
    Assignment {
        source_name: source.to_string(),
        result: MatchResult::unmatched(best_rejected_score),
        matched_names: Vec::new(),
        attributes: None,
    }
}

fn merged_attributes<A: MergeAttributes>(names: &[String], attributes: &HashMap<String, A>) -> A {
    let mut merged = A::default();
    for name in names {
        if let Some(attrs) = attributes.get(name) {
            merged.merge(attrs);
        }
    }
    merged
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
