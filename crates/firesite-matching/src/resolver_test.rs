use std::collections::HashMap;

use super::*;
use crate::attributes::{ClosureNotice, ClosureNotices, ForestFacilities};
use crate::types::MatchType;

fn facilities(tags: &[&str]) -> ForestFacilities {
    ForestFacilities::from_tags(tags)
}

fn no_attrs() -> HashMap<String, ForestFacilities> {
    HashMap::new()
}

#[test]
fn exact_match_ignores_suffix_and_case() {
    let resolution = resolve(
        &["Badja State Forest"],
        &["BADJA"],
        &no_attrs(),
        MatchProfile::Facilities,
    );
    let assignment = &resolution.assignments["Badja State Forest"];
    assert_eq!(assignment.result.match_type, MatchType::Exact);
    assert_eq!(assignment.result.matched_name.as_deref(), Some("BADJA"));
    assert_eq!(assignment.result.score, Some(1.0));
    assert!(resolution.diagnostics.unconsumed_targets.is_empty());
}

#[test]
fn unique_source_merges_variant_targets() {
    let mut attrs = HashMap::new();
    attrs.insert("Bago".to_string(), facilities(&["camping"]));
    attrs.insert(
        "Bago State Forest (pine plantations)".to_string(),
        facilities(&["toilets"]),
    );

    let resolution = resolve(
        &["Bago State Forest"],
        &["Bago State Forest (pine plantations)", "Bago"],
        &attrs,
        MatchProfile::Facilities,
    );

    let assignment = &resolution.assignments["Bago State Forest"];
    assert_eq!(assignment.result.match_type, MatchType::Exact);
    assert_eq!(
        assignment.matched_names,
        vec!["Bago", "Bago State Forest (pine plantations)"]
    );
    let merged = assignment.attributes.unwrap();
    assert!(merged.camping);
    assert!(merged.toilets);
}

#[test]
fn duplicate_sources_consume_one_target_each() {
    let resolution = resolve(
        &["Awaba State Forest", "AWABA"],
        &["Awaba", "Awaba State Forest"],
        &no_attrs(),
        MatchProfile::Facilities,
    );

    let first = &resolution.assignments["AWABA"];
    let second = &resolution.assignments["Awaba State Forest"];
    assert_eq!(first.result.match_type, MatchType::Exact);
    assert_eq!(second.result.match_type, MatchType::Exact);
    assert_eq!(first.matched_names.len(), 1);
    assert_eq!(second.matched_names.len(), 1);
    assert_ne!(first.matched_names, second.matched_names);
}

#[test]
fn exact_pass_is_one_to_one() {
    let resolution = resolve(
        &["Awaba State Forest", "AWABA", "Awaba"],
        &["Awaba"],
        &no_attrs(),
        MatchProfile::Facilities,
    );
    let consumers = resolution
        .assignments
        .values()
        .filter(|a| a.matched_names.iter().any(|n| n == "Awaba"))
        .count();
    assert_eq!(consumers, 1);
    assert_eq!(resolution.diagnostics.unmatched_sources.len(), 2);
}

#[test]
fn fuzzy_match_records_score_and_names() {
    let resolution = resolve(
        &["Croft Knoll State Forest"],
        &["Crofts Knoll State Forest"],
        &no_attrs(),
        MatchProfile::Facilities,
    );

    let assignment = &resolution.assignments["Croft Knoll State Forest"];
    assert_eq!(assignment.result.match_type, MatchType::Fuzzy);
    let score = assignment.result.score.unwrap();
    assert!(score >= 0.62 && score <= 1.0);

    let fuzzy = &resolution.diagnostics.fuzzy_matches;
    assert_eq!(fuzzy.len(), 1);
    assert_eq!(fuzzy[0].source_name, "Croft Knoll State Forest");
    assert_eq!(fuzzy[0].target_name, "Crofts Knoll State Forest");
    assert!((fuzzy[0].score - score).abs() < f64::EPSILON);
}

#[test]
fn fuzzy_pass_only_sees_unconsumed_targets() {
    let resolution = resolve(
        &["Crofts Knoll", "Croft Knoll"],
        &["Crofts Knoll State Forest"],
        &no_attrs(),
        MatchProfile::Facilities,
    );
    assert_eq!(
        resolution.assignments["Crofts Knoll"].result.match_type,
        MatchType::Exact
    );
    let leftover = &resolution.assignments["Croft Knoll"];
    assert_eq!(leftover.result.match_type, MatchType::Unmatched);
    assert_eq!(leftover.result.score, None);
}

#[test]
fn directional_conflict_is_never_accepted() {
    let resolution = resolve(
        &["Smith East State Forest"],
        &["Smith West State Forest"],
        &no_attrs(),
        MatchProfile::Facilities,
    );
    let assignment = &resolution.assignments["Smith East State Forest"];
    assert_eq!(assignment.result.match_type, MatchType::Unmatched);
    assert!(assignment.attributes.is_none());
    assert_eq!(
        resolution.diagnostics.unconsumed_targets,
        vec!["Smith West State Forest"]
    );
}

#[test]
fn below_threshold_is_unmatched_with_rejected_score() {
    let resolution = resolve(
        &["Badja"],
        &["Wang Wauk"],
        &no_attrs(),
        MatchProfile::Facilities,
    );
    let assignment = &resolution.assignments["Badja"];
    assert_eq!(assignment.result.match_type, MatchType::Unmatched);
    assert!(assignment.result.score.unwrap() < 0.62);
    assert!(assignment.attributes.is_none());
    assert_eq!(resolution.diagnostics.unmatched_sources, vec!["Badja"]);
}

#[test]
fn closure_profile_uses_stricter_threshold() {
    // "Awaba" vs "Awaba Creek" scores ~0.67: accepted for facilities only.
    let facilities_run = resolve(
        &["Awaba"],
        &["Awaba Creek"],
        &no_attrs(),
        MatchProfile::Facilities,
    );
    assert_eq!(
        facilities_run.assignments["Awaba"].result.match_type,
        MatchType::Fuzzy
    );

    let closures: HashMap<String, ClosureNotices> = HashMap::new();
    let closures_run = resolve(&["Awaba"], &["Awaba Creek"], &closures, MatchProfile::Closures);
    assert_eq!(
        closures_run.assignments["Awaba"].result.match_type,
        MatchType::Unmatched
    );
}

#[test]
fn closure_notices_are_concatenated_on_merge() {
    let notice = |title: &str| ClosureNotice {
        title: title.to_string(),
        detail: None,
        url: None,
        impact: None,
    };
    let mut attrs = HashMap::new();
    attrs.insert(
        "Wang Wauk".to_string(),
        ClosureNotices(vec![notice("Road closed")]),
    );
    attrs.insert(
        "Wang Wauk State Forest".to_string(),
        ClosureNotices(vec![notice("Campground closed")]),
    );

    let resolution = resolve(
        &["Wang Wauk State Forest"],
        &["Wang Wauk", "Wang Wauk State Forest"],
        &attrs,
        MatchProfile::Closures,
    );
    let notices = resolution.assignments["Wang Wauk State Forest"]
        .attributes
        .clone()
        .unwrap();
    assert_eq!(notices.0.len(), 2);
}

#[test]
fn unconsumed_targets_are_reported_sorted() {
    let resolution = resolve(
        &["Badja"],
        &["Zig Zag", "Badja", "Mount Boss"],
        &no_attrs(),
        MatchProfile::Facilities,
    );
    assert_eq!(
        resolution.diagnostics.unconsumed_targets,
        vec!["Mount Boss", "Zig Zag"]
    );
}

#[test]
fn blank_and_repeated_sources_are_ignored() {
    let resolution = resolve(
        &["Badja", "Badja", "  "],
        &["Badja"],
        &no_attrs(),
        MatchProfile::Facilities,
    );
    assert_eq!(resolution.assignments.len(), 1);
}

#[test]
fn matched_target_without_attributes_gets_default() {
    let resolution = resolve(&["Badja"], &["Badja"], &no_attrs(), MatchProfile::Facilities);
    assert_eq!(
        resolution.assignments["Badja"].attributes,
        Some(ForestFacilities::default())
    );
}
