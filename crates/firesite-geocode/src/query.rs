//! Query candidate generation and result plausibility checks.

use std::collections::HashSet;

use firesite_matching::{normalize_name, significant_tokens};

/// Administrative suffix the official dataset and most geocoders use.
pub const FOREST_SUFFIX: &str = "State Forest";

/// Organizational landmarks geocoders return for forest queries that are
/// never the forest itself.
pub const DISPLAY_NAME_BLACKLIST: &[&str] = &[
    "forestry corporation",
    "forestry office",
    "nsw forestry",
    "forestry headquarters",
];

/// Ordered, case-insensitively de-duplicated provider queries for a forest.
///
/// For the forest name, then the hint when it differs: the name with the
/// suffix appended, the name as given, and the name with the suffix stripped.
#[must_use]
pub fn query_candidates(forest_name: &str, hint: Option<&str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    let mut push = |candidate: String| {
        let candidate = candidate.split_whitespace().collect::<Vec<_>>().join(" ");
        if !candidate.is_empty() && seen.insert(candidate.to_lowercase()) {
            candidates.push(candidate);
        }
    };

    let mut names = vec![forest_name.trim()];
    if let Some(hint) = hint.map(str::trim).filter(|h| !h.is_empty()) {
        if !hint.eq_ignore_ascii_case(forest_name.trim()) {
            names.push(hint);
        }
    }

    for name in names {
        let stripped = strip_forest_suffix(name);
        push(format!("{stripped} {FOREST_SUFFIX}"));
        push(name.to_string());
        push(stripped.to_string());
    }
    candidates
}

/// `name` without a trailing "State Forest" (any case).
#[must_use]
pub fn strip_forest_suffix(name: &str) -> &str {
    let trimmed = name.trim();
    let suffix_len = FOREST_SUFFIX.len();
    if trimmed.len() > suffix_len && trimmed.is_char_boundary(trimmed.len() - suffix_len) {
        let (head, tail) = trimmed.split_at(trimmed.len() - suffix_len);
        if tail.eq_ignore_ascii_case(FOREST_SUFFIX) && head.ends_with(char::is_whitespace) {
            return head.trim_end();
        }
    }
    trimmed
}

/// Why a provider's display name was rejected for `query`, if it was.
#[must_use]
pub fn implausibility(query: &str, display_name: &str) -> Option<String> {
    let lower = display_name.to_lowercase();
    if let Some(term) = DISPLAY_NAME_BLACKLIST.iter().find(|t| lower.contains(*t)) {
        return Some(format!("display name matches blacklisted landmark \"{term}\""));
    }

    let display_tokens: HashSet<String> = normalize_name(display_name)
        .split_whitespace()
        .map(str::to_string)
        .collect();
    let missing: Vec<String> = significant_tokens(query)
        .into_iter()
        .filter(|t| !display_tokens.contains(t))
        .collect();
    if missing.is_empty() {
        None
    } else {
        Some(format!(
            "display name \"{display_name}\" is missing query words: {}",
            missing.join(", ")
        ))
    }
}

/// Whether a cached display name still refers to `forest_name` or `hint`.
#[must_use]
pub fn references_forest(display_name: &str, forest_name: &str, hint: Option<&str>) -> bool {
    std::iter::once(forest_name)
        .chain(hint)
        .any(|name| implausibility(name, display_name).is_none())
}

/// Whether the display name carries the administrative forest-area term.
#[must_use]
pub fn mentions_forest_area(display_name: &str) -> bool {
    display_name
        .to_lowercase()
        .contains(&FOREST_SUFFIX.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_for_suffixed_name() {
        assert_eq!(
            query_candidates("Badja State Forest", None),
            vec!["Badja State Forest", "Badja"]
        );
    }

    #[test]
    fn candidates_for_bare_name() {
        assert_eq!(
            query_candidates("Badja", None),
            vec!["Badja State Forest", "Badja"]
        );
    }

    #[test]
    fn hint_adds_its_own_variants_after_the_name() {
        assert_eq!(
            query_candidates("Croft Knoll State Forest", Some("Crofts Knoll")),
            vec![
                "Croft Knoll State Forest",
                "Croft Knoll",
                "Crofts Knoll State Forest",
                "Crofts Knoll",
            ]
        );
    }

    #[test]
    fn identical_hint_is_ignored_case_insensitively() {
        assert_eq!(
            query_candidates("Badja State Forest", Some("badja state forest")),
            query_candidates("Badja State Forest", None)
        );
    }

    #[test]
    fn strip_requires_word_boundary() {
        assert_eq!(strip_forest_suffix("Badja state forest"), "Badja");
        assert_eq!(strip_forest_suffix("State Forest"), "State Forest");
        assert_eq!(strip_forest_suffix("Interstate Forest"), "Interstate Forest");
    }

    #[test]
    fn plausible_when_all_significant_words_present() {
        assert_eq!(
            implausibility(
                "Badja State Forest",
                "Badja State Forest, Snowy Monaro Regional, NSW"
            ),
            None
        );
    }

    #[test]
    fn implausible_when_query_word_missing() {
        let reason = implausibility("Croft Knoll State Forest", "Knoll Road, Tumut NSW").unwrap();
        assert!(reason.contains("croft"), "{reason}");
    }

    #[test]
    fn blacklisted_landmark_is_implausible() {
        assert!(implausibility("Tumut", "Forestry Corporation of NSW, Tumut").is_some());
    }

    #[test]
    fn cached_display_name_can_match_hint() {
        assert!(references_forest(
            "Crofts Knoll State Forest, NSW",
            "Croft Knoll",
            Some("Crofts Knoll")
        ));
        assert!(!references_forest("Somewhere Else, NSW", "Croft Knoll", None));
    }

    #[test]
    fn forest_area_term_detection() {
        assert!(mentions_forest_area("Badja State Forest, NSW"));
        assert!(!mentions_forest_area("Badja, NSW 2630, Australia"));
    }
}
