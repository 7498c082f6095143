//! Forest-name canonicalization.
//!
//! [`normalize_name`] reduces a raw name to a comparison key: lowercase,
//! parenthetical qualifiers removed, identity-free punctuation dropped,
//! whitespace collapsed, and generic suffixes such as "state forest" stripped.

use std::sync::LazyLock;

use regex::Regex;

static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("valid parenthetical regex"));

/// Generic trailing qualifiers that never distinguish one forest from another.
const GENERIC_SUFFIXES: &[&str] = &["state forests", "state forest", "sf"];

/// Canonicalizes a forest name into its comparison key.
///
/// The result only contains lowercase alphanumerics separated by single spaces,
/// so `normalize_name(&normalize_name(x)) == normalize_name(x)`.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let lower = name.to_lowercase();
    let without_parens = PARENTHETICAL.replace_all(&lower, " ");

    // Apostrophes join rather than split: "Croft's" and "Crofts" are one token.
    let cleaned: String = without_parens
        .chars()
        .filter(|c| !matches!(c, '\'' | '\u{2019}' | '`'))
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let mut key = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    // Loop so "X State Forest SF" collapses fully in one call.
    'strip: loop {
        for suffix in GENERIC_SUFFIXES {
            if let Some(rest) = key.strip_suffix(suffix) {
                if let Some(rest) = rest.strip_suffix(' ') {
                    key = rest.to_string();
                    continue 'strip;
                }
            }
        }
        break;
    }

    key
}

/// A raw forest name paired with its comparison key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalName {
    raw: String,
    key: String,
}

impl CanonicalName {
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            key: normalize_name(raw),
        }
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}
