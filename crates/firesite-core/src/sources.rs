//! Source lists supplied by the scraping collaborator.
//!
//! Each upstream dataset (fire-ban status list, facilities directory, closure
//! notices) is reduced to an ordered list of raw forest-name records before
//! entity resolution. The lists can be handed over in-process or loaded from a
//! YAML snapshot with [`load_source_lists`].

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One raw forest record as scraped from a single source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceForest {
    pub name: String,
    /// Fire-weather area or region label reported alongside the name.
    #[serde(default)]
    pub area: Option<String>,
    /// Free text attached to the record (closure notice body, directory blurb).
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Facility tags present on a directory row (`camping`, `toilets`, ...).
    #[serde(default)]
    pub facilities: Vec<String>,
}

impl SourceForest {
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            area: None,
            detail: None,
            url: None,
            facilities: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceLists {
    #[serde(default)]
    pub fire_ban: Vec<SourceForest>,
    #[serde(default)]
    pub facilities: Vec<SourceForest>,
    #[serde(default)]
    pub closures: Vec<SourceForest>,
}

/// Load and validate source lists from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_source_lists(path: &Path) -> Result<SourceLists, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SourcesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let lists: SourceLists = serde_yaml::from_str(&content)?;
    validate_source_lists(&lists)?;
    Ok(lists)
}

fn validate_source_lists(lists: &SourceLists) -> Result<(), ConfigError> {
    for (label, records) in [
        ("fire_ban", &lists.fire_ban),
        ("facilities", &lists.facilities),
        ("closures", &lists.closures),
    ] {
        for (idx, record) in records.iter().enumerate() {
            if record.name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{label}[{idx}] has an empty forest name"
                )));
            }
        }
    }

    // Fire-ban names are the canonical universe; exact duplicates there would
    // make every downstream join ambiguous.
    let mut seen = HashSet::new();
    for record in &lists.fire_ban {
        if !seen.insert(record.name.trim().to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate fire_ban forest name: '{}'",
                record.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_yaml(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write yaml");
        file
    }

    #[test]
    fn loads_all_three_lists() {
        let file = write_yaml(
            r"
fire_ban:
  - name: Badja State Forest
    area: Monaro Alpine
facilities:
  - name: Badja
    facilities: [camping, toilets]
closures:
  - name: Badja State Forest
    detail: Road closed after storm damage
    url: https://example.org/closures/1
",
        );
        let lists = load_source_lists(file.path()).unwrap();
        assert_eq!(lists.fire_ban.len(), 1);
        assert_eq!(lists.fire_ban[0].area.as_deref(), Some("Monaro Alpine"));
        assert_eq!(lists.facilities[0].facilities, vec!["camping", "toilets"]);
        assert_eq!(
            lists.closures[0].detail.as_deref(),
            Some("Road closed after storm damage")
        );
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let file = write_yaml("fire_ban:\n  - name: Awaba State Forest\n");
        let lists = load_source_lists(file.path()).unwrap();
        assert!(lists.facilities.is_empty());
        assert!(lists.closures.is_empty());
    }

    #[test]
    fn rejects_empty_name() {
        let lists = SourceLists {
            closures: vec![SourceForest::named("  ")],
            ..SourceLists::default()
        };
        let err = validate_source_lists(&lists).unwrap_err();
        assert!(err.to_string().contains("closures[0]"));
    }

    #[test]
    fn rejects_duplicate_fire_ban_names() {
        let lists = SourceLists {
            fire_ban: vec![
                SourceForest::named("Awaba State Forest"),
                SourceForest::named("awaba state forest"),
            ],
            ..SourceLists::default()
        };
        let err = validate_source_lists(&lists).unwrap_err();
        assert!(err.to_string().contains("duplicate fire_ban"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_source_lists(Path::new("/nonexistent/sources.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::SourcesFileIo { .. }));
    }
}
