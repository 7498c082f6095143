//! `match`: joins the fire-ban list to the facilities directory and closure notices.

use std::collections::HashMap;
use std::path::Path;

use firesite_core::{load_source_lists, SourceForest};
use firesite_matching::{
    resolve, ClosureNotice, ClosureNotices, ForestFacilities, MatchProfile, MergeAttributes,
    Resolution,
};

pub(crate) fn run_match(path: &Path, json: bool) -> anyhow::Result<()> {
    let lists = load_source_lists(path)?;
    let fire_ban: Vec<&str> = lists.fire_ban.iter().map(|f| f.name.as_str()).collect();

    let facilities = resolve(
        &fire_ban,
        &names(&lists.facilities),
        &attributes_by_name(&lists.facilities, |r| {
            ForestFacilities::from_tags(&r.facilities)
        }),
        MatchProfile::Facilities,
    );
    let closures = resolve(
        &fire_ban,
        &names(&lists.closures),
        &attributes_by_name(&lists.closures, closure_notices),
        MatchProfile::Closures,
    );

    if json {
        let payload = serde_json::json!({
            "facilities": facilities,
            "closures": closures,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("facilities directory:");
    print_resolution(&facilities);
    println!();
    println!("closure notices:");
    print_resolution(&closures);
    Ok(())
}

fn names(records: &[SourceForest]) -> Vec<&str> {
    records.iter().map(|r| r.name.as_str()).collect()
}

/// Rows repeating a name are merged before resolution.
fn attributes_by_name<A, F>(records: &[SourceForest], to_attributes: F) -> HashMap<String, A>
where
    A: MergeAttributes,
    F: Fn(&SourceForest) -> A,
{
    let mut by_name: HashMap<String, A> = HashMap::new();
    for record in records {
        by_name
            .entry(record.name.clone())
            .or_default()
            .merge(&to_attributes(record));
    }
    by_name
}

fn closure_notices(record: &SourceForest) -> ClosureNotices {
    ClosureNotices(vec![ClosureNotice {
        title: record.name.clone(),
        detail: record.detail.clone(),
        url: record.url.clone(),
        impact: None,
    }])
}

fn print_resolution<A>(resolution: &Resolution<A>) {
    for assignment in resolution.assignments.values() {
        let score = assignment
            .result
            .score
            .map_or_else(|| "-".to_string(), |s| format!("{s:.3}"));
        let matched = if assignment.matched_names.is_empty() {
            "-".to_string()
        } else {
            assignment.matched_names.join(" | ")
        };
        println!(
            "  {:<36} {:<9} {:>6}  {matched}",
            assignment.source_name, assignment.result.match_type, score
        );
    }

    let diagnostics = &resolution.diagnostics;
    for fuzzy in &diagnostics.fuzzy_matches {
        println!(
            "  fuzzy: \"{}\" -> \"{}\" ({:.3})",
            fuzzy.source_name, fuzzy.target_name, fuzzy.score
        );
    }
    if !diagnostics.unconsumed_targets.is_empty() {
        println!(
            "  never referenced: {}",
            diagnostics.unconsumed_targets.join(", ")
        );
    }
    if !diagnostics.unmatched_sources.is_empty() {
        println!("  unmatched: {}", diagnostics.unmatched_sources.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, tags: &[&str]) -> SourceForest {
        SourceForest {
            facilities: tags.iter().map(|t| (*t).to_string()).collect(),
            ..SourceForest::named(name)
        }
    }

    #[test]
    fn repeated_directory_rows_merge_flags() {
        let rows = vec![
            row("Badja State Forest", &["camping"]),
            row("Badja State Forest", &["toilets"]),
            row("Bago State Forest", &[]),
        ];
        let attrs = attributes_by_name(&rows, |r| ForestFacilities::from_tags(&r.facilities));
        let badja = attrs["Badja State Forest"];
        assert!(badja.camping && badja.toilets);
        assert!(!attrs["Bago State Forest"].camping);
    }

    #[test]
    fn sources_file_runs_end_to_end() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            b"fire_ban:\n  - name: Croft Knoll State Forest\nfacilities:\n  - name: Crofts Knoll State Forest\n    facilities: [camping]\nclosures: []\n",
        )
        .unwrap();
        run_match(file.path(), true).unwrap();
    }
}
