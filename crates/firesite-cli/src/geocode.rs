//! `geocode`: resolves forest coordinates through the cached provider cascade.

use anyhow::Context;
use firesite_core::AppConfig;
use firesite_geocode::{
    ForestQuery, ForestResolution, GeocodeCache, GeocodeResolver, GeocodeSettings, SqliteStore,
};

pub(crate) async fn run_geocode(
    config: &AppConfig,
    names: &[String],
    hint: Option<&str>,
    concurrency: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    if hint.is_some() && names.len() != 1 {
        anyhow::bail!("--hint can only be used with a single forest name");
    }

    let store = SqliteStore::open(&config.geocode_cache_path).with_context(|| {
        format!(
            "opening geocode cache {}",
            config.geocode_cache_path.display()
        )
    })?;
    let cache = GeocodeCache::new(store, config.geocode_cache_ttl_secs);
    let resolver = GeocodeResolver::new(&GeocodeSettings::from(config), cache)?;

    let forests: Vec<ForestQuery> = names.iter().map(|n| ForestQuery::new(n, hint)).collect();
    let concurrency = concurrency.unwrap_or(config.max_concurrent_lookups);
    tracing::info!(
        forests = forests.len(),
        concurrency,
        "resolving forest coordinates"
    );
    let results = resolver.resolve_many(&forests, concurrency).await?;

    if json {
        let payload: Vec<serde_json::Value> = results
            .iter()
            .map(|r| {
                serde_json::json!({
                    "forest": r.forest.name,
                    "hint": r.forest.hint,
                    "coordinates": r.coordinates,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        for result in &results {
            print_resolution(result);
        }
    }

    let unresolved = results
        .iter()
        .filter(|r| !r.coordinates.is_resolved())
        .count();
    println!(
        "{} resolved, {unresolved} unresolved, {} google lookups used",
        results.len() - unresolved,
        resolver.budget().used()
    );
    Ok(())
}

fn print_resolution(result: &ForestResolution) {
    let coords = &result.coordinates;
    match (coords.latitude, coords.longitude, coords.provider) {
        (Some(lat), Some(lon), Some(provider)) => {
            println!(
                "{}: {lat:.6}, {lon:.6} via {provider} (confidence {:.2}) {}",
                result.forest.name,
                coords.confidence.unwrap_or_default(),
                coords.display_name.as_deref().unwrap_or_default()
            );
        }
        _ => {
            println!("{}: unresolved", result.forest.name);
            for attempt in &coords.attempts {
                println!(
                    "  {:<14} {:<20} \"{}\" {}",
                    attempt.provider,
                    attempt.outcome,
                    attempt.query,
                    attempt.error_message.as_deref().unwrap_or_default()
                );
            }
        }
    }
    for warning in &coords.warnings {
        println!("  warning: {warning}");
    }
}
