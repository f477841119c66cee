use crate::models::{CensusRecord, CityPollution, CityRecord};
use std::collections::HashMap;

/// Census Enrichment Stage: left-join the newer census vintage's population
/// and surface onto the joined city table, by postal code alone. Rows without
/// a census match keep empty figures; the override stage patches the known
/// problem cases afterwards.
pub fn enrich_with_census(rows: Vec<CityPollution>, census: Vec<CensusRecord>) -> Vec<CityRecord> {
    let rows_in = rows.len();
    let census_in = census.len();

    let mut by_postal: HashMap<String, (Option<u64>, Option<f64>)> = HashMap::new();
    let mut arrondissements = 0usize;
    for record in census {
        // The consolidated commune keeps its row; the per-arrondissement rows
        // ("Paris 13e", "Lyon 2ème") would otherwise shadow it.
        if is_arrondissement(&record.commune) {
            arrondissements += 1;
            continue;
        }
        if record.population.is_none() || record.postal_code.is_empty() {
            continue;
        }
        // keep-first: one census record per postal code
        by_postal
            .entry(record.postal_code.clone())
            .or_insert((record.population, record.surface));
    }

    let enriched: Vec<CityRecord> = rows
        .into_iter()
        .map(|row| {
            let (population, surface) = by_postal
                .get(&row.postal_code)
                .copied()
                .unwrap_or((None, None));
            CityRecord::new(row, population, surface)
        })
        .collect();

    tracing::info!(
        "census enrichment: {} rows x {} census records ({} arrondissement rows ignored) -> {} rows",
        rows_in,
        census_in,
        arrondissements,
        enriched.len()
    );
    enriched
}

/// True for per-arrondissement commune labels of the three consolidated
/// metropolitan cities: the city name, a space, digits, and an optional
/// `er`/`ème`/`e` ordinal suffix.
fn is_arrondissement(name: &str) -> bool {
    for prefix in ["Paris ", "Marseille ", "Lyon "] {
        if let Some(rest) = name.strip_prefix(prefix) {
            let rest = rest.trim();
            let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
            if digits == 0 {
                return false;
            }
            let suffix = &rest[digits..];
            return matches!(suffix, "" | "er" | "ème" | "e");
        }
    }
    false
}
