use crate::error::Result;
use crate::models::{CorrespondenceRecord, PopulationBase, PopulationRecord};
use std::collections::{HashMap, HashSet};

/// Population Join Stage: inner-join the correspondence table with the older
/// census vintage on (INSEE code, postal code), after keep-first
/// deduplication and dropping rows with incomplete keys or figures.
pub struct PopulationJoiner;

impl PopulationJoiner {
    pub fn new() -> Self {
        Self
    }

    pub fn join(
        &self,
        correspondence: Vec<CorrespondenceRecord>,
        population: Vec<PopulationRecord>,
    ) -> Result<Vec<PopulationBase>> {
        let corr_in = correspondence.len();
        let pop_in = population.len();

        // Keep-first dedup by the compound key; determinism follows from the
        // stable input order.
        let correspondence = dedup_by_key(correspondence, |r| {
            (r.insee_code.clone(), r.postal_code.clone())
        });
        let population =
            dedup_by_key(population, |r| (r.insee_code.clone(), r.postal_code.clone()));

        // Drop incomplete rows before merging.
        let correspondence: Vec<_> = correspondence
            .into_iter()
            .filter(|r| {
                !r.insee_code.is_empty() && !r.postal_code.is_empty() && r.altitude.is_some()
            })
            .collect();
        let population: Vec<_> = population
            .into_iter()
            .filter(|r| {
                !r.insee_code.is_empty()
                    && !r.postal_code.is_empty()
                    && r.population.is_some()
                    && r.surface.is_some()
            })
            .collect();

        let by_key: HashMap<(String, String), &PopulationRecord> = population
            .iter()
            .map(|r| ((r.insee_code.clone(), r.postal_code.clone()), r))
            .collect();

        let mut nameless = 0usize;
        let mut joined = Vec::new();
        for corr in &correspondence {
            let key = (corr.insee_code.clone(), corr.postal_code.clone());
            let Some(pop) = by_key.get(&key) else {
                continue; // inner join: unmatched correspondence rows drop out
            };

            // Commune name collision: prefer the census-side name, fall back
            // to the correspondence-side one.
            let commune = if !pop.commune.is_empty() {
                pop.commune.clone()
            } else if !corr.commune.is_empty() {
                corr.commune.clone()
            } else {
                nameless += 1;
                String::new()
            };

            joined.push(PopulationBase {
                insee_code: corr.insee_code.clone(),
                postal_code: corr.postal_code.clone(),
                commune,
                // present by the filter above
                altitude: corr.altitude.unwrap_or_default(),
            });
        }

        if nameless > 0 {
            tracing::warn!(
                "population join: {} row(s) have no commune name on either side",
                nameless
            );
        }
        tracing::info!(
            "population join: {} correspondence x {} population rows -> {} joined",
            corr_in,
            pop_in,
            joined.len()
        );

        Ok(joined)
    }
}

impl Default for PopulationJoiner {
    fn default() -> Self {
        Self::new()
    }
}

fn dedup_by_key<T, K, F>(records: Vec<T>, key: F) -> Vec<T>
where
    K: std::hash::Hash + Eq,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(key(r)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn corr(insee: &str, postal: &str, commune: &str, altitude: Option<f64>) -> CorrespondenceRecord {
        CorrespondenceRecord {
            insee_code: insee.to_string(),
            postal_code: postal.to_string(),
            commune: commune.to_string(),
            altitude,
        }
    }

    fn pop(
        insee: &str,
        postal: &str,
        commune: &str,
        population: Option<u64>,
        surface: Option<f64>,
    ) -> PopulationRecord {
        PopulationRecord {
            insee_code: insee.to_string(),
            postal_code: postal.to_string(),
            commune: commune.to_string(),
            population,
            surface,
        }
    }

    #[test]
    fn test_inner_join_drops_unmatched_and_incomplete() {
        let correspondence = vec![
            corr("75056", "75001", "Paris", Some(35.0)),
            corr("69123", "69001", "Lyon", Some(170.0)),
            corr("13055", "13001", "Marseille", None), // no altitude
        ];
        let population = vec![
            pop("75056", "75001", "Paris", Some(2_000_000), Some(105.4)),
            pop("13055", "13001", "Marseille", Some(870_000), Some(240.6)),
            pop("31555", "31000", "Toulouse", Some(500_000), Some(118.3)),
        ];

        let joined = PopulationJoiner::new().join(correspondence, population).unwrap();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].insee_code, "75056");
        assert_eq!(joined[0].commune, "Paris");
        assert_eq!(joined[0].altitude, 35.0);
    }

    #[test]
    fn test_output_keys_unique_after_duplicate_inputs() {
        let correspondence = vec![
            corr("75056", "75001", "Paris", Some(35.0)),
            corr("75056", "75001", "Paris bis", Some(99.0)),
        ];
        let population = vec![
            pop("75056", "75001", "Paris", Some(1), Some(1.0)),
            pop("75056", "75001", "Paris ter", Some(2), Some(2.0)),
        ];

        let joined = PopulationJoiner::new().join(correspondence, population).unwrap();
        assert_eq!(joined.len(), 1);
        // keep-first on both sides
        assert_eq!(joined[0].altitude, 35.0);
        assert_eq!(joined[0].commune, "Paris");
    }

    #[test]
    fn test_commune_falls_back_to_correspondence_name() {
        let correspondence = vec![corr("75056", "75001", "Paris", Some(35.0))];
        let population = vec![pop("75056", "75001", "", Some(1), Some(1.0))];

        let joined = PopulationJoiner::new().join(correspondence, population).unwrap();
        assert_eq!(joined[0].commune, "Paris");
    }
}
