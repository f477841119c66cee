use crate::models::{CityPollution, CleanedReading, PopulationBase};
use crate::stages::postal::fix_postal_code;
use crate::utils::constants::CITY_PREFIX_LEN;
use std::collections::{HashMap, HashSet};

/// Approximate name key: first characters, lower-cased. Exact city strings
/// differ across sources (abbreviations, accents, administrative suffixes),
/// so the join runs on postal code plus this prefix. The heuristic can both
/// under- and over-match; that imprecision is a documented property of the
/// pipeline and deliberately left as-is.
pub fn city_prefix(name: &str) -> String {
    name.chars()
        .take(CITY_PREFIX_LEN)
        .collect::<String>()
        .to_lowercase()
}

/// Pollution–Population Join Stage: inner join of the cleaned pollutant table
/// with the population base on (postal code, city-name prefix), after
/// reconciling the population side's slash-joined postal codes against the
/// codes the pollutant table actually contains.
pub fn join_pollution_population(
    readings: Vec<CleanedReading>,
    population: Vec<PopulationBase>,
) -> Vec<CityPollution> {
    let readings_in = readings.len();

    let valid_codes: HashSet<String> =
        readings.iter().map(|r| r.postal_code.clone()).collect();

    let mut by_key: HashMap<(String, String), PopulationBase> = HashMap::new();
    for mut record in population {
        record.postal_code = fix_postal_code(&record.postal_code, &valid_codes);
        let key = (record.postal_code.clone(), city_prefix(&record.commune));
        if by_key.contains_key(&key) {
            tracing::warn!(
                "pollution join: duplicate population key {:?}, keeping the first occurrence",
                key
            );
            continue;
        }
        by_key.insert(key, record);
    }

    let joined: Vec<CityPollution> = readings
        .into_iter()
        .filter_map(|reading| {
            let key = (reading.postal_code.clone(), city_prefix(&reading.city));
            by_key
                .get(&key)
                .map(|pop| CityPollution::from_reading(reading, pop.altitude))
        })
        .collect();

    tracing::info!(
        "pollution join: {} readings -> {} rows matched a commune",
        readings_in,
        joined.len()
    );
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn reading(postal: &str, city: &str) -> CleanedReading {
        CleanedReading {
            postal_code: postal.to_string(),
            city: city.to_string(),
            last_updated: NaiveDate::from_ymd_opt(2024, 11, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            no2: Some(20.0),
            o3: Some(40.0),
            pm10: Some(15.0),
            pm25: Some(8.0),
            country_code: "FR".to_string(),
            location: "centre".to_string(),
            latitude: Some(45.0),
            longitude: Some(4.0),
            country_label: "France".to_string(),
            department: "Rhône".to_string(),
            region: "Auvergne-Rhône-Alpes".to_string(),
        }
    }

    fn base(insee: &str, postal: &str, commune: &str, altitude: f64) -> PopulationBase {
        PopulationBase {
            insee_code: insee.to_string(),
            postal_code: postal.to_string(),
            commune: commune.to_string(),
            altitude,
        }
    }

    #[test]
    fn test_city_prefix() {
        assert_eq!(city_prefix("MARSEILLE"), "marse");
        assert_eq!(city_prefix("Aix"), "aix");
        // character-based, so accents do not shift the cut
        assert_eq!(city_prefix("Évian-les-Bains"), "évian");
    }

    #[test]
    fn test_prefix_join_matches_name_variants() {
        let readings = vec![reading("13001", "Marseille 1er"), reading("99999", "Nowhere")];
        let population = vec![base("13055", "13001", "MARSEILLE", 38.0)];

        let joined = join_pollution_population(readings, population);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].city, "Marseille 1er");
        assert_eq!(joined[0].altitude, 38.0);
    }

    #[test]
    fn test_population_postal_codes_are_reconciled_before_joining() {
        let readings = vec![reading("75116", "Paris")];
        let population = vec![base("75056", "75001/75116", "Paris", 35.0)];

        let joined = join_pollution_population(readings, population);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].postal_code, "75116");
    }

    #[test]
    fn test_unmatched_rows_drop_out() {
        let readings = vec![reading("69001", "Lyon")];
        let population = vec![base("31555", "31000", "Toulouse", 118.0)];

        assert!(join_pollution_population(readings, population).is_empty());
    }
}
