use airpop_processor::{Pipeline, PipelineConfig, PipelineError};
use pretty_assertions::assert_eq;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tempfile::TempDir;

fn write_fixture(dir: &Path) {
    // Correspondence table: semicolon-delimited, one row (Marseille) that no
    // population record matches.
    std::fs::write(
        dir.join("correspondance-code-insee-code-postal.csv"),
        "Code INSEE;Code Postal;Commune;Altitude Moyenne;Statut\n\
         75056;75001;Paris;35;Capitale\n\
         6088;06000;Nice;10;Commune simple\n\
         13055;13001;Marseille;38;Préfecture\n",
    )
    .unwrap();

    // Census vintage, comma-delimited; Toulouse matches nothing in the
    // correspondence table. The same file serves both vintages, as in the
    // source data layout.
    std::fs::write(
        dir.join("population_p2.csv"),
        "code_commune_INSEE,code_postal,nom_commune,surface,population\n\
         75056,75001,Paris,105.4,2000000\n\
         6088,06000,Nice,71.9,340000\n\
         31555,31000,Toulouse,118.3,480000\n",
    )
    .unwrap();

    // Long-format pollutant readings: two postal codes, four timestamps,
    // with gaps the interpolation has to fill.
    let mut pollutants = String::from(
        "Country.Code,City,Location,Latitude,Longitude,Pollutant,value,LastUpdated,Country.Label,Department,Region,Postal_Code\n",
    );
    let hours = [
        "2024-11-01 00:00:00",
        "2024-11-01 01:00:00",
        "2024-11-01 02:00:00",
        "2024-11-01 03:00:00",
    ];
    let paris = [
        // (timestamp index, pollutant, value)
        (0, "NO2", "10"),
        (0, "O3", "80"),
        (0, "PM10", "20"),
        (0, "PM2.5", "10"),
        (1, "O3", "70"),
        (2, "PM10", "30"),
        (3, "NO2", "40"),
        (3, "O3", "50"),
        (3, "PM2.5", "14"),
    ];
    for (h, pollutant, value) in paris {
        pollutants.push_str(&format!(
            "FR,Paris,Paris-Centre,48.86,2.35,{pollutant},{value},{},France,Paris,Île-de-France,75001\n",
            hours[h]
        ));
    }
    let nice = [
        (0, "NO2", "12"),
        (0, "O3", "60"),
        (1, "PM10", "18"),
        (1, "PM2.5", "9"),
        (2, "O3", "54"),
        (3, "NO2", "24"),
        (3, "O3", "48"),
        (3, "PM10", "22"),
        (3, "PM2.5", "11"),
    ];
    for (h, pollutant, value) in nice {
        pollutants.push_str(&format!(
            "FR,Nice,Nice-Ouest,43.70,7.26,{pollutant},{value},{},France,Alpes-Maritimes,PACA,06000\n",
            hours[h]
        ));
    }
    std::fs::write(dir.join("villes_polluants.csv"), pollutants).unwrap();
}

fn read_csv(path: &Path) -> (Vec<String>, Vec<HashMap<String, String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    let rows = reader
        .records()
        .map(|r| {
            let r = r.unwrap();
            headers
                .iter()
                .cloned()
                .zip(r.iter().map(String::from))
                .collect()
        })
        .collect();
    (headers, rows)
}

#[test]
fn test_full_pipeline_end_to_end() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());

    let config = PipelineConfig::in_dir(dir.path());
    let summary = Pipeline::new(config.clone())
        .with_silent(true)
        .run()
        .unwrap();
    assert_eq!(summary.stages.len(), 5);

    // Every checkpoint materialized
    assert!(config.population_base_path().exists());
    assert!(config.pollutants_cleaned_path().exists());
    assert!(config.pollution_population_path().exists());
    assert!(config.census_enriched_path().exists());
    assert!(config.final_path().exists());

    let (headers, rows) = read_csv(&config.final_path());
    for required in [
        "Postal_Code",
        "City",
        "NO2",
        "O3",
        "PM10",
        "PM2.5",
        "p24_pop",
        "Superficie",
        "Altitude Moyenne",
    ] {
        assert!(headers.iter().any(|h| h == required), "missing {required}");
    }

    // Only the two postal codes present on both sides survive the joins.
    let postal_codes: HashSet<&str> = rows.iter().map(|r| r["Postal_Code"].as_str()).collect();
    assert_eq!(
        postal_codes,
        HashSet::from(["75001", "06000"]),
        "expected exactly the two matching postal codes"
    );

    // Both groups had at least one reading per pollutant, so interpolation
    // must leave no gaps.
    for row in &rows {
        for pollutant in ["NO2", "O3", "PM10", "PM2.5"] {
            assert!(
                !row[pollutant].is_empty(),
                "null {pollutant} for {} at {}",
                row["Postal_Code"],
                row["LastUpdated"]
            );
        }
    }

    // Four timestamps per city
    assert_eq!(rows.len(), 8);

    // Paris interpolation: NO2 10 -> 40 over four equally spaced hours
    let mut paris: Vec<_> = rows.iter().filter(|r| r["City"] == "Paris").collect();
    paris.sort_by_key(|r| r["LastUpdated"].clone());
    let no2: Vec<&str> = paris.iter().map(|r| r["NO2"].as_str()).collect();
    assert_eq!(no2, vec!["10.0", "20.0", "30.0", "40.0"]);

    // Paris carries its authoritative override triple
    for row in &paris {
        assert_eq!(row["p24_pop"], "2165423");
        assert_eq!(row["Altitude Moyenne"], "35.0");
        assert_eq!(row["Superficie"], "105.4");
    }

    // Nice keeps its census figures and correspondence altitude untouched
    let nice: Vec<_> = rows.iter().filter(|r| r["City"] == "Nice").collect();
    for row in &nice {
        assert_eq!(row["p24_pop"], "340000");
        assert_eq!(row["Altitude Moyenne"], "10.0");
        assert_eq!(row["Superficie"], "71.9");
    }
}

#[test]
fn test_missing_input_halts_the_pipeline() {
    let dir = TempDir::new().unwrap();
    // No fixture files at all
    let config = PipelineConfig::in_dir(dir.path());
    let err = Pipeline::new(config).with_silent(true).run().unwrap_err();
    assert!(matches!(err, PipelineError::FileNotFound { .. }));
}

#[test]
fn test_rerunning_overwrites_checkpoints() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());

    let config = PipelineConfig::in_dir(dir.path());
    let first = Pipeline::new(config.clone()).with_silent(true).run().unwrap();
    let second = Pipeline::new(config.clone()).with_silent(true).run().unwrap();

    assert_eq!(first.final_rows(), second.final_rows());
    let (_, rows) = read_csv(&config.final_path());
    assert_eq!(rows.len(), first.final_rows());
}
