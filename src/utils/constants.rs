/// Default input file names (relative to the data directory)
pub const CORRESPONDENCE_FILE: &str = "correspondance-code-insee-code-postal.csv";
pub const POPULATION_FILE: &str = "population_p2.csv";
pub const CENSUS_2024_FILE: &str = "population_p2.csv";
pub const POLLUTANTS_FILE: &str = "villes_polluants.csv";

/// Checkpoint and final file names (relative to the output directory)
pub const POPULATION_BASE_FILE: &str = "population_p1.csv";
pub const POLLUTANTS_CLEANED_FILE: &str = "villes_polluants_cleaned.csv";
pub const POLLUTION_POPULATION_FILE: &str = "villes_population_1.csv";
pub const CENSUS_ENRICHED_FILE: &str = "villes_population_2024.csv";
pub const FINAL_FILE: &str = "villes_pollution_population(FINAL).csv";

/// Canonical column labels shared across stages
pub const COL_INSEE: &str = "Code INSEE";
pub const COL_POSTAL: &str = "Code Postal";
pub const COL_COMMUNE: &str = "Commune";
pub const COL_ALTITUDE: &str = "Altitude Moyenne";
pub const COL_SURFACE: &str = "Superficie";
pub const COL_POPULATION: &str = "Population";
pub const COL_POSTAL_CODE: &str = "Postal_Code";
pub const COL_CITY: &str = "City";
pub const COL_LAST_UPDATED: &str = "LastUpdated";
pub const COL_P24_POP: &str = "p24_pop";

/// Rename map for the older census vintage (population_p2 schema)
pub const POPULATION_RENAMES: &[(&str, &str)] = &[
    ("code_commune_INSEE", COL_INSEE),
    ("code_postal", COL_POSTAL),
    ("nom_commune", COL_COMMUNE),
    ("surface", COL_SURFACE),
    ("population", COL_POPULATION),
];

/// Rename map for the newer census vintage used by the enrichment stage
pub const CENSUS_RENAMES: &[(&str, &str)] = &[
    ("code_postal", COL_POSTAL_CODE),
    ("population", COL_P24_POP),
    ("surface", COL_SURFACE),
    ("nom_commune", COL_COMMUNE),
];

/// Length of the lower-cased city-name prefix used as an approximate join key.
/// Tuned against the actual sources; do not change without re-checking the
/// postal-code override table below.
pub const CITY_PREFIX_LEN: usize = 5;

/// Corrected populations for postal codes whose joined census figure is known
/// to be wrong (consolidated arrondissements, renamed communes, ...).
pub const POSTAL_POPULATION_OVERRIDES: &[(&str, u64)] = &[
    ("13200", 52_729),
    ("20000", 71_361),
    ("31100", 498_003),
    ("33000", 268_138),
    ("34000", 315_336),
    ("35000", 221_272),
    ("37100", 137_607),
    ("38000", 158_198),
    ("42000", 171_924),
    ("44000", 333_987),
    ("50100", 79_144),
    ("54000", 104_885),
    ("57000", 122_696),
    ("59000", 238_381),
    ("59240", 85_751),
    ("63000", 144_751),
    ("66000", 122_791),
    ("67000", 290_576),
    ("68100", 108_312),
    ("73440", 2_800),
    ("74190", 11_500),
    ("93200", 115_315),
    ("87000", 127_823),
    ("84000", 89_519),
    ("80000", 134_026),
    ("76600", 163_087),
    ("76200", 27_599),
    ("76000", 116_149),
    ("6200", 342_669),
    ("6130", 50_396),
];

/// Authoritative figures for the three metropolitan cities whose source rows
/// are wrong after the arrondissement consolidation (2021 census values).
pub struct CityOverride {
    pub city: &'static str,
    pub surface: f64,
    pub altitude: f64,
    pub population: u64,
}

pub const CITY_OVERRIDES: &[CityOverride] = &[
    CityOverride {
        city: "Paris",
        surface: 105.4,
        altitude: 35.0,
        population: 2_165_423,
    },
    CityOverride {
        city: "Marseille",
        surface: 240.62,
        altitude: 38.0,
        population: 870_018,
    },
    CityOverride {
        city: "Lyon",
        surface: 47.87,
        altitude: 170.0,
        population: 522_228,
    },
];
