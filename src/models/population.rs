use crate::error::Result;
use crate::models::{canonical_code, parse_opt_f64, parse_opt_u64};
use crate::readers::RawTable;
use crate::utils::constants::{
    COL_ALTITUDE, COL_COMMUNE, COL_INSEE, COL_P24_POP, COL_POPULATION, COL_POSTAL,
    COL_POSTAL_CODE, COL_SURFACE,
};
use serde::Serialize;

/// Older census vintage, after its `code_commune_INSEE`-style labels have been
/// renamed to the canonical ones.
#[derive(Debug, Clone)]
pub struct PopulationRecord {
    pub insee_code: String,
    pub postal_code: String,
    pub commune: String,
    pub population: Option<u64>,
    pub surface: Option<f64>,
}

impl PopulationRecord {
    pub fn from_table(table: &RawTable) -> Result<Vec<Self>> {
        let insee = table.require_column(COL_INSEE)?;
        let postal = table.require_column(COL_POSTAL)?;
        let commune = table.require_column(COL_COMMUNE)?;
        let population = table.require_column(COL_POPULATION)?;
        let surface = table.require_column(COL_SURFACE)?;

        let records = table
            .rows
            .iter()
            .map(|row| Self {
                insee_code: canonical_code(table.field(row, insee)),
                postal_code: canonical_code(table.field(row, postal)),
                commune: table.field(row, commune).to_string(),
                population: parse_opt_u64(table.field(row, population)),
                surface: parse_opt_f64(table.field(row, surface)),
            })
            .collect();

        Ok(records)
    }
}

/// Newer census vintage consumed by the enrichment stage.
#[derive(Debug, Clone)]
pub struct CensusRecord {
    pub postal_code: String,
    pub commune: String,
    pub population: Option<u64>,
    pub surface: Option<f64>,
}

impl CensusRecord {
    pub fn from_table(table: &RawTable) -> Result<Vec<Self>> {
        let postal = table.require_column(COL_POSTAL_CODE)?;
        let commune = table.require_column(COL_COMMUNE)?;
        let population = table.require_column(COL_P24_POP)?;
        let surface = table.require_column(COL_SURFACE)?;

        let records = table
            .rows
            .iter()
            .map(|row| Self {
                postal_code: canonical_code(table.field(row, postal)),
                commune: table.field(row, commune).to_string(),
                population: parse_opt_u64(table.field(row, population)),
                surface: parse_opt_f64(table.field(row, surface)),
            })
            .collect();

        Ok(records)
    }
}

/// Output of the population join stage and the population side of the
/// pollution join: one row per (INSEE code, postal code) with the commune
/// name and altitude that survive into the final table.
#[derive(Debug, Clone, Serialize)]
pub struct PopulationBase {
    #[serde(rename = "Code INSEE")]
    pub insee_code: String,

    #[serde(rename = "Code Postal")]
    pub postal_code: String,

    #[serde(rename = "Commune")]
    pub commune: String,

    #[serde(rename = "Altitude Moyenne")]
    pub altitude: f64,
}

impl PopulationBase {
    /// Reload of the `population_p1.csv` checkpoint. The `Commune` column is
    /// a hard requirement here: its absence means the upstream join stage
    /// failed to resolve the name collision.
    pub fn from_table(table: &RawTable) -> Result<Vec<Self>> {
        let insee = table.require_column(COL_INSEE)?;
        let postal = table.require_column(COL_POSTAL)?;
        let commune = table.require_column(COL_COMMUNE)?;
        let altitude = table.require_column(COL_ALTITUDE)?;

        let mut records = Vec::with_capacity(table.len());
        let mut skipped = 0usize;
        for row in &table.rows {
            match parse_opt_f64(table.field(row, altitude)) {
                Some(alt) => records.push(Self {
                    insee_code: canonical_code(table.field(row, insee)),
                    postal_code: canonical_code(table.field(row, postal)),
                    commune: table.field(row, commune).to_string(),
                    altitude: alt,
                }),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::warn!(
                "{}: {} row(s) without a usable altitude skipped",
                table.source.display(),
                skipped
            );
        }

        Ok(records)
    }
}
