use crate::error::Result;
use crate::models::{canonical_code, parse_opt_f64, parse_opt_u64, parse_timestamp, timestamp_format};
use crate::models::CleanedReading;
use crate::readers::RawTable;
use crate::utils::constants::{
    COL_ALTITUDE, COL_CITY, COL_LAST_UPDATED, COL_P24_POP, COL_POSTAL_CODE, COL_SURFACE,
};
use chrono::NaiveDateTime;
use serde::Serialize;

/// Stage-6 checkpoint row: a cleaned pollutant reading linked to its commune's
/// altitude. The linkage keys (INSEE code, commune name, prefix keys) and the
/// station's country code / location are shed here, as they carry nothing the
/// final table needs.
#[derive(Debug, Clone, Serialize)]
pub struct CityPollution {
    #[serde(rename = "Postal_Code")]
    pub postal_code: String,

    #[serde(rename = "City")]
    pub city: String,

    #[serde(rename = "LastUpdated", serialize_with = "timestamp_format::serialize")]
    pub last_updated: NaiveDateTime,

    #[serde(rename = "NO2")]
    pub no2: Option<f64>,

    #[serde(rename = "O3")]
    pub o3: Option<f64>,

    #[serde(rename = "PM10")]
    pub pm10: Option<f64>,

    #[serde(rename = "PM2.5")]
    pub pm25: Option<f64>,

    #[serde(rename = "Latitude")]
    pub latitude: Option<f64>,

    #[serde(rename = "Longitude")]
    pub longitude: Option<f64>,

    #[serde(rename = "Country.Label")]
    pub country_label: String,

    #[serde(rename = "Department")]
    pub department: String,

    #[serde(rename = "Region")]
    pub region: String,

    #[serde(rename = "Altitude Moyenne")]
    pub altitude: f64,
}

impl CityPollution {
    pub fn from_reading(r: CleanedReading, altitude: f64) -> Self {
        Self {
            postal_code: r.postal_code,
            city: r.city,
            last_updated: r.last_updated,
            no2: r.no2,
            o3: r.o3,
            pm10: r.pm10,
            pm25: r.pm25,
            latitude: r.latitude,
            longitude: r.longitude,
            country_label: r.country_label,
            department: r.department,
            region: r.region,
            altitude,
        }
    }

    /// Reload of the `villes_population_1.csv` checkpoint.
    pub fn from_table(table: &RawTable) -> Result<Vec<Self>> {
        let ctx = CityColumns::resolve(table)?;
        let mut records = Vec::with_capacity(table.len());
        for (i, row) in table.rows.iter().enumerate() {
            if let Some(core) = ctx.parse_core(table, row, i) {
                records.push(core);
            }
        }
        Ok(records)
    }
}

/// Final-table row: `CityPollution` plus the newer census vintage's
/// population and surface, both patched by the override stage. Fields are
/// spelled out rather than nested because the csv serializer cannot flatten.
#[derive(Debug, Clone, Serialize)]
pub struct CityRecord {
    #[serde(rename = "Postal_Code")]
    pub postal_code: String,

    #[serde(rename = "City")]
    pub city: String,

    #[serde(rename = "LastUpdated", serialize_with = "timestamp_format::serialize")]
    pub last_updated: NaiveDateTime,

    #[serde(rename = "NO2")]
    pub no2: Option<f64>,

    #[serde(rename = "O3")]
    pub o3: Option<f64>,

    #[serde(rename = "PM10")]
    pub pm10: Option<f64>,

    #[serde(rename = "PM2.5")]
    pub pm25: Option<f64>,

    #[serde(rename = "Latitude")]
    pub latitude: Option<f64>,

    #[serde(rename = "Longitude")]
    pub longitude: Option<f64>,

    #[serde(rename = "Country.Label")]
    pub country_label: String,

    #[serde(rename = "Department")]
    pub department: String,

    #[serde(rename = "Region")]
    pub region: String,

    #[serde(rename = "Altitude Moyenne")]
    pub altitude: f64,

    #[serde(rename = "p24_pop")]
    pub p24_pop: Option<u64>,

    #[serde(rename = "Superficie")]
    pub surface: Option<f64>,
}

impl CityRecord {
    pub fn new(p: CityPollution, p24_pop: Option<u64>, surface: Option<f64>) -> Self {
        Self {
            postal_code: p.postal_code,
            city: p.city,
            last_updated: p.last_updated,
            no2: p.no2,
            o3: p.o3,
            pm10: p.pm10,
            pm25: p.pm25,
            latitude: p.latitude,
            longitude: p.longitude,
            country_label: p.country_label,
            department: p.department,
            region: p.region,
            altitude: p.altitude,
            p24_pop,
            surface,
        }
    }

    /// Reload of the `villes_population_2024.csv` checkpoint.
    pub fn from_table(table: &RawTable) -> Result<Vec<Self>> {
        let ctx = CityColumns::resolve(table)?;
        let p24 = table.require_column(COL_P24_POP)?;
        let surface = table.require_column(COL_SURFACE)?;

        let mut records = Vec::with_capacity(table.len());
        for (i, row) in table.rows.iter().enumerate() {
            if let Some(pollution) = ctx.parse_core(table, row, i) {
                records.push(Self::new(
                    pollution,
                    parse_opt_u64(table.field(row, p24)),
                    parse_opt_f64(table.field(row, surface)),
                ));
            }
        }
        Ok(records)
    }
}

/// Shared column resolution for the two city-level checkpoints.
struct CityColumns {
    postal: usize,
    city: usize,
    updated: usize,
    no2: usize,
    o3: usize,
    pm10: usize,
    pm25: usize,
    altitude: usize,
    latitude: Option<usize>,
    longitude: Option<usize>,
    country_label: Option<usize>,
    department: Option<usize>,
    region: Option<usize>,
}

impl CityColumns {
    fn resolve(table: &RawTable) -> Result<Self> {
        Ok(Self {
            postal: table.require_column(COL_POSTAL_CODE)?,
            city: table.require_column(COL_CITY)?,
            updated: table.require_column(COL_LAST_UPDATED)?,
            no2: table.require_column("NO2")?,
            o3: table.require_column("O3")?,
            pm10: table.require_column("PM10")?,
            pm25: table.require_column("PM2.5")?,
            altitude: table.require_column(COL_ALTITUDE)?,
            latitude: table.column_index("Latitude"),
            longitude: table.column_index("Longitude"),
            country_label: table.column_index("Country.Label"),
            department: table.column_index("Department"),
            region: table.column_index("Region"),
        })
    }

    fn parse_core(&self, table: &RawTable, row: &[String], i: usize) -> Option<CityPollution> {
        let ts = parse_timestamp(table.field(row, self.updated));
        let altitude = parse_opt_f64(table.field(row, self.altitude));
        let (Some(ts), Some(altitude)) = (ts, altitude) else {
            tracing::warn!(
                "{}: row {}: unreadable timestamp or altitude skipped",
                table.source.display(),
                i + 2
            );
            return None;
        };
        let opt = |idx: Option<usize>| -> String {
            idx.map(|c| table.field(row, c).to_string()).unwrap_or_default()
        };
        Some(CityPollution {
            postal_code: canonical_code(table.field(row, self.postal)),
            city: table.field(row, self.city).to_string(),
            last_updated: ts,
            no2: parse_opt_f64(table.field(row, self.no2)),
            o3: parse_opt_f64(table.field(row, self.o3)),
            pm10: parse_opt_f64(table.field(row, self.pm10)),
            pm25: parse_opt_f64(table.field(row, self.pm25)),
            latitude: self.latitude.and_then(|c| parse_opt_f64(table.field(row, c))),
            longitude: self.longitude.and_then(|c| parse_opt_f64(table.field(row, c))),
            country_label: opt(self.country_label),
            department: opt(self.department),
            region: opt(self.region),
            altitude,
        })
    }
}
