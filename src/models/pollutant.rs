use crate::error::Result;
use crate::models::{canonical_code, parse_opt_f64, parse_timestamp, timestamp_format};
use crate::readers::RawTable;
use crate::utils::constants::{COL_CITY, COL_LAST_UPDATED, COL_POSTAL_CODE};
use chrono::NaiveDateTime;
use serde::Serialize;
use validator::Validate;

/// Measured pollutant species. CO and NO occur in the source feed but are
/// outside the analysis scope and dropped after interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pollutant {
    No2,
    O3,
    Pm10,
    Pm25,
    Co,
    No,
}

impl Pollutant {
    pub const ALL: [Pollutant; 6] = [
        Pollutant::No2,
        Pollutant::O3,
        Pollutant::Pm10,
        Pollutant::Pm25,
        Pollutant::Co,
        Pollutant::No,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Pollutant::No2 => "NO2",
            Pollutant::O3 => "O3",
            Pollutant::Pm10 => "PM10",
            Pollutant::Pm25 => "PM2.5",
            Pollutant::Co => "CO",
            Pollutant::No => "NO",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "NO2" => Some(Pollutant::No2),
            "O3" => Some(Pollutant::O3),
            "PM10" => Some(Pollutant::Pm10),
            "PM2.5" => Some(Pollutant::Pm25),
            "CO" => Some(Pollutant::Co),
            "NO" => Some(Pollutant::No),
            _ => None,
        }
    }

    pub fn is_transient(self) -> bool {
        matches!(self, Pollutant::Co | Pollutant::No)
    }
}

/// One long-format reading: a single pollutant measured for one city at one
/// timestamp, plus the station's descriptive attributes.
#[derive(Debug, Clone, Validate)]
pub struct PollutantObservation {
    pub postal_code: String,
    pub city: String,

    /// `None` when the source field is empty or unparseable; the reshape
    /// stage rejects the whole load in that case.
    pub last_updated: Option<NaiveDateTime>,

    pub pollutant: Pollutant,
    pub value: Option<f64>,

    pub country_code: String,
    pub location: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,

    pub country_label: String,
    pub department: String,
    pub region: String,
}

impl PollutantObservation {
    /// Schema-validated load of the long-format pollutant table. Rows with an
    /// unknown pollutant label or out-of-range coordinates are skipped with a
    /// warning, matching the reader's bad-line policy.
    pub fn from_table(table: &RawTable) -> Result<Vec<Self>> {
        let postal = table.require_column(COL_POSTAL_CODE)?;
        let city = table.require_column(COL_CITY)?;
        let updated = table.require_column(COL_LAST_UPDATED)?;
        let pollutant = table.require_column("Pollutant")?;
        let value = table.require_column("value")?;
        let department = table.require_column("Department")?;

        let country_code = table.column_index("Country.Code");
        let location = table.column_index("Location");
        let latitude = table.column_index("Latitude");
        let longitude = table.column_index("Longitude");
        let country_label = table.column_index("Country.Label");
        let region = table.column_index("Region");

        let opt = |row: &[String], idx: Option<usize>| -> String {
            idx.map(|i| table.field(row, i).to_string()).unwrap_or_default()
        };

        let mut records = Vec::with_capacity(table.len());
        let mut unknown = 0usize;
        for (i, row) in table.rows.iter().enumerate() {
            let label = table.field(row, pollutant);
            let Some(species) = Pollutant::from_label(label) else {
                unknown += 1;
                tracing::warn!(
                    "{}: row {}: unknown pollutant '{}' skipped",
                    table.source.display(),
                    i + 2,
                    label
                );
                continue;
            };

            let record = Self {
                postal_code: canonical_code(table.field(row, postal)),
                city: table.field(row, city).to_string(),
                last_updated: parse_timestamp(table.field(row, updated)),
                pollutant: species,
                value: parse_opt_f64(table.field(row, value)),
                country_code: opt(row, country_code),
                location: opt(row, location),
                latitude: latitude.and_then(|i| parse_opt_f64(table.field(row, i))),
                longitude: longitude.and_then(|i| parse_opt_f64(table.field(row, i))),
                country_label: opt(row, country_label),
                department: table.field(row, department).to_string(),
                region: opt(row, region),
            };

            if let Err(e) = record.validate() {
                tracing::warn!(
                    "{}: row {}: invalid observation skipped ({e})",
                    table.source.display(),
                    i + 2
                );
                continue;
            }
            records.push(record);
        }

        if unknown > 0 {
            tracing::warn!(
                "{}: {} row(s) with unknown pollutant labels skipped",
                table.source.display(),
                unknown
            );
        }

        Ok(records)
    }
}

/// Pivoted working row: one (postal code, city, timestamp) triple with one
/// value slot per pollutant and first-seen descriptive attributes.
#[derive(Debug, Clone)]
pub struct PivotedReading {
    pub postal_code: String,
    pub city: String,
    pub last_updated: NaiveDateTime,

    pub no2: Option<f64>,
    pub o3: Option<f64>,
    pub pm10: Option<f64>,
    pub pm25: Option<f64>,
    pub co: Option<f64>,
    pub no: Option<f64>,

    pub country_code: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub country_label: String,
    pub department: String,
    pub region: String,
}

impl PivotedReading {
    pub fn value(&self, p: Pollutant) -> Option<f64> {
        match p {
            Pollutant::No2 => self.no2,
            Pollutant::O3 => self.o3,
            Pollutant::Pm10 => self.pm10,
            Pollutant::Pm25 => self.pm25,
            Pollutant::Co => self.co,
            Pollutant::No => self.no,
        }
    }

    pub fn value_mut(&mut self, p: Pollutant) -> &mut Option<f64> {
        match p {
            Pollutant::No2 => &mut self.no2,
            Pollutant::O3 => &mut self.o3,
            Pollutant::Pm10 => &mut self.pm10,
            Pollutant::Pm25 => &mut self.pm25,
            Pollutant::Co => &mut self.co,
            Pollutant::No => &mut self.no,
        }
    }
}

/// Stage-5 checkpoint row: the pivoted, interpolated table with the transient
/// CO/NO columns already dropped.
#[derive(Debug, Clone, Serialize)]
pub struct CleanedReading {
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

    #[serde(rename = "Country.Code")]
    pub country_code: String,

    #[serde(rename = "Location")]
    pub location: String,

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
}

impl CleanedReading {
    pub fn from_pivoted(r: PivotedReading) -> Self {
        Self {
            postal_code: r.postal_code,
            city: r.city,
            last_updated: r.last_updated,
            no2: r.no2,
            o3: r.o3,
            pm10: r.pm10,
            pm25: r.pm25,
            country_code: r.country_code,
            location: r.location,
            latitude: r.latitude,
            longitude: r.longitude,
            country_label: r.country_label,
            department: r.department,
            region: r.region,
        }
    }

    /// Reload of the `villes_polluants_cleaned.csv` checkpoint.
    pub fn from_table(table: &RawTable) -> Result<Vec<Self>> {
        let postal = table.require_column(COL_POSTAL_CODE)?;
        let city = table.require_column(COL_CITY)?;
        let updated = table.require_column(COL_LAST_UPDATED)?;
        let no2 = table.require_column("NO2")?;
        let o3 = table.require_column("O3")?;
        let pm10 = table.require_column("PM10")?;
        let pm25 = table.require_column("PM2.5")?;
        let department = table.require_column("Department")?;

        let country_code = table.column_index("Country.Code");
        let location = table.column_index("Location");
        let latitude = table.column_index("Latitude");
        let longitude = table.column_index("Longitude");
        let country_label = table.column_index("Country.Label");
        let region = table.column_index("Region");

        let opt = |row: &[String], idx: Option<usize>| -> String {
            idx.map(|i| table.field(row, i).to_string()).unwrap_or_default()
        };

        let mut records = Vec::with_capacity(table.len());
        let mut skipped = 0usize;
        for (i, row) in table.rows.iter().enumerate() {
            let Some(ts) = parse_timestamp(table.field(row, updated)) else {
                skipped += 1;
                tracing::warn!(
                    "{}: row {}: unreadable timestamp skipped",
                    table.source.display(),
                    i + 2
                );
                continue;
            };
            records.push(Self {
                postal_code: canonical_code(table.field(row, postal)),
                city: table.field(row, city).to_string(),
                last_updated: ts,
                no2: parse_opt_f64(table.field(row, no2)),
                o3: parse_opt_f64(table.field(row, o3)),
                pm10: parse_opt_f64(table.field(row, pm10)),
                pm25: parse_opt_f64(table.field(row, pm25)),
                country_code: opt(row, country_code),
                location: opt(row, location),
                latitude: latitude.and_then(|i| parse_opt_f64(table.field(row, i))),
                longitude: longitude.and_then(|i| parse_opt_f64(table.field(row, i))),
                country_label: opt(row, country_label),
                department: table.field(row, department).to_string(),
                region: opt(row, region),
            });
        }
        if skipped > 0 {
            tracing::warn!(
                "{}: {} checkpoint row(s) skipped",
                table.source.display(),
                skipped
            );
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pollutant_labels_round() {
        for p in Pollutant::ALL {
            assert_eq!(Pollutant::from_label(p.label()), Some(p));
        }
        assert_eq!(Pollutant::from_label("SO2"), None);
        assert!(Pollutant::Co.is_transient());
        assert!(!Pollutant::No2.is_transient());
    }
}
