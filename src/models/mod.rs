pub mod city;
pub mod correspondence;
pub mod pollutant;
pub mod population;

pub use city::{CityPollution, CityRecord};
pub use correspondence::CorrespondenceRecord;
pub use pollutant::{CleanedReading, PivotedReading, Pollutant, PollutantObservation};
pub use population::{CensusRecord, PopulationBase, PopulationRecord};

use chrono::{NaiveDate, NaiveDateTime};

/// Lossy numeric field parse: empty or non-numeric reads as missing, the
/// stages decide whether missing is droppable or fatal.
pub(crate) fn parse_opt_f64(s: &str) -> Option<f64> {
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok()
}

/// Populations arrive either as integers or as float-rendered integers
/// ("52729.0") depending on which tool last touched the file.
pub(crate) fn parse_opt_u64(s: &str) -> Option<u64> {
    parse_opt_f64(s).filter(|v| *v >= 0.0).map(|v| v.round() as u64)
}

/// Uniform string representation for INSEE and postal codes: trimmed, with a
/// float-rendering artifact (`"6200.0"`) reduced back to the bare code.
pub(crate) fn canonical_code(s: &str) -> String {
    let s = s.trim();
    if let Some(stripped) = s.strip_suffix(".0") {
        if !stripped.is_empty() && stripped.bytes().all(|b| b.is_ascii_digit()) {
            return stripped.to_string();
        }
    }
    s.to_string()
}

/// Timestamp parse accepting the formats seen across source vintages.
/// Offset-carrying values are normalised to UTC so per-group ordering is
/// total; missing or unparseable values read as `None` and are rejected by
/// the reshape stage's validation gate.
pub(crate) fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = chrono::DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    None
}

/// Serialize timestamps the way the checkpoint files expect them.
pub(crate) mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::Serializer;

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&dt.format(FORMAT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_canonical_code() {
        assert_eq!(canonical_code(" 75001 "), "75001");
        assert_eq!(canonical_code("6200.0"), "6200");
        assert_eq!(canonical_code("75001/75116"), "75001/75116");
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let naive = parse_timestamp("2024-11-21 14:00:00").unwrap();
        assert_eq!(naive.to_string(), "2024-11-21 14:00:00");

        // Offset values normalise to UTC
        let offset = parse_timestamp("2024-11-21 14:00:00+01:00").unwrap();
        assert_eq!(offset.to_string(), "2024-11-21 13:00:00");

        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("not a date"), None);
    }
}
