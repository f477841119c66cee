use crate::error::{PipelineError, Result};
use crate::models::{CleanedReading, PivotedReading, Pollutant, PollutantObservation};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

/// Pollutant Reshape & Interpolation Stage: pivot long-format observations
/// into one row per (postal code, city, timestamp), then fill gaps per
/// (postal code, city, department) group with time-weighted linear
/// interpolation, extrapolating flat at the group boundaries.
pub struct PollutantReshaper;

impl PollutantReshaper {
    pub fn new() -> Self {
        Self
    }

    pub fn reshape_and_interpolate(
        &self,
        observations: Vec<PollutantObservation>,
    ) -> Result<Vec<CleanedReading>> {
        let rows_in = observations.len();

        // Interpolation needs a total time ordering per group, so a missing
        // timestamp anywhere disqualifies the whole load.
        let null_rows: Vec<usize> = observations
            .iter()
            .enumerate()
            .filter(|(_, o)| o.last_updated.is_none())
            .map(|(i, _)| i + 1)
            .collect();
        if !null_rows.is_empty() {
            return Err(PipelineError::null_timestamps(&null_rows));
        }

        let mut pivoted = self.pivot(observations);
        self.interpolate_groups(&mut pivoted);

        // CO and NO are outside the analysis scope; shed them only now so
        // they still anchored the shared (key, timestamp) grid above.
        let rows: Vec<CleanedReading> = pivoted.into_iter().map(CleanedReading::from_pivoted).collect();

        tracing::info!(
            "reshape: {} observations -> {} city/timestamp rows",
            rows_in,
            rows.len()
        );
        Ok(rows)
    }

    /// One row per (postal code, city, timestamp), one column per pollutant,
    /// duplicate (key, pollutant) cells aggregated by mean. Descriptive
    /// attributes are not meaningful per pollutant, so the first-seen value
    /// per triple is kept. BTreeMap iteration yields the
    /// (postal, city, timestamp) sort order interpolation depends on.
    fn pivot(&self, observations: Vec<PollutantObservation>) -> Vec<PivotedReading> {
        let mut cells: BTreeMap<(String, String, NaiveDateTime), PivotCell> = BTreeMap::new();

        for obs in observations {
            // validated by the caller's timestamp gate
            let Some(ts) = obs.last_updated else { continue };
            let key = (obs.postal_code.clone(), obs.city.clone(), ts);
            let cell = cells.entry(key).or_default();

            if let Some(v) = obs.value {
                let slot = &mut cell.sums[pollutant_slot(obs.pollutant)];
                slot.0 += v;
                slot.1 += 1;
            }
            if cell.first.is_none() {
                cell.first = Some(obs);
            }
        }

        cells
            .into_iter()
            .filter_map(|((postal_code, city, last_updated), cell)| {
                let first = cell.first?;
                let mut reading = PivotedReading {
                    postal_code,
                    city,
                    last_updated,
                    no2: None,
                    o3: None,
                    pm10: None,
                    pm25: None,
                    co: None,
                    no: None,
                    country_code: first.country_code,
                    location: first.location,
                    latitude: first.latitude,
                    longitude: first.longitude,
                    country_label: first.country_label,
                    department: first.department,
                    region: first.region,
                };
                for p in Pollutant::ALL {
                    let (sum, count) = cell.sums[pollutant_slot(p)];
                    if count > 0 {
                        *reading.value_mut(p) = Some(sum / count as f64);
                    }
                }
                Some(reading)
            })
            .collect()
    }

    /// Strictly intra-group interpolation: no value is ever borrowed across
    /// postal codes, cities or departments.
    fn interpolate_groups(&self, rows: &mut [PivotedReading]) {
        let mut groups: BTreeMap<(String, String, String), Vec<usize>> = BTreeMap::new();
        for (i, row) in rows.iter().enumerate() {
            groups
                .entry((
                    row.postal_code.clone(),
                    row.city.clone(),
                    row.department.clone(),
                ))
                .or_default()
                .push(i);
        }

        for indexes in groups.values() {
            let times: Vec<NaiveDateTime> = indexes.iter().map(|&i| rows[i].last_updated).collect();
            for p in Pollutant::ALL {
                let mut values: Vec<Option<f64>> =
                    indexes.iter().map(|&i| rows[i].value(p)).collect();
                interpolate_series(&times, &mut values);
                for (&i, v) in indexes.iter().zip(values) {
                    *rows[i].value_mut(p) = v;
                }
            }
        }
    }
}

impl Default for PollutantReshaper {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct PivotCell {
    /// (sum, count) per pollutant slot, for mean aggregation
    sums: [(f64, u32); 6],
    first: Option<PollutantObservation>,
}

fn pollutant_slot(p: Pollutant) -> usize {
    match p {
        Pollutant::No2 => 0,
        Pollutant::O3 => 1,
        Pollutant::Pm10 => 2,
        Pollutant::Pm25 => 3,
        Pollutant::Co => 4,
        Pollutant::No => 5,
    }
}

/// Time-weighted linear interpolation over one group's series, in timestamp
/// order. Leading and trailing gaps take the nearest known value; a series
/// with no known value at all stays empty (nothing to manufacture from).
fn interpolate_series(times: &[NaiveDateTime], values: &mut [Option<f64>]) {
    let known: Vec<usize> = (0..values.len()).filter(|&i| values[i].is_some()).collect();
    if known.is_empty() {
        return;
    }

    let first = known[0];
    let last = known[known.len() - 1];
    for i in 0..first {
        values[i] = values[first];
    }
    for i in last + 1..values.len() {
        values[i] = values[last];
    }

    for pair in known.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if hi - lo <= 1 {
            continue;
        }
        let (Some(v_lo), Some(v_hi)) = (values[lo], values[hi]) else {
            continue;
        };
        let span = (times[hi] - times[lo]).num_seconds();
        for i in lo + 1..hi {
            if span == 0 {
                values[i] = Some(v_lo);
                continue;
            }
            let elapsed = (times[i] - times[lo]).num_seconds();
            let fraction = elapsed as f64 / span as f64;
            values[i] = Some(v_lo + (v_hi - v_lo) * fraction);
        }
    }
}
