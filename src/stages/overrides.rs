use crate::models::CityRecord;
use crate::utils::constants::CityOverride;

/// Override/Patch Stage: fixed corrections applied after every join so that
/// no upstream linkage failure can overwrite them. Keys absent from the table
/// are no-ops.
pub fn apply_overrides(
    rows: &mut [CityRecord],
    postal_overrides: &[(&str, u64)],
    city_overrides: &[CityOverride],
) {
    let mut postal_hits = 0usize;
    let mut city_hits = 0usize;

    for row in rows.iter_mut() {
        if let Some((_, population)) = postal_overrides
            .iter()
            .find(|(code, _)| *code == row.postal_code)
        {
            row.p24_pop = Some(*population);
            postal_hits += 1;
        }
    }

    // City overrides run second: for Paris, Marseille and Lyon the
    // authoritative triple wins over any postal-code patch.
    for row in rows.iter_mut() {
        if let Some(fix) = city_overrides
            .iter()
            .find(|c| row.city.to_lowercase() == c.city.to_lowercase())
        {
            row.surface = Some(fix.surface);
            row.altitude = fix.altitude;
            row.p24_pop = Some(fix.population);
            city_hits += 1;
        }
    }

    tracing::info!(
        "overrides: {} postal-code patch(es), {} city patch(es) applied",
        postal_hits,
        city_hits
    );
}
