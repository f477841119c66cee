use crate::error::Result;
use crate::models::{canonical_code, parse_opt_f64};
use crate::readers::RawTable;
use crate::utils::constants::{COL_ALTITUDE, COL_COMMUNE, COL_INSEE, COL_POSTAL};
use validator::Validate;

/// One row of the INSEE / postal-code correspondence table. The source file
/// also carries administrative and geometry columns (Statut, geo_shape,
/// canton codes, ...) with no analytical value; they are simply never parsed.
#[derive(Debug, Clone, Validate)]
pub struct CorrespondenceRecord {
    #[validate(length(min = 1))]
    pub insee_code: String,

    pub postal_code: String,

    pub commune: String,

    /// Mean altitude in metres; rows without one are dropped before joining.
    pub altitude: Option<f64>,
}

impl CorrespondenceRecord {
    /// Schema-validated load. Requires canonical labels, so the Key Normalizer
    /// must have run on the table first.
    pub fn from_table(table: &RawTable) -> Result<Vec<Self>> {
        let insee = table.require_column(COL_INSEE)?;
        let postal = table.require_column(COL_POSTAL)?;
        let commune = table.require_column(COL_COMMUNE)?;
        let altitude = table.require_column(COL_ALTITUDE)?;

        let records = table
            .rows
            .iter()
            .map(|row| Self {
                insee_code: canonical_code(table.field(row, insee)),
                postal_code: canonical_code(table.field(row, postal)),
                commune: table.field(row, commune).to_string(),
                altitude: parse_opt_f64(table.field(row, altitude)),
            })
            .collect();

        Ok(records)
    }
}
