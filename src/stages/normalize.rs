use crate::readers::RawTable;

/// Corrupted byte-order-mark remnant: a UTF-8 marker decoded through a
/// Latin-1-family encoding lands as this literal prefix on the first label.
const BOM_ARTIFACT: &str = "ï»¿";

/// Mojibake repairs for labels that went through one or two wrong decode
/// round-trips (`Département` → `DÃÂ©partement`). Double-encoded forms must
/// be replaced before the single-encoded ones.
const MOJIBAKE_REPAIRS: &[(&str, &str)] = &[
    ("ÃÂ©", "é"),
    ("ÃÂ¨", "è"),
    ("ÃÂ´", "ô"),
    ("ÃÂ®", "î"),
    ("Ã©", "é"),
    ("Ã¨", "è"),
    ("Ã´", "ô"),
    ("Ã®", "î"),
    ("Ã§", "ç"),
];

/// Key Normalizer: repairs column labels in place and applies a
/// source-specific rename map. Must run before any key-based operation;
/// every downstream stage assumes canonical, whitespace-free labels.
pub fn normalize_headers(table: &mut RawTable, renames: &[(&str, &str)]) {
    let before = table.headers.clone();

    for header in &mut table.headers {
        let mut label = header.trim().to_string();
        label = label.replace('\u{feff}', "");
        label = label.replace(BOM_ARTIFACT, "");
        for (broken, fixed) in MOJIBAKE_REPAIRS {
            if label.contains(broken) {
                label = label.replace(broken, fixed);
            }
        }
        if let Some((_, canonical)) = renames.iter().find(|(old, _)| *old == label) {
            label = (*canonical).to_string();
        }
        *header = label;
    }

    if before != table.headers {
        tracing::debug!(
            "{}: normalized headers {:?} -> {:?}",
            table.source.display(),
            before,
            table.headers
        );
    } else {
        tracing::debug!(
            "{}: headers already canonical: {:?}",
            table.source.display(),
            table.headers
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn table_with_headers(headers: &[&str]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: vec![],
            skipped_rows: 0,
            source: PathBuf::from("test.csv"),
        }
    }

    #[test]
    fn test_strips_whitespace_and_bom_artifact() {
        let mut table = table_with_headers(&["ï»¿Code INSEE", " Code Postal ", "Commune"]);
        normalize_headers(&mut table, &[]);
        assert_eq!(table.headers, vec!["Code INSEE", "Code Postal", "Commune"]);
    }

    #[test]
    fn test_repairs_mojibake() {
        let mut table = table_with_headers(&["DÃÂ©partement", "RÃ©gion"]);
        normalize_headers(&mut table, &[]);
        assert_eq!(table.headers, vec!["Département", "Région"]);
    }

    #[test]
    fn test_applies_rename_map() {
        let mut table = table_with_headers(&["code_commune_INSEE", "nom_commune"]);
        normalize_headers(
            &mut table,
            &[
                ("code_commune_INSEE", "Code INSEE"),
                ("nom_commune", "Commune"),
            ],
        );
        assert_eq!(table.headers, vec!["Code INSEE", "Commune"]);
    }

    #[test]
    fn test_idempotent() {
        let renames = &[("code_postal", "Code Postal")];
        let mut table = table_with_headers(&["ï»¿Code INSEE", "code_postal", " DÃÂ©partement"]);
        normalize_headers(&mut table, renames);
        let once = table.headers.clone();
        normalize_headers(&mut table, renames);
        assert_eq!(table.headers, once);
    }
}
