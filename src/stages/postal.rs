use std::collections::HashSet;

/// Postal-Code Reconciler: communes that historically shared several postal
/// codes carry them slash-joined ("75001/75116"). Pick the first alternative
/// that the pollutant table actually knows; anything else passes through
/// unchanged, including the unsplit string when no alternative matches (that
/// row will simply fail the subsequent join, which is accepted loss).
pub fn fix_postal_code(raw: &str, valid_codes: &HashSet<String>) -> String {
    if !raw.contains('/') {
        return raw.to_string();
    }
    for candidate in raw.split('/') {
        let candidate = candidate.trim();
        if valid_codes.contains(candidate) {
            return candidate.to_string();
        }
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn valid(codes: &[&str]) -> HashSet<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_picks_first_valid_alternative() {
        let codes = valid(&["75116"]);
        assert_eq!(fix_postal_code("75001/75116", &codes), "75116");
    }

    #[test]
    fn test_no_slash_passes_through() {
        let codes = valid(&["99999"]);
        assert_eq!(fix_postal_code("12345", &codes), "12345");
    }

    #[test]
    fn test_no_valid_alternative_passes_through_unsplit() {
        let codes = valid(&["69001"]);
        assert_eq!(fix_postal_code("75001/75116", &codes), "75001/75116");
    }

    #[test]
    fn test_trims_candidates() {
        let codes = valid(&["13002"]);
        assert_eq!(fix_postal_code("13001 / 13002", &codes), "13002");
    }
}
