use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\w']+").unwrap());

/// Street types that need no correction. Used by the street audit to spot
/// names worth adding to the correction table.
pub const EXPECTED_STREET_TYPES: [&str; 19] = [
    "Street", "Avenue", "Boulevard", "Drive", "Court", "Place", "Square", "Lane", "Road",
    "Trail", "Parkway", "Commons", "Way", "Highway", "Terrace", "Alley", "Plaza", "Circle",
    "Center",
];

// Abbreviated or miscapitalized street types, matched per word.
const TOKEN_CORRECTIONS: [(&str, &str); 30] = [
    ("St", "Street"),
    ("st", "Street"),
    ("street", "Street"),
    ("Steet", "Street"),
    ("Ave", "Avenue"),
    ("ave", "Avenue"),
    ("avenue", "Avenue"),
    ("Avenie", "Avenue"),
    ("Blvd", "Boulevard"),
    ("blvd", "Boulevard"),
    ("Boulavard", "Boulevard"),
    ("Rd", "Road"),
    ("rd", "Road"),
    ("Dr", "Drive"),
    ("Ln", "Lane"),
    ("Pl", "Place"),
    ("Ct", "Court"),
    ("Cir", "Circle"),
    ("Sq", "Square"),
    ("Ter", "Terrace"),
    ("Hwy", "Highway"),
    ("Pkwy", "Parkway"),
    ("Plz", "Plaza"),
    ("Wy", "Way"),
    ("way", "Way"),
    ("Aly", "Alley"),
    ("Ctr", "Center"),
    ("Trl", "Trail"),
    ("Cres", "Crescent"),
    ("Expy", "Expressway"),
];

// Whole values the word rules would get wrong.
const EXACT_CORRECTIONS: [(&str, &str); 6] = [
    ("Grand Avenue #105", "Grand Avenue"),
    ("Avenue D", "Avenue D Avenue"),
    ("Broadway Street", "Broadway"),
    ("Mission St., Suite 200", "Mission Street"),
    ("South Van Ness", "South Van Ness Avenue"),
    ("The Embarcadero Pier 39", "The Embarcadero"),
];

/// Raw street words or whole raw street names mapped to their canonical form.
/// Built once and never modified while a run is in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionTable {
    entries: HashMap<String, String>,
}

impl CorrectionTable {
    pub fn new(entries: HashMap<String, String>) -> CorrectionTable {
        CorrectionTable { entries }
    }

    /// The curated table, with `overrides` layered on top.
    pub fn with_overrides(overrides: &HashMap<String, String>) -> CorrectionTable {
        let mut table = CorrectionTable::default();
        table
            .entries
            .extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        table
    }

    pub fn get(&self, raw: &str) -> Option<&str> {
        self.entries.get(raw).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CorrectionTable {
    fn default() -> Self {
        let entries = TOKEN_CORRECTIONS
            .iter()
            .chain(EXACT_CORRECTIONS.iter())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CorrectionTable { entries }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StreetNormalizer {
    table: CorrectionTable,
}

impl StreetNormalizer {
    pub fn new(table: CorrectionTable) -> StreetNormalizer {
        StreetNormalizer { table }
    }

    /// Best-effort repair of a street name. Never fails; an input without any
    /// words comes back empty.
    ///
    /// A value listed as a whole in the table is replaced outright. Otherwise
    /// the value is split into words, each word found in the table is
    /// replaced, and everything after the last replaced word is dropped
    /// (`"Mission St #200"` becomes `"Mission Street"`).
    pub fn normalize(&self, raw: &str) -> String {
        if let Some(exact) = self.table.get(raw) {
            return exact.to_string();
        }

        let mut words: Vec<&str> = WORD.find_iter(raw).map(|m| m.as_str()).collect();
        let mut keep = words.len();
        for (idx, word) in words.iter_mut().enumerate() {
            if let Some(corrected) = self.table.get(*word) {
                *word = corrected;
                keep = idx + 1;
            }
        }
        words.truncate(keep);
        words.join(" ")
    }
}

/// Last whitespace-separated token of a street name, punctuation included,
/// so `"St."` and `"St"` are reported apart.
pub fn street_type(name: &str) -> Option<&str> {
    name.split_whitespace().last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn normalizer() -> StreetNormalizer {
        StreetNormalizer::default()
    }

    #[rstest]
    #[case("Kearny Street", "Kearny Street")]
    #[case("Tehama Ave", "Tehama Avenue")]
    #[case("Grand Avenue #105", "Grand Avenue")]
    #[case("Avenue D", "Avenue D Avenue")]
    #[case("Mission St #200", "Mission Street")]
    #[case("Valencia st", "Valencia Street")]
    #[case("  Folsom   Street ", "Folsom Street")]
    #[case("O'Farrell St", "O'Farrell Street")]
    #[case("Market Street, Suite 300", "Market Street Suite 300")]
    #[case("#-,", "")]
    #[case("", "")]
    fn test_normalize(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalizer().normalize(raw), expected);
    }

    #[test]
    fn test_last_correction_sets_truncation_point() {
        // "Dr" and "Ste" both come after "St"; only "Dr" is in the table.
        assert_eq!(
            normalizer().normalize("St Francis Dr Ste 5"),
            "Street Francis Drive"
        );
    }

    #[test]
    fn test_word_rule_without_exact_entry() {
        let table = CorrectionTable::new(HashMap::from([("Ave".to_string(), "Avenue".to_string())]));
        let normalizer = StreetNormalizer::new(table);
        assert_eq!(normalizer.normalize("Avenue D"), "Avenue D");
        assert_eq!(normalizer.normalize("Grand Avenue #105"), "Grand Avenue 105");
    }

    #[test]
    fn test_idempotent_on_canonical_names() {
        let normalizer = normalizer();
        for name in ["Kearny Street", "Tehama Avenue", "Geary Boulevard", "Lombard Street"] {
            let once = normalizer.normalize(name);
            assert_eq!(once, name);
            assert_eq!(normalizer.normalize(&once), once);
        }
    }

    #[test]
    fn test_overrides_win() {
        let overrides = HashMap::from([("Ave".to_string(), "AVENUE".to_string())]);
        let table = CorrectionTable::with_overrides(&overrides);
        assert_eq!(table.get("Ave"), Some("AVENUE"));
        assert_eq!(table.get("St"), Some("Street"));
        assert_eq!(table.len(), CorrectionTable::default().len());
    }

    #[rstest]
    #[case("Tehama Ave", Some("Ave"))]
    #[case("Mission St #200", Some("#200"))]
    #[case("Valencia St.", Some("St."))]
    #[case("Folsom Street\t", Some("Street"))]
    #[case("  ", None)]
    fn test_street_type(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(street_type(name), expected);
    }
}
