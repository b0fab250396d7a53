use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;

static LETTER_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]+").unwrap());
static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());

/// Prefix shared by every postcode in the extract's area.
pub const AREA_PREFIX: &str = "94";
pub const ZIP_LEN: usize = 5;

/// Returns the canonical five digit postcode, or `None` when the value can't
/// be trusted. Only the first run of digits is looked at: it must be exactly
/// five digits long and start with the area prefix.
///
/// Letters in the input (`"CA 94122"`) don't change the outcome.
pub fn normalize_zip(raw: &str) -> Option<String> {
    if let Some(letters) = LETTER_RUN.find(raw) {
        trace!(postcode = raw, letters = letters.as_str(); "Postcode contains letters");
    }

    let digits = DIGIT_RUN.find(raw)?.as_str();
    if digits.len() == ZIP_LEN && digits.starts_with(AREA_PREFIX) {
        Some(digits.to_string())
    } else {
        None
    }
}
