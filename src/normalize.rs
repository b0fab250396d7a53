//! Repairs for the free-text address fields of OSM tags.

pub mod street;
pub mod zip;

pub use street::{street_type, CorrectionTable, StreetNormalizer, EXPECTED_STREET_TYPES};
pub use zip::normalize_zip;
