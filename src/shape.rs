//! Turns one raw OSM element into the record that gets stored.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::data::record::RESERVED_KEYS;
use crate::data::{Address, ElementKind, NormalizedRecord, RawElement, RecordKind};
use crate::normalize::{normalize_zip, StreetNormalizer};

/// Tag keys containing any of these characters are never copied.
pub static PROBLEM_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[=\+/&<>;'"\?%#$@,\. \t\r\n]"#).unwrap());

/// Marks keys in the `addr:` namespace.
pub const ADDRESS_MARKER: &str = "addr:";
pub const HOUSENUMBER_KEY: &str = "addr:housenumber";
pub const POSTCODE_KEY: &str = "addr:postcode";
pub const STREET_KEY: &str = "addr:street";

const CREATED_ATTRIBUTES: [&str; 5] = ["version", "changeset", "timestamp", "user", "uid"];

pub fn is_problem_key(key: &str) -> bool {
    PROBLEM_CHARS.is_match(key)
}

#[derive(Debug, Clone, Default)]
pub struct Shaper {
    streets: StreetNormalizer,
}

impl Shaper {
    pub fn new(streets: StreetNormalizer) -> Shaper {
        Shaper { streets }
    }

    /// Builds the record for a node or way. Any other kind of element yields
    /// `None`. Missing attributes just leave their field out.
    pub fn shape(&self, el: &RawElement) -> Option<NormalizedRecord> {
        let kind = match el.kind {
            ElementKind::Node => RecordKind::Node,
            ElementKind::Way => RecordKind::Way,
            ElementKind::Other(_) => return None,
        };

        let mut record = NormalizedRecord::new(kind);
        record.id = el.id().map(str::to_string);
        record.visible = el.attribute("visible").map(str::to_string);

        for name in CREATED_ATTRIBUTES {
            let Some(value) = el.attribute(name) else { continue };
            let slot = match name {
                "version" => &mut record.created.version,
                "changeset" => &mut record.created.changeset,
                "timestamp" => &mut record.created.timestamp,
                "user" => &mut record.created.user,
                _ => &mut record.created.uid,
            };
            *slot = Some(value.to_string());
        }

        for name in ["lat", "lon"] {
            if let Some(value) = el.attribute(name) {
                match value.trim().parse::<f64>() {
                    Ok(degrees) if degrees.is_finite() => record.pos.push(degrees),
                    _ => {
                        debug!(id = el.id().unwrap_or("?"), attribute = name, value = value; "Ignoring unusable coordinate")
                    }
                }
            }
        }

        let mut address = Address::default();
        for tag in &el.tags {
            let key = tag.k.as_str();
            if is_problem_key(key) {
                debug!(id = el.id().unwrap_or("?"), key = key; "Dropping tag with problem characters");
                continue;
            }
            match key {
                HOUSENUMBER_KEY => address.housenumber = Some(tag.v.clone()),
                POSTCODE_KEY => address.postcode = Some(normalize_zip(&tag.v)),
                STREET_KEY => address.street = Some(self.streets.normalize(&tag.v)),
                _ if key.contains(ADDRESS_MARKER) => (),
                _ if RESERVED_KEYS.contains(&key) => {
                    debug!(id = el.id().unwrap_or("?"), key = key; "Dropping tag that shadows a record field");
                }
                _ => {
                    record.tags.insert(key.to_string(), tag.v.clone());
                }
            }
        }
        if !address.is_empty() {
            record.address = Some(address);
        }

        if kind == RecordKind::Way {
            record.node_refs = el.node_refs.clone();
        }

        Some(record)
    }
}
