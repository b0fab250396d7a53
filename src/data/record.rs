use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field names a record uses for its own structure. Tags with these keys
/// cannot be stored at the top level.
pub const RESERVED_KEYS: [&str; 7] = ["id", "type", "visible", "created", "pos", "address", "node_refs"];

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Node,
    Way,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Node => "node",
            RecordKind::Way => "way",
        }
    }
}

/// Edit metadata. Always present on a record, possibly with every field empty.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Created {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changeset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub housenumber: Option<String>,

    /// `Some(None)` is a postcode that could not be normalized and is written
    /// as `null`; `None` means the element had no postcode tag.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "nullable::deserialize"
    )]
    pub postcode: Option<Option<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        self.housenumber.is_none() && self.postcode.is_none() && self.street.is_none()
    }
}

mod nullable {
    use serde::{Deserialize, Deserializer};

    // An explicit `null` has to survive as `Some(None)`.
    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// The document written for every node and way.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub kind: RecordKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<String>,

    #[serde(default)]
    pub created: Created,

    /// Latitude then longitude. Holds a single value when the element
    /// carried only one of the two.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pos: Vec<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_refs: Vec<String>,

    /// Every other accepted tag, last occurrence wins.
    #[serde(flatten)]
    pub tags: BTreeMap<String, String>,
}

impl NormalizedRecord {
    pub fn new(kind: RecordKind) -> NormalizedRecord {
        NormalizedRecord {
            id: None,
            kind,
            visible: None,
            created: Created::default(),
            pos: Vec::new(),
            address: None,
            node_refs: Vec::new(),
            tags: BTreeMap::new(),
        }
    }

    /// Human-readable identity used in logs and errors, e.g. `way/42`.
    pub fn label(&self) -> String {
        format!("{}/{}", self.kind.as_str(), self.id.as_deref().unwrap_or("?"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> NormalizedRecord {
        let mut record = NormalizedRecord::new(RecordKind::Way);
        record.id = Some("209809850".to_string());
        record.visible = Some("true".to_string());
        record.created.user = Some("samely".to_string());
        record.created.version = Some("2".to_string());
        record.address = Some(Address {
            housenumber: Some("1412".to_string()),
            postcode: Some(None),
            street: Some("West Lexington Avenue".to_string()),
        });
        record.node_refs = vec!["2199822281".to_string(), "2199822390".to_string()];
        record.tags.insert("building".to_string(), "yes".to_string());
        record
    }

    #[test]
    fn test_serialized_layout() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "209809850",
                "type": "way",
                "visible": "true",
                "created": {"version": "2", "user": "samely"},
                "address": {
                    "housenumber": "1412",
                    "postcode": null,
                    "street": "West Lexington Avenue"
                },
                "node_refs": ["2199822281", "2199822390"],
                "building": "yes"
            })
        );
    }

    #[test]
    fn test_round_trip_keeps_null_postcode() {
        let record = sample();
        let line = serde_json::to_string(&record).unwrap();
        let back: NormalizedRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.address.unwrap().postcode, Some(None));
    }

    #[test]
    fn test_round_trip_pretty_with_position() {
        let mut record = NormalizedRecord::new(RecordKind::Node);
        record.id = Some("1".to_string());
        record.pos = vec![37.7749295, -122.4194155];
        record.tags.insert("amenity".to_string(), "cafe".to_string());
        let text = serde_json::to_string_pretty(&record).unwrap();
        let back: NormalizedRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_empty_created_is_still_written() {
        let record = NormalizedRecord::new(RecordKind::Node);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"type": "node", "created": {}}));
        assert_eq!(record.label(), "node/?");
    }
}
