//! Frequency counts gathered in one pass over the raw elements. The output is
//! what the correction table and the expected street types are curated from;
//! none of it is needed to shape records.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::data::RawElement;
use crate::normalize::{normalize_zip, street_type};
use crate::shape::{is_problem_key, POSTCODE_KEY, STREET_KEY};

static LOWER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z_]*$").unwrap());
static LOWER_COLON: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z_]*:[a-z_]*$").unwrap());

#[derive(Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct KeyTypeCounts {
    pub lower: u64,
    pub lower_colon: u64,
    pub problemchars: u64,
    pub other: u64,
}

impl KeyTypeCounts {
    fn count(&mut self, key: &str) {
        if LOWER.is_match(key) {
            self.lower += 1;
        } else if LOWER_COLON.is_match(key) {
            self.lower_colon += 1;
        } else if is_problem_key(key) {
            self.problemchars += 1;
        } else {
            self.other += 1;
        }
    }
}

#[derive(Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct PostcodeAudit {
    /// Normalized code and how many raw values produced it.
    pub accepted: BTreeMap<String, u64>,
    /// Raw values the normalizer gave up on.
    pub rejected: BTreeMap<String, u64>,
}

#[derive(Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct AuditReport {
    pub element_counts: BTreeMap<String, u64>,
    pub key_types: KeyTypeCounts,
    pub unexpected_street_types: BTreeMap<String, BTreeSet<String>>,
    pub postcodes: PostcodeAudit,
    pub distinct_users: usize,
}

pub struct Auditor {
    expected_street_types: HashSet<String>,
    users: HashSet<String>,
    report: AuditReport,
}

impl Auditor {
    pub fn new<I, S>(expected_street_types: I) -> Auditor
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Auditor {
            expected_street_types: expected_street_types.into_iter().map(Into::into).collect(),
            users: HashSet::new(),
            report: AuditReport::default(),
        }
    }

    pub fn observe(&mut self, el: &RawElement) {
        let counts = &mut self.report.element_counts;
        *counts.entry(el.kind.name().to_string()).or_default() += 1;
        if !el.tags.is_empty() {
            *counts.entry("tag".to_string()).or_default() += el.tags.len() as u64;
        }
        if !el.node_refs.is_empty() {
            *counts.entry("nd".to_string()).or_default() += el.node_refs.len() as u64;
        }

        if let Some(user) = el.attribute("user") {
            if !self.users.contains(user) {
                self.users.insert(user.to_string());
            }
        }

        for tag in &el.tags {
            self.report.key_types.count(&tag.k);
            match tag.k.as_str() {
                STREET_KEY => self.audit_street(&tag.v),
                POSTCODE_KEY => self.audit_postcode(&tag.v),
                _ => (),
            }
        }
    }

    fn audit_street(&mut self, name: &str) {
        let Some(kind) = street_type(name) else { return };
        if !self.expected_street_types.contains(kind) {
            self.report
                .unexpected_street_types
                .entry(kind.to_string())
                .or_default()
                .insert(name.to_string());
        }
    }

    fn audit_postcode(&mut self, raw: &str) {
        let postcodes = &mut self.report.postcodes;
        match normalize_zip(raw) {
            Some(code) => *postcodes.accepted.entry(code).or_default() += 1,
            None => *postcodes.rejected.entry(raw.to_string()).or_default() += 1,
        }
    }

    pub fn finish(mut self) -> AuditReport {
        self.report.distinct_users = self.users.len();
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ElementKind;
    use crate::normalize::EXPECTED_STREET_TYPES;

    fn audit(elements: &[RawElement]) -> AuditReport {
        let mut auditor = Auditor::new(EXPECTED_STREET_TYPES);
        for el in elements {
            auditor.observe(el);
        }
        auditor.finish()
    }

    #[test]
    fn test_key_types() {
        let el = RawElement::new(ElementKind::Node)
            .with_tag("highway", "stop")
            .with_tag("addr:street", "Pine Street")
            .with_tag("name:en", "x")
            .with_tag("a,b", "x")
            .with_tag("FIXME", "x");
        assert_eq!(
            audit(&[el]).key_types,
            KeyTypeCounts {
                lower: 1,
                lower_colon: 2,
                problemchars: 1,
                other: 1,
            }
        );
    }

    #[test]
    fn test_unexpected_street_types_grouped() {
        let elements = [
            RawElement::new(ElementKind::Node).with_tag("addr:street", "Tehama Ave"),
            RawElement::new(ElementKind::Node).with_tag("addr:street", "Irving Ave"),
            RawElement::new(ElementKind::Way).with_tag("addr:street", "Kearny Street"),
            RawElement::new(ElementKind::Way).with_tag("addr:street", "Valencia St."),
        ];
        let report = audit(&elements);
        assert_eq!(report.unexpected_street_types.len(), 2);
        assert!(report.unexpected_street_types["St."].contains("Valencia St."));
        let names: Vec<&str> = report.unexpected_street_types["Ave"]
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(names, vec!["Irving Ave", "Tehama Ave"]);
    }

    #[test]
    fn test_postcodes_and_counts() {
        let elements = [
            RawElement::new(ElementKind::Node)
                .with_attribute("user", "ediyes")
                .with_tag("addr:postcode", "CA 94122"),
            RawElement::new(ElementKind::Node)
                .with_attribute("user", "ediyes")
                .with_tag("addr:postcode", "94122"),
            RawElement::new(ElementKind::Way)
                .with_attribute("user", "Luis36995")
                .with_node_ref("1")
                .with_node_ref("2")
                .with_tag("addr:postcode", "95430"),
            RawElement::new(ElementKind::Other("relation".to_string())),
        ];
        let report = audit(&elements);
        assert_eq!(report.postcodes.accepted.get("94122"), Some(&2));
        assert_eq!(report.postcodes.rejected.get("95430"), Some(&1));
        assert_eq!(report.distinct_users, 2);
        assert_eq!(report.element_counts.get("node"), Some(&2));
        assert_eq!(report.element_counts.get("way"), Some(&1));
        assert_eq!(report.element_counts.get("relation"), Some(&1));
        assert_eq!(report.element_counts.get("tag"), Some(&3));
        assert_eq!(report.element_counts.get("nd"), Some(&2));
    }
}
