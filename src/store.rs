//! The document store the shaped records are loaded into, reduced to the
//! handful of operations the analysis needs.

use serde::Serialize;
use serde_json::Value;

use crate::errors::Result;

pub mod memory;
pub mod queries;

pub use memory::MemoryStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Field at the dotted path is a string equal to the value.
    Eq(String, String),
    /// Field at the dotted path is present.
    Exists(String),
}

/// Conjunction of conditions. The empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn all() -> Filter {
        Filter::default()
    }

    pub fn eq(mut self, path: &str, value: &str) -> Filter {
        self.conditions.push(Condition::Eq(path.to_string(), value.to_string()));
        self
    }

    pub fn exists(mut self, path: &str) -> Filter {
        self.conditions.push(Condition::Exists(path.to_string()));
        self
    }

    pub fn matches(&self, doc: &Value) -> bool {
        self.conditions.iter().all(|condition| match condition {
            Condition::Eq(path, expected) => {
                lookup(doc, path).and_then(Value::as_str) == Some(expected.as_str())
            }
            Condition::Exists(path) => lookup(doc, path).is_some(),
        })
    }
}

/// Resolves `created.user` style paths.
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |value, part| value.get(part))
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub key: String,
    pub reason: String,
}

/// Outcome of a bulk insert. Rejected documents are listed, the rest were stored.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertReport {
    pub inserted: usize,
    pub rejected: Vec<Rejection>,
}

impl InsertReport {
    pub fn merge(&mut self, other: InsertReport) {
        self.inserted += other.inserted;
        self.rejected.extend(other.rejected);
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GroupCount {
    pub value: String,
    pub count: u64,
}

pub trait DocumentStore {
    fn insert_many(&mut self, docs: Vec<Value>) -> Result<InsertReport>;

    fn count(&self, filter: &Filter) -> Result<u64>;

    /// Distinct values of `field` among matching documents, sorted.
    fn distinct(&self, field: &str, filter: &Filter) -> Result<Vec<String>>;

    /// Matching documents grouped by `field`, largest groups first (ties by
    /// value), at most `limit` groups. Documents without the field are left out.
    fn group_count(&self, field: &str, filter: &Filter, limit: usize) -> Result<Vec<GroupCount>>;
}
