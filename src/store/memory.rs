use std::collections::{BTreeSet, HashMap, HashSet};

use serde_json::Value;

use super::{lookup, DocumentStore, Filter, GroupCount, InsertReport, Rejection};
use crate::errors::Result;

/// Keeps every document in process. Documents are unique on `type` + `id`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Vec<Value>,
    keys: HashSet<String>,
}

fn document_key(doc: &Value) -> Option<String> {
    let kind = doc.get("type")?.as_str()?;
    let id = doc.get("id")?.as_str()?;
    Some(format!("{kind}/{id}"))
}

fn group_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    fn matching<'a>(&'a self, filter: &'a Filter) -> impl Iterator<Item = &'a Value> + 'a {
        self.docs.iter().filter(move |doc| filter.matches(doc))
    }
}

impl DocumentStore for MemoryStore {
    fn insert_many(&mut self, docs: Vec<Value>) -> Result<InsertReport> {
        let mut report = InsertReport::default();
        for doc in docs {
            let Some(key) = document_key(&doc) else {
                report.rejected.push(Rejection {
                    key: "?".to_string(),
                    reason: "document has no string type and id".to_string(),
                });
                continue;
            };
            if !self.keys.insert(key.clone()) {
                report.rejected.push(Rejection {
                    key,
                    reason: "duplicate key".to_string(),
                });
                continue;
            }
            self.docs.push(doc);
            report.inserted += 1;
        }
        Ok(report)
    }

    fn count(&self, filter: &Filter) -> Result<u64> {
        Ok(self.matching(filter).count() as u64)
    }

    fn distinct(&self, field: &str, filter: &Filter) -> Result<Vec<String>> {
        let values: BTreeSet<String> = self
            .matching(filter)
            .filter_map(|doc| lookup(doc, field))
            .map(group_value)
            .collect();
        Ok(values.into_iter().collect())
    }

    fn group_count(&self, field: &str, filter: &Filter, limit: usize) -> Result<Vec<GroupCount>> {
        let mut groups: HashMap<String, u64> = HashMap::new();
        for value in self.matching(filter).filter_map(|doc| lookup(doc, field)) {
            *groups.entry(group_value(value)).or_default() += 1;
        }
        let mut groups: Vec<GroupCount> = groups
            .into_iter()
            .map(|(value, count)| GroupCount { value, count })
            .collect();
        groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
        groups.truncate(limit);
        Ok(groups)
    }
}
