use serde::Serialize;

use super::{DocumentStore, Filter, GroupCount};
use crate::data::RecordKind;
use crate::errors::Result;

pub fn count_records<S: DocumentStore + ?Sized>(store: &S) -> Result<u64> {
    store.count(&Filter::all())
}

pub fn count_kind<S: DocumentStore + ?Sized>(store: &S, kind: RecordKind) -> Result<u64> {
    store.count(&Filter::all().eq("type", kind.as_str()))
}

pub fn distinct_users<S: DocumentStore + ?Sized>(store: &S) -> Result<usize> {
    Ok(store.distinct("created.user", &Filter::all())?.len())
}

pub fn top_contributors<S: DocumentStore + ?Sized>(store: &S, n: usize) -> Result<Vec<GroupCount>> {
    store.group_count("created.user", &Filter::all().exists("created.user"), n)
}

pub fn top_cuisines<S: DocumentStore + ?Sized>(store: &S, n: usize) -> Result<Vec<GroupCount>> {
    let filter = Filter::all().eq("amenity", "restaurant").exists("cuisine");
    store.group_count("cuisine", &filter, n)
}

pub fn top_religions<S: DocumentStore + ?Sized>(store: &S, n: usize) -> Result<Vec<GroupCount>> {
    let filter = Filter::all().eq("amenity", "place_of_worship").exists("religion");
    store.group_count("religion", &filter, n)
}

pub fn top_sports<S: DocumentStore + ?Sized>(store: &S, n: usize) -> Result<Vec<GroupCount>> {
    store.group_count("sport", &Filter::all().exists("sport"), n)
}

/// Everything the analysis reports about a loaded extract.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub records: u64,
    pub nodes: u64,
    pub ways: u64,
    pub distinct_users: usize,
    pub top_contributors: Vec<GroupCount>,
    pub top_cuisines: Vec<GroupCount>,
    pub top_religions: Vec<GroupCount>,
    pub top_sports: Vec<GroupCount>,
}

pub fn summarize<S: DocumentStore + ?Sized>(store: &S, top_n: usize) -> Result<Summary> {
    Ok(Summary {
        records: count_records(store)?,
        nodes: count_kind(store, RecordKind::Node)?,
        ways: count_kind(store, RecordKind::Way)?,
        distinct_users: distinct_users(store)?,
        top_contributors: top_contributors(store, top_n)?,
        top_cuisines: top_cuisines(store, top_n)?,
        top_religions: top_religions(store, top_n)?,
        top_sports: top_sports(store, top_n)?,
    })
}
