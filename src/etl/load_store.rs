use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::mem;
use std::path::Path;

use log::{info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::errors::{Error, Result};
use crate::etl::{shape_osm, Etl};
use crate::record_file::RecordReader;
use crate::store::queries::{summarize, Summary};
use crate::store::{DocumentStore, InsertReport, Rejection};
use crate::UserConfig;

pub const ETL_NAME: &str = "load_store";
pub const OUTPUT_FILE_NAME: &str = "report.json";

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub inserted: usize,
    pub rejected: Vec<Rejection>,
    pub summary: Summary,
}

/// Bulk loads `records.json` into a document store and reports on the result.
pub struct LoadStoreEtl<S: DocumentStore> {
    store: S,
    batch_size: usize,
    top_n: usize,
}

impl<S: DocumentStore> LoadStoreEtl<S> {
    pub fn new(config: &UserConfig, store: S) -> LoadStoreEtl<S> {
        LoadStoreEtl {
            store,
            batch_size: config.batch_size.max(1),
            top_n: config.top_n,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn insert_batch(&mut self, batch: &mut Vec<Value>, report: &mut InsertReport) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let docs = mem::replace(batch, Vec::with_capacity(self.batch_size));
        let outcome = self.store.insert_many(docs)?;
        for rejection in &outcome.rejected {
            warn!(key = rejection.key.as_str(), reason = rejection.reason.as_str(); "Store rejected record");
        }
        report.merge(outcome);
        Ok(())
    }

    /// Inserts every record in batches. Rejected records are reported and
    /// skipped; only a failing store or an unreadable record aborts.
    pub fn load_records<R: Read>(&mut self, records: RecordReader<R>) -> Result<InsertReport> {
        let mut report = InsertReport::default();
        let mut batch = Vec::with_capacity(self.batch_size);
        for record in tqdm::tqdm(records) {
            batch.push(serde_json::to_value(record?)?);
            if batch.len() >= self.batch_size {
                self.insert_batch(&mut batch, &mut report)?;
            }
        }
        self.insert_batch(&mut batch, &mut report)?;
        Ok(report)
    }
}

impl<S: DocumentStore> Etl for LoadStoreEtl<S> {
    type Input = RecordReader<BufReader<File>>;
    type Output = LoadReport;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn output_file_name(&self) -> &str {
        OUTPUT_FILE_NAME
    }

    fn extract(&mut self, dir: &Path) -> Result<Self::Input> {
        let path = dir.join(shape_osm::OUTPUT_FILE_NAME);
        let file = File::open(&path).map_err(|e| Error::io(&path, e))?;
        Ok(RecordReader::new(BufReader::new(file)))
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        let inserted = self.load_records(input)?;
        info!(
            etl_name = ETL_NAME,
            inserted = inserted.inserted,
            rejected = inserted.rejected.len();
            "Bulk load finished"
        );
        let summary = summarize(&self.store, self.top_n)?;
        Ok(LoadReport {
            inserted: inserted.inserted,
            rejected: inserted.rejected,
            summary,
        })
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        info!(
            etl_name = ETL_NAME,
            records = output.summary.records,
            nodes = output.summary.nodes,
            ways = output.summary.ways,
            distinct_users = output.summary.distinct_users;
            "Store summary"
        );
        let path = self.output_path(dir);
        let file = File::create(&path).map_err(|e| Error::io(&path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &output)?;
        writer.flush().map_err(|e| Error::io(&path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    /// Refuses every batch, like a store that has gone away.
    struct DownStore;

    impl DocumentStore for DownStore {
        fn insert_many(&mut self, _docs: Vec<Value>) -> Result<InsertReport> {
            Err(Error::Store {
                message: "connection refused".to_string(),
            })
        }

        fn count(&self, _filter: &crate::store::Filter) -> Result<u64> {
            Ok(0)
        }

        fn distinct(&self, _field: &str, _filter: &crate::store::Filter) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        fn group_count(
            &self,
            _field: &str,
            _filter: &crate::store::Filter,
            _limit: usize,
        ) -> Result<Vec<crate::store::GroupCount>> {
            Ok(Vec::new())
        }
    }

    fn config(batch_size: usize) -> UserConfig {
        UserConfig::from_json(&format!(r#"{{"data_path": "sf.osm", "batch_size": {batch_size}}}"#)).unwrap()
    }

    const RECORDS: &str = r#"{"id":"1","type":"node","created":{"user":"a"}}
{"id":"2","type":"node","created":{"user":"b"}}
{"id":"1","type":"node","created":{"user":"c"}}
{"id":"1","type":"way","created":{"user":"a"},"node_refs":["1","2"]}
"#;

    #[test]
    fn test_duplicates_do_not_abort_the_load() {
        let mut etl = LoadStoreEtl::new(&config(2), MemoryStore::new());
        let report = etl.load_records(RecordReader::new(RECORDS.as_bytes())).unwrap();
        assert_eq!(report.inserted, 3);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].key, "node/1");
        assert_eq!(etl.store().len(), 3);
    }

    #[test]
    fn test_unreachable_store_aborts() {
        let mut etl = LoadStoreEtl::new(&config(10), DownStore);
        let err = etl.load_records(RecordReader::new(RECORDS.as_bytes())).unwrap_err();
        assert!(matches!(err, Error::Store { .. }));
    }

    #[test]
    fn test_process_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(shape_osm::OUTPUT_FILE_NAME), RECORDS).unwrap();

        let mut etl = LoadStoreEtl::new(&config(1), MemoryStore::new());
        etl.process(dir.path()).unwrap();

        let report: Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(OUTPUT_FILE_NAME)).unwrap())
                .unwrap();
        assert_eq!(report["inserted"], 3);
        assert_eq!(report["rejected"][0]["key"], "node/1");
        assert_eq!(report["summary"]["ways"], 1);
        assert_eq!(report["summary"]["top_contributors"][0]["value"], "a");
    }

    #[test]
    fn test_missing_record_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut etl = LoadStoreEtl::new(&config(1), MemoryStore::new());
        assert!(matches!(etl.process(dir.path()), Err(Error::Io { .. })));
    }
}
