pub mod audit_osm;
pub mod load_store;
pub mod shape_osm;

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, info};

use crate::errors::{Error, Result};
use crate::store::DocumentStore;
use crate::UserConfig;

/// One stage of the pipeline. Stages communicate through files in a shared
/// directory; a stage whose output file already exists is skipped.
pub trait Etl {
    type Input;
    type Output;

    fn etl_name(&self) -> &str;
    fn output_file_name(&self) -> &str;

    fn extract(&mut self, dir: &Path) -> Result<Self::Input>;
    fn transform(&mut self, input: Self::Input) -> Result<Self::Output>;
    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()>;

    fn output_path(&self, dir: &Path) -> PathBuf {
        dir.join(self.output_file_name())
    }

    fn is_cached(&self, dir: &Path) -> Result<bool> {
        let path = self.output_path(dir);
        path.try_exists().map_err(|e| Error::io(path, e))
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        if self.is_cached(dir)? {
            let path = self.output_path(dir);
            fs::remove_file(&path).map_err(|e| Error::io(path, e))?;
        }
        Ok(())
    }

    fn process(&mut self, dir: &Path) -> Result<()> {
        let name = self.etl_name().to_string();
        info!(etl_name = name.as_str(); "Starting ETL process");
        if self.is_cached(dir)? {
            info!(etl_name = name.as_str(); "Using cached value");
        } else {
            let input = logged(&name, "extract", self.extract(dir))?;
            let output = logged(&name, "transform", self.transform(input))?;
            logged(&name, "load", self.load(dir, output))?;
        }
        info!(etl_name = name.as_str(); "Process finished");
        Ok(())
    }
}

/// Passes `res` through, reporting a failed step before it propagates.
fn logged<T>(etl_name: &str, step: &str, res: Result<T>) -> Result<T> {
    match &res {
        Ok(_) => debug!(etl_name = etl_name, step = step; "Step done"),
        Err(err) => {
            let message = err.to_string();
            error!(etl_name = etl_name, step = step, err = message.as_str(); "Step failed");
        }
    }
    res
}

/// Runs every stage against `dir`, returning the store the records were
/// loaded into.
pub fn run_pipeline<S: DocumentStore>(config: &UserConfig, dir: &Path, store: S) -> Result<S> {
    let mut audit = audit_osm::AuditOsmEtl::new(config);
    let mut shape = shape_osm::ShapeOsmEtl::new(config);
    let mut load = load_store::LoadStoreEtl::new(config, store);

    if config.rerun {
        audit.clean(dir)?;
        shape.clean(dir)?;
        load.clean(dir)?;
    }

    if config.run_audit {
        audit.process(dir)?;
    }
    shape.process(dir)?;
    load.process(dir)?;
    Ok(load.into_store())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Writes its output file unless told to fail at `fail_at`.
    struct StubEtl {
        fail_at: Option<&'static str>,
        steps: Vec<&'static str>,
    }

    impl StubEtl {
        fn new(fail_at: Option<&'static str>) -> StubEtl {
            StubEtl {
                fail_at,
                steps: Vec::new(),
            }
        }

        fn step(&mut self, name: &'static str) -> Result<()> {
            self.steps.push(name);
            match self.fail_at {
                Some(step) if step == name => Err(format!("{name} broke").into()),
                _ => Ok(()),
            }
        }
    }

    impl Etl for StubEtl {
        type Input = ();
        type Output = String;

        fn etl_name(&self) -> &str {
            "stub"
        }

        fn output_file_name(&self) -> &str {
            "stub.json"
        }

        fn extract(&mut self, _dir: &Path) -> Result<()> {
            self.step("extract")
        }

        fn transform(&mut self, _input: ()) -> Result<String> {
            self.step("transform")?;
            Ok("{}".to_string())
        }

        fn load(&mut self, dir: &Path, output: String) -> Result<()> {
            self.step("load")?;
            let path = self.output_path(dir);
            fs::write(&path, output).map_err(|e| Error::io(path, e))
        }
    }

    #[test]
    fn test_process_runs_steps_then_uses_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let mut etl = StubEtl::new(None);
        etl.process(tmp.path()).unwrap();
        assert_eq!(etl.steps, vec!["extract", "transform", "load"]);

        etl.process(tmp.path()).unwrap();
        assert_eq!(etl.steps.len(), 3);

        etl.clean(tmp.path()).unwrap();
        assert!(!etl.is_cached(tmp.path()).unwrap());
    }

    #[test]
    fn test_failed_step_stops_process() {
        let tmp = tempfile::tempdir().unwrap();
        let mut etl = StubEtl::new(Some("transform"));
        let err = etl.process(tmp.path()).unwrap_err();
        assert_eq!(err.to_string(), "transform broke");
        assert_eq!(etl.steps, vec!["extract", "transform"]);
        assert!(!etl.is_cached(tmp.path()).unwrap());
    }

    #[test]
    fn test_logged_passes_result_through() {
        assert_eq!(logged("stub", "load", Ok(3)).unwrap(), 3);
        let err = logged::<()>("stub", "load", Err("nope".into())).unwrap_err();
        assert!(matches!(err, Error::Other(message) if message == "nope"));
    }
}
