use std::collections::HashMap;
use std::fs::{create_dir_all, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{Error, Result};
use crate::normalize::{CorrectionTable, StreetNormalizer, EXPECTED_STREET_TYPES};
use crate::shape::Shaper;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.json";
/// Used when no config sets `log_level`, including when the config fails to load.
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct UserConfig {
    /// OSM XML extract, optionally `.xz` compressed.
    pub data_path: String,

    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Indent records instead of writing one per line.
    #[serde(default)]
    pub pretty: bool,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_true")]
    pub run_audit: bool,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Merged over the built-in correction table.
    #[serde(default)]
    pub extra_street_corrections: HashMap<String, String>,

    #[serde(default = "default_expected_street_types")]
    pub expected_street_types: Vec<String>,

    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Discard cached stage outputs first.
    #[serde(default)]
    pub rerun: bool,
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_batch_size() -> usize {
    1000
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_expected_street_types() -> Vec<String> {
    EXPECTED_STREET_TYPES.iter().map(|s| s.to_string()).collect()
}

fn default_top_n() -> usize {
    10
}

impl UserConfig {
    pub fn from_json(json: &str) -> Result<UserConfig> {
        let config: UserConfig = serde_json::from_str(json).map_err(|e| Error::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config {
                message: "batch_size must be greater than zero".to_string(),
            });
        }
        if self.data_path.trim().is_empty() {
            return Err(Error::Config {
                message: "data_path is empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn correction_table(&self) -> CorrectionTable {
        CorrectionTable::with_overrides(&self.extra_street_corrections)
    }

    pub fn shaper(&self) -> Shaper {
        Shaper::new(StreetNormalizer::new(self.correction_table()))
    }

    /// `<output_dir>/<input file name>`, where every stage keeps its files.
    pub fn stage_dir(&self) -> Result<PathBuf> {
        let input_fname = Path::new(&self.data_path)
            .file_name()
            .ok_or("Could not get input file name")?;
        Ok(Path::new(&self.output_dir).join(input_fname))
    }
}

pub fn load_user_config(path: &Path) -> Result<UserConfig> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let config: UserConfig =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::Config {
            message: format!("{}: {}", path.display(), e),
        })?;
    config.validate()?;
    Ok(config)
}

pub fn create_output_dir(config: &UserConfig) -> Result<PathBuf> {
    let output_dir = config.stage_dir()?;
    create_dir_all(&output_dir).map_err(|e| Error::io(&output_dir, e))?;
    Ok(output_dir)
}
