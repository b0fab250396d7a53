use std::fs;
use std::io::{BufRead, BufWriter};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::data::NormalizedRecord;
use crate::errors::{Error, Result};
use crate::etl::Etl;
use crate::osm_stream::{open_osm, OsmElements};
use crate::record_file::RecordWriter;
use crate::shape::Shaper;
use crate::UserConfig;

pub const ETL_NAME: &str = "shape_osm";
pub const OUTPUT_FILE_NAME: &str = "records.json";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ShapeStats {
    pub elements: u64,
    pub records: u64,
    pub skipped: u64,
}

/// Lazily shapes elements as they come off the reader.
pub struct ShapedRecords<R: BufRead> {
    elements: OsmElements<R>,
    shaper: Shaper,
    stats: ShapeStats,
}

impl<R: BufRead> ShapedRecords<R> {
    pub fn new(elements: OsmElements<R>, shaper: Shaper) -> ShapedRecords<R> {
        ShapedRecords {
            elements,
            shaper,
            stats: ShapeStats::default(),
        }
    }

    pub fn stats(&self) -> ShapeStats {
        self.stats
    }
}

impl<R: BufRead> Iterator for ShapedRecords<R> {
    type Item = Result<NormalizedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let el = match self.elements.next()? {
                Ok(el) => el,
                Err(err) => return Some(Err(err)),
            };
            self.stats.elements += 1;
            match self.shaper.shape(&el) {
                Some(record) => {
                    self.stats.records += 1;
                    return Some(Ok(record));
                }
                None => {
                    self.stats.skipped += 1;
                    debug!(kind = el.kind.name(), id = el.id().unwrap_or("?"), offset = self.elements.offset(); "Skipping element");
                }
            }
        }
    }
}

pub struct ShapeOsmEtl {
    data_path: PathBuf,
    shaper: Shaper,
    pretty: bool,
}

impl ShapeOsmEtl {
    pub fn new(config: &UserConfig) -> ShapeOsmEtl {
        ShapeOsmEtl {
            data_path: PathBuf::from(&config.data_path),
            shaper: config.shaper(),
            pretty: config.pretty,
        }
    }

    fn partial_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{OUTPUT_FILE_NAME}.partial"))
    }

    fn write_records<R: BufRead>(
        &self,
        partial_path: &Path,
        records: &mut ShapedRecords<R>,
    ) -> Result<()> {
        let file = fs::File::create(partial_path).map_err(|e| Error::io(partial_path, e))?;
        let mut writer = RecordWriter::new(BufWriter::new(file), self.pretty);
        for record in records.by_ref() {
            writer.write(&record?)?;
        }
        writer.finish()?;
        Ok(())
    }
}

impl Etl for ShapeOsmEtl {
    type Input = OsmElements<Box<dyn BufRead>>;
    type Output = ShapedRecords<Box<dyn BufRead>>;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn output_file_name(&self) -> &str {
        OUTPUT_FILE_NAME
    }

    fn extract(&mut self, _dir: &Path) -> Result<Self::Input> {
        open_osm(&self.data_path)
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        Ok(ShapedRecords::new(input, self.shaper.clone()))
    }

    fn load(&mut self, dir: &Path, mut output: Self::Output) -> Result<()> {
        let partial_path = self.partial_path(dir);
        if let Err(err) = self.write_records(&partial_path, &mut output) {
            // records.json is never created from an incomplete run
            let _ = fs::remove_file(&partial_path);
            return Err(err);
        }
        let final_path = self.output_path(dir);
        fs::rename(&partial_path, &final_path).map_err(|e| Error::io(&final_path, e))?;

        let stats = output.stats();
        info!(
            etl_name = ETL_NAME,
            elements = stats.elements,
            records = stats.records,
            skipped = stats.skipped;
            "Shaped OSM elements"
        );
        Ok(())
    }
}
