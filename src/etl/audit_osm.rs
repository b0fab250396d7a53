use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::audit::{AuditReport, Auditor};
use crate::errors::{Error, Result};
use crate::etl::Etl;
use crate::osm_stream::{open_osm, OsmElements};
use crate::UserConfig;

pub const ETL_NAME: &str = "audit_osm";
pub const OUTPUT_FILE_NAME: &str = "audit.json";

pub struct AuditOsmEtl {
    data_path: PathBuf,
    expected_street_types: Vec<String>,
}

impl AuditOsmEtl {
    pub fn new(config: &UserConfig) -> AuditOsmEtl {
        AuditOsmEtl {
            data_path: PathBuf::from(&config.data_path),
            expected_street_types: config.expected_street_types.clone(),
        }
    }
}

pub fn audit_elements<R: BufRead>(
    elements: OsmElements<R>,
    expected_street_types: &[String],
) -> Result<AuditReport> {
    let mut auditor = Auditor::new(expected_street_types.iter().cloned());
    for el in elements {
        auditor.observe(&el?);
    }
    Ok(auditor.finish())
}

impl Etl for AuditOsmEtl {
    type Input = OsmElements<Box<dyn BufRead>>;
    type Output = AuditReport;

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
        audit_elements(input, &self.expected_street_types)
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        info!(
            etl_name = ETL_NAME,
            unexpected_street_types = output.unexpected_street_types.len(),
            rejected_postcodes = output.postcodes.rejected.len(),
            problem_keys = output.key_types.problemchars;
            "Audit complete"
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

    #[test]
    fn test_audit_elements() {
        let xml = r#"<osm>
 <node id="1" user="a"><tag k="addr:street" v="Tehama Ave"/><tag k="addr:postcode" v="CA 94103"/></node>
 <way id="2" user="b"><nd ref="1"/><tag k="addr:street" v="Howard Street"/></way>
</osm>"#;
        let expected = vec!["Street".to_string()];
        let report = audit_elements(OsmElements::new(xml.as_bytes()), &expected).unwrap();
        assert!(report.unexpected_street_types.contains_key("Ave"));
        assert!(!report.unexpected_street_types.contains_key("Street"));
        assert_eq!(report.postcodes.accepted.get("94103"), Some(&1));
        assert_eq!(report.distinct_users, 2);
    }

    #[test]
    fn test_audit_stops_on_bad_xml() {
        let xml = "<osm><node id=\"1\"><tag k=\"a\" v=\"b\"></osm>";
        assert!(audit_elements(OsmElements::new(xml.as_bytes()), &[]).is_err());
    }
}
