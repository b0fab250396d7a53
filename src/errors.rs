use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A file could not be opened, created, read or renamed.
    #[error("i/o failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O failure with no file attached (stdout, in-memory writers).
    #[error("i/o failure: {0}")]
    Stream(#[from] io::Error),

    /// Malformed XML. `offset` is the byte position in the decompressed stream.
    #[error("malformed OSM XML at byte {offset}: {source}")]
    Xml {
        offset: u64,
        #[source]
        source: quick_xml::Error,
    },

    /// Writing the record for `element_id` failed.
    #[error("could not write record for element {element_id}: {source}")]
    Sink {
        element_id: String,
        #[source]
        source: io::Error,
    },

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// A record file contained something that is not a record.
    #[error("unreadable record at byte {offset}: {source}")]
    Record {
        offset: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {message}")]
    Config { message: String },

    #[error("document store failure: {message}")]
    Store { message: String },

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_string())
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
