//! Streams an OpenStreetMap XML extract, repairs its address fields and
//! loads one document per node and way into a document store.

pub mod audit;
pub mod config;
pub mod data;
pub mod errors;
pub mod etl;
pub mod normalize;
pub mod osm_stream;
pub mod record_file;
pub mod shape;
pub mod store;

pub use config::UserConfig;
pub use errors::{Error, Result};
