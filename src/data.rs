pub mod osm;
pub mod record;

pub use osm::{ElementKind, RawElement, Tag};
pub use record::{Address, Created, NormalizedRecord, RecordKind};
