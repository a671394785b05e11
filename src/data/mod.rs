//! Text records and the delimited file reader that produces them.

mod loader;
mod record;

pub use loader::{DataLoadError, MalformedRows, Records, TextLoader, read_records};
pub use record::{LabeledRecord, TextRecord, UnlabeledRecord};
