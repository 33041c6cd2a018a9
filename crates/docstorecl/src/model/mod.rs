pub mod query;
pub mod record;
pub mod snapshot;
pub mod value;

pub use query::{Direction, Query};
pub use record::{FieldMapping, NewRecord, Record, RecordId};
pub use snapshot::Snapshot;
