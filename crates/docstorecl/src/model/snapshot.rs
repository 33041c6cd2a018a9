use chrono::{DateTime, Utc};

use super::record::Record;

/// A complete, ordered point-in-time view of a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub records: Vec<Record>,
    pub read_time: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn new(records: Vec<Record>, read_time: Option<DateTime<Utc>>) -> Self {
        Self { records, read_time }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Whether both snapshots hold the same records in the same order,
    /// ignoring when they were read.
    pub fn same_records(&self, other: &Snapshot) -> bool {
        self.records == other.records
    }
}

impl IntoIterator for Snapshot {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
