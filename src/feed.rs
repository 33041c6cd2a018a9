use docstorecl::client::listener::ListenerId;
use docstorecl::model::{Record, Snapshot};

/// The records of one board as last delivered by its listener.
///
/// Only the attached listener may replace the records, so snapshots that
/// arrive after the view let go of a listener are dropped.
#[derive(Debug, Default)]
pub struct Feed {
    records: Vec<Record>,
    listener: Option<ListenerId>,
    /// Newest listener let go of. Ids only grow, so it and every older
    /// listener can never attach again.
    retired: Option<ListenerId>,
}

impl Feed {
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn listener(&self) -> Option<ListenerId> {
        self.listener
    }

    pub fn is_live(&self) -> bool {
        self.listener.is_some()
    }

    /// Returns `false` for a listener that was already detached, which happens
    /// when its start notice was still queued as the view let go of it.
    pub fn attach(&mut self, id: ListenerId) -> bool {
        if self.retired.is_some_and(|retired| id <= retired) {
            log::debug!("refusing to attach retired {id}");
            return false;
        }
        log::debug!("feed attached to {id}");
        self.listener = Some(id);
        true
    }

    pub fn detach(&mut self) -> Option<ListenerId> {
        let id = self.listener.take();
        if let Some(id) = id {
            log::debug!("feed detached from {id}");
            self.retired = self.retired.max(Some(id));
        }
        id
    }

    /// Replaces every record with the snapshot's. Returns `false`, leaving the
    /// feed untouched, if `id` is not the attached listener.
    pub fn apply(&mut self, id: ListenerId, snapshot: Snapshot) -> bool {
        if self.listener != Some(id) {
            log::debug!("dropping snapshot from {id}, feed is attached to {:?}", self.listener);
            return false;
        }
        self.records = snapshot.records;
        true
    }
}
