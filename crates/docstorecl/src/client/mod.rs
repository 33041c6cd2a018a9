use std::sync::Arc;

use futures::{StreamExt, TryFutureExt};

use crate::model::{FieldMapping, NewRecord, Query, RecordId, Snapshot};
use crate::platform::{self, BoxFuture, BoxStream, MaybeSend, MaybeSync};
use crate::Error;

use firestore::Firestore;
use memory::MemoryStore;

pub mod firestore;
pub mod listener;
pub mod memory;

/// Stream of complete snapshots. Dropping it releases the upstream listener.
pub type SnapshotStream<E> = BoxStream<'static, Result<Snapshot, E>>;

/// A collection store that delivers ordered snapshots and appends records.
pub trait DocumentStore {
    type Error: std::error::Error + MaybeSend + MaybeSync + 'static;

    /// Streams full snapshots of `query`, starting with the current state.
    /// Delivery failures are yielded as `Err` items; the stream keeps going.
    fn listen(&self, query: &Query, fields: &FieldMapping) -> SnapshotStream<Self::Error>;

    /// Appends a record to `collection`. The store assigns the id and the
    /// creation time.
    fn append(
        &self,
        collection: &str,
        fields: &FieldMapping,
        record: NewRecord,
    ) -> BoxFuture<'static, Result<RecordId, Self::Error>>;
}

impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    type Error = S::Error;

    fn listen(&self, query: &Query, fields: &FieldMapping) -> SnapshotStream<Self::Error> {
        (**self).listen(query, fields)
    }

    fn append(
        &self,
        collection: &str,
        fields: &FieldMapping,
        record: NewRecord,
    ) -> BoxFuture<'static, Result<RecordId, Self::Error>> {
        (**self).append(collection, fields, record)
    }
}

/// One of the bundled stores.
#[derive(Debug, Clone)]
pub enum Client {
    Memory(MemoryStore),
    Firestore(Firestore),
}

impl DocumentStore for Client {
    type Error = Error;

    fn listen(&self, query: &Query, fields: &FieldMapping) -> SnapshotStream<Error> {
        match self {
            Client::Memory(store) => {
                platform::boxed_stream(store.listen(query, fields).map(|r| r.map_err(Error::from)))
            }
            Client::Firestore(store) => {
                platform::boxed_stream(store.listen(query, fields).map(|r| r.map_err(Error::from)))
            }
        }
    }

    fn append(
        &self,
        collection: &str,
        fields: &FieldMapping,
        record: NewRecord,
    ) -> BoxFuture<'static, Result<RecordId, Error>> {
        match self {
            Client::Memory(store) => {
                platform::boxed(store.append(collection, fields, record).map_err(Error::from))
            }
            Client::Firestore(store) => {
                platform::boxed(store.append(collection, fields, record).map_err(Error::from))
            }
        }
    }
}

impl From<MemoryStore> for Client {
    fn from(store: MemoryStore) -> Self {
        Client::Memory(store)
    }
}

impl From<Firestore> for Client {
    fn from(store: Firestore) -> Self {
        Client::Firestore(store)
    }
}
