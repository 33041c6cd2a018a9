//! An in-process store with the same ordering and snapshot behaviour as the
//! remote one. Used as the offline default and as the fake in tests.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use futures::channel::mpsc;
use parking_lot::Mutex;
use thiserror::Error;

use super::{DocumentStore, SnapshotStream};
use crate::model::value::{Document, Value};
use crate::model::{FieldMapping, NewRecord, Query, Record, RecordId, Snapshot};
use crate::platform::{self, BoxFuture};

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("store is unavailable")]
    Unavailable,
}

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

struct Listener {
    query: Query,
    fields: FieldMapping,
    sender: mpsc::UnboundedSender<Result<Snapshot, Error>>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Vec<Document>>,
    listeners: Vec<Listener>,
    fail_appends: bool,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Inner {
    fn snapshot(&self, query: &Query, fields: &FieldMapping) -> Snapshot {
        let mut records: Vec<Record> = self
            .collections
            .get(&query.collection)
            .map(|docs| docs.iter().map(|doc| doc.to_record(fields)).collect())
            .unwrap_or_default();
        query.sort(&mut records);
        Snapshot::new(records, None)
    }

    fn prune(&mut self) {
        self.listeners.retain(|l| !l.sender.is_closed());
    }

    fn broadcast(&mut self, collection: &str) {
        self.prune();
        for listener in self
            .listeners
            .iter()
            .filter(|l| l.query.collection == collection)
        {
            let snapshot = self.snapshot(&listener.query, &listener.fields);
            let _ = listener.sender.unbounded_send(Ok(snapshot));
        }
    }

    /// Strictly increasing server time, so appends never tie.
    fn next_timestamp(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + TimeDelta::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }
}

#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    clock: Clock,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    /// A store that takes server time from `clock`.
    pub fn with_clock(clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            clock: Arc::new(clock),
        }
    }

    /// Makes every following append fail with [`Error::Unavailable`].
    pub fn set_fail_appends(&self, fail: bool) {
        self.inner.lock().fail_appends = fail;
    }

    /// Number of listeners whose stream is still alive.
    pub fn listener_count(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.prune();
        inner.listeners.len()
    }

    /// Number of documents stored in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.inner
            .lock()
            .collections
            .get(collection)
            .map_or(0, Vec::len)
    }

    /// Stores a record as-is, timestamp included, and notifies listeners.
    pub fn insert(&self, collection: &str, fields: &FieldMapping, record: Record) {
        let mut inner = self.inner.lock();
        let doc = document(collection, fields, &record.id, record.text, record.created_at);
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(doc);
        inner.broadcast(collection);
    }

    /// Re-sends the current snapshot of `collection` to its listeners.
    pub fn emit(&self, collection: &str) {
        self.inner.lock().broadcast(collection);
    }

    fn append_now(
        &self,
        collection: &str,
        fields: &FieldMapping,
        record: NewRecord,
    ) -> Result<RecordId, Error> {
        let mut inner = self.inner.lock();
        if inner.fail_appends {
            return Err(Error::Unavailable);
        }

        let id = RecordId::generate();
        let created_at = inner.next_timestamp((self.clock)());
        let doc = document(collection, fields, &id, record.text, Some(created_at));
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(doc);
        log::debug!("appended {id} to {collection}");
        inner.broadcast(collection);

        Ok(id)
    }
}

fn document(
    collection: &str,
    fields: &FieldMapping,
    id: &RecordId,
    text: String,
    created_at: Option<DateTime<Utc>>,
) -> Document {
    let mut values = HashMap::new();
    values.insert(fields.text.clone(), Value::StringValue(text));
    values.insert(
        fields.created_at.clone(),
        match created_at {
            Some(ts) => Value::TimestampValue(ts),
            None => Value::NullValue(()),
        },
    );
    Document {
        name: format!("memory/{collection}/{id}"),
        fields: values,
        create_time: created_at,
        update_time: created_at,
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("MemoryStore")
            .field("collections", &inner.collections.len())
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl DocumentStore for MemoryStore {
    type Error = Error;

    fn listen(&self, query: &Query, fields: &FieldMapping) -> SnapshotStream<Error> {
        let (sender, receiver) = mpsc::unbounded();
        let mut inner = self.inner.lock();
        let _ = sender.unbounded_send(Ok(inner.snapshot(query, fields)));
        inner.listeners.push(Listener {
            query: query.clone(),
            fields: fields.clone(),
            sender,
        });
        platform::boxed_stream(receiver)
    }

    fn append(
        &self,
        collection: &str,
        fields: &FieldMapping,
        record: NewRecord,
    ) -> BoxFuture<'static, Result<RecordId, Error>> {
        let store = self.clone();
        let collection = collection.to_string();
        let fields = fields.clone();
        platform::boxed(async move { store.append_now(&collection, &fields, record) })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use futures::{FutureExt, StreamExt};

    use super::*;

    fn fixed_clock() -> MemoryStore {
        MemoryStore::with_clock(|| Utc.timestamp_opt(1_700_000_000, 0).unwrap())
    }

    #[tokio::test]
    async fn test_appends_are_newest_first() {
        let store = fixed_clock();
        let fields = FieldMapping::default();
        for text in ["one", "two", "three"] {
            store
                .append("messages", &fields, NewRecord::from_draft(text).unwrap())
                .await
                .expect("append failed");
        }

        let mut stream = store.listen(&Query::newest_first("messages", &fields), &fields);
        let snapshot = stream
            .next()
            .await
            .expect("stream ended")
            .expect("snapshot failed");

        let texts: Vec<_> = snapshot.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["three", "two", "one"]);
        assert!(snapshot.iter().all(|r| !r.is_pending()));
        assert_eq!(store.len("messages"), 3);
    }

    #[tokio::test]
    async fn test_failed_append_changes_nothing() {
        let store = fixed_clock();
        let fields = FieldMapping::default();
        let mut stream = store.listen(&Query::newest_first("messages", &fields), &fields);
        let _initial = stream.next().await;

        store.set_fail_appends(true);
        let res = store
            .append("messages", &fields, NewRecord::from_draft("lost").unwrap())
            .await;
        assert!(matches!(res, Err(Error::Unavailable)));
        assert_eq!(store.len("messages"), 0);

        // nothing was broadcast
        assert!(stream.next().now_or_never().is_none());
    }

    #[tokio::test]
    async fn test_listeners_only_see_their_collection() {
        let store = fixed_clock();
        let fields = FieldMapping::default();
        let mut messages = store.listen(&Query::newest_first("messages", &fields), &fields);
        let mut feedback = store.listen(&Query::newest_first("feedback", &fields), &fields);
        let _ = messages.next().await;
        let _ = feedback.next().await;

        store
            .append("feedback", &fields, NewRecord::from_draft("hi").unwrap())
            .await
            .expect("append failed");

        assert!(messages.next().now_or_never().is_none());
        let snapshot = feedback.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_pending_records_sort_last() {
        let store = fixed_clock();
        let fields = FieldMapping::new("text", "createdAt");
        store.insert(
            "feedback",
            &fields,
            Record {
                id: RecordId::new("pending"),
                text: "not yet".into(),
                created_at: None,
            },
        );
        store.insert(
            "feedback",
            &fields,
            Record {
                id: RecordId::new("done"),
                text: "resolved".into(),
                created_at: Some(Utc.timestamp_opt(5, 0).unwrap()),
            },
        );

        let snapshot = store
            .inner
            .lock()
            .snapshot(&Query::newest_first("feedback", &fields), &fields);
        let ids: Vec<_> = snapshot.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["done", "pending"]);
    }

    #[test]
    fn test_timestamps_never_tie() {
        let store = fixed_clock();
        let mut inner = store.inner.lock();
        let now = Utc.timestamp_opt(10, 0).unwrap();
        let a = inner.next_timestamp(now);
        let b = inner.next_timestamp(now);
        assert!(b > a);
    }
}
