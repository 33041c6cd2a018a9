//! Callback-style snapshot listeners on top of [`DocumentStore::listen`].
//!
//! ```ignore
//! let (registration, listening) = on_snapshot(&store, &query, &fields, |id, snapshot| {
//!     println!("{id}: {} records", snapshot.len());
//! });
//! tokio::spawn(listening);
//! // ...
//! registration.unsubscribe();
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::{abortable, AbortHandle, Abortable};
use futures::{FutureExt, StreamExt};
use parking_lot::Mutex;

use super::DocumentStore;
use crate::errors::ErrorWithCauses;
use crate::model::{FieldMapping, Query, Snapshot};
use crate::platform::{self, BoxFuture, MaybeSend};

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique id of a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

struct Shared {
    /// Held while a callback runs, so flipping it waits for that callback.
    active: Mutex<bool>,
}

/// Handle to a live listener. Dropping it unsubscribes.
pub struct ListenerRegistration {
    id: ListenerId,
    shared: Arc<Shared>,
    abort: AbortHandle,
}

impl ListenerRegistration {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        *self.shared.active.lock()
    }

    /// Stops delivery and releases the upstream stream. Once this returns the
    /// callback is never invoked again, even for a snapshot already in flight.
    /// Must not be called from inside the callback.
    pub fn unsubscribe(&self) {
        let mut active = self.shared.active.lock();
        if *active {
            *active = false;
            self.abort.abort();
            log::debug!("{} unsubscribed", self.id);
        }
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for ListenerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistration")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Drives a listener. Completes when the upstream stream ends or the listener
/// is unsubscribed.
#[must_use = "snapshots are only delivered while `Listening` is polled"]
pub struct Listening(Abortable<BoxFuture<'static, ()>>);

impl Future for Listening {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        self.0.poll_unpin(cx).map(|_| ())
    }
}

/// Registers `callback` for every snapshot of `query`.
///
/// Snapshots are handed over whole and one at a time. Delivery errors are
/// logged and skipped, which leaves the consumer's feed as it was.
pub fn on_snapshot<S, F>(
    store: &S,
    query: &Query,
    fields: &FieldMapping,
    mut callback: F,
) -> (ListenerRegistration, Listening)
where
    S: DocumentStore,
    F: FnMut(ListenerId, Snapshot) + MaybeSend + 'static,
{
    let id = ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed));
    let shared = Arc::new(Shared {
        active: Mutex::new(true),
    });
    let mut snapshots = store.listen(query, fields);
    let collection = query.collection.clone();

    let driver = {
        let shared = Arc::clone(&shared);
        platform::boxed(async move {
            log::debug!("{id} listening on {collection}");
            while let Some(res) = snapshots.next().await {
                match res {
                    Ok(snapshot) => {
                        let active = shared.active.lock();
                        if !*active {
                            break;
                        }
                        callback(id, snapshot);
                    }
                    Err(e) => log::warn!(
                        "{id} on {collection}: snapshot delivery failed: {e}",
                        e = ErrorWithCauses(e)
                    ),
                }
            }
            log::debug!("{id} stopped");
        })
    };
    let (driver, abort) = abortable(driver);

    (ListenerRegistration { id, shared, abort }, Listening(driver))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;

    use super::*;
    use crate::client::memory::MemoryStore;
    use crate::client::SnapshotStream;
    use crate::model::{NewRecord, Record, RecordId};

    #[derive(thiserror::Error, Debug)]
    #[error("delivery failed")]
    struct DeliveryFailed;

    /// Hands out a fixed list of results to the first listener, then ends.
    struct ScriptedStore(Mutex<Vec<Result<Snapshot, DeliveryFailed>>>);

    impl DocumentStore for ScriptedStore {
        type Error = DeliveryFailed;

        fn listen(&self, _: &Query, _: &FieldMapping) -> SnapshotStream<DeliveryFailed> {
            let script = std::mem::take(&mut *self.0.lock());
            platform::boxed_stream(futures::stream::iter(script))
        }

        fn append(
            &self,
            _: &str,
            _: &FieldMapping,
            _: NewRecord,
        ) -> BoxFuture<'static, Result<RecordId, DeliveryFailed>> {
            platform::boxed(futures::future::ready(Err(DeliveryFailed)))
        }
    }

    fn snapshot_of(texts: &[&str]) -> Snapshot {
        let records = texts
            .iter()
            .map(|text| Record {
                id: RecordId::new(*text),
                text: text.to_string(),
                created_at: None,
            })
            .collect();
        Snapshot::new(records, None)
    }

    fn make_store() -> MemoryStore {
        let next = Arc::new(Mutex::new(0));
        MemoryStore::with_clock(move || {
            let mut secs = next.lock();
            *secs += 1;
            Utc.timestamp_opt(1_700_000_000 + *secs, 0).unwrap()
        })
    }

    fn texts(snapshot: &Snapshot) -> Vec<String> {
        snapshot.iter().map(|r| r.text.clone()).collect()
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_receives_initial_and_later_snapshots() {
        let store = make_store();
        let fields = FieldMapping::default();
        let query = Query::newest_first("messages", &fields);

        store
            .append("messages", &fields, NewRecord::from_draft("first").unwrap())
            .await
            .expect("append failed");

        let seen = Arc::new(Mutex::new(Vec::new()));
        let (registration, listening) = on_snapshot(&store, &query, &fields, {
            let seen = Arc::clone(&seen);
            move |_, snapshot| seen.lock().push(texts(&snapshot))
        });
        let task = tokio::spawn(listening);
        settle().await;

        store
            .append("messages", &fields, NewRecord::from_draft("second").unwrap())
            .await
            .expect("append failed");
        settle().await;

        assert_eq!(
            *seen.lock(),
            vec![vec!["first".to_string()], vec!["second".to_string(), "first".to_string()]]
        );

        registration.unsubscribe();
        task.await.expect("listener task panicked");
    }

    #[tokio::test]
    async fn test_failed_delivery_is_skipped() {
        let fields = FieldMapping::default();
        let query = Query::newest_first("messages", &fields);
        let first = snapshot_of(&["first"]);
        let second = snapshot_of(&["second", "first"]);
        let store = ScriptedStore(Mutex::new(vec![
            Ok(first.clone()),
            Err(DeliveryFailed),
            Ok(second.clone()),
        ]));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let (registration, listening) = on_snapshot(&store, &query, &fields, {
            let seen = Arc::clone(&seen);
            move |_, snapshot| seen.lock().push(snapshot)
        });
        listening.await;

        assert_eq!(*seen.lock(), vec![first, second]);
        assert!(registration.is_active());
    }

    #[tokio::test]
    async fn test_no_delivery_after_unsubscribe() {
        let store = make_store();
        let fields = FieldMapping::default();
        let query = Query::newest_first("messages", &fields);

        let calls = Arc::new(Mutex::new(0));
        let (registration, listening) = on_snapshot(&store, &query, &fields, {
            let calls = Arc::clone(&calls);
            move |_, _| *calls.lock() += 1
        });

        // the initial snapshot is already queued when we unsubscribe
        registration.unsubscribe();
        assert!(!registration.is_active());
        listening.await;

        store.emit("messages");
        store
            .append("messages", &fields, NewRecord::from_draft("late").unwrap())
            .await
            .expect("append failed");

        assert_eq!(*calls.lock(), 0);
        assert_eq!(store.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_drop_releases_listener() {
        let store = make_store();
        let fields = FieldMapping::default();
        let query = Query::newest_first("messages", &fields);

        for _ in 0..3 {
            let (registration, listening) = on_snapshot(&store, &query, &fields, |_, _| {});
            let task = tokio::spawn(listening);
            settle().await;
            assert_eq!(store.listener_count(), 1);

            drop(registration);
            task.await.expect("listener task panicked");
            assert_eq!(store.listener_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let store = make_store();
        let fields = FieldMapping::default();
        let query = Query::newest_first("messages", &fields);

        let (a, _) = on_snapshot(&store, &query, &fields, |_, _| {});
        let (b, _) = on_snapshot(&store, &query, &fields, |_, _| {});
        assert_ne!(a.id(), b.id());
    }
}
