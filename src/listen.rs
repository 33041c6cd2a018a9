use std::any::TypeId;
use std::convert::Infallible;

use docstorecl::client::listener::{on_snapshot, ListenerId};
use docstorecl::client::Client;
use docstorecl::model::{FieldMapping, Query, Snapshot};
use futures::channel::mpsc;
use futures::{future, select, FutureExt, SinkExt, StreamExt};
use iced::{subscription, Subscription};

#[derive(Debug, Clone)]
pub enum FeedMessage {
    /// A listener started; its snapshots follow.
    Attached(ListenerId),
    Snapshot(ListenerId, Snapshot),
    /// The upstream stream ended. The feed keeps its last records.
    Detached(ListenerId),
}

async fn feed_service(
    mut output: mpsc::Sender<FeedMessage>,
    store: Client,
    query: Query,
    fields: FieldMapping,
) -> Infallible {
    let (sender, mut snapshots) = mpsc::unbounded();
    let (registration, listening) = on_snapshot(&store, &query, &fields, move |id, snapshot| {
        let _ = sender.unbounded_send((id, snapshot));
    });
    let id = registration.id();

    let _ = output.send(FeedMessage::Attached(id)).await;

    let mut listening = listening.fuse();
    loop {
        select! {
            () = listening => break,
            (id, snapshot) = snapshots.select_next_some() => {
                let _ = output.send(FeedMessage::Snapshot(id, snapshot)).await;
            }
        }
    }

    while let Some((id, snapshot)) = snapshots.next().await {
        let _ = output.send(FeedMessage::Snapshot(id, snapshot)).await;
    }

    log::warn!("feed for {} ended", query.collection);
    drop(registration);
    let _ = output.send(FeedMessage::Detached(id)).await;

    future::pending().await
}

/// Listens to a board's collection for as long as the subscription is kept.
/// `key` tells apart boards that read the same collection.
pub fn feed(key: usize, store: Client, query: Query, fields: FieldMapping) -> Subscription<FeedMessage> {
    struct Feed;

    subscription::channel(
        (TypeId::of::<Feed>(), key, query.clone(), fields.clone()),
        50,
        move |output| feed_service(output, store, query, fields),
    )
}
