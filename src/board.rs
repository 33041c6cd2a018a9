//! The message board view-model: a draft, a live feed and a pager, with no
//! ties to any UI toolkit.

use std::error::Error;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone, Utc};
use docstorecl::client::listener::ListenerId;
use docstorecl::client::DocumentStore;
use docstorecl::errors::ErrorWithCauses;
use docstorecl::model::{NewRecord, Query, Record, RecordId, Snapshot};
use docstorecl::platform::BoxFuture;

use crate::config::BoardConfig;
use crate::feed::Feed;
use crate::paginator::{Page, Pager};

/// How long the thank-you banner stays up after a successful submission.
pub const ACK_DURATION: Duration = Duration::from_secs(3);

/// Layout for creation times, shown in the local time zone. chrono has no
/// locale-aware formatting without its `unstable-locales` feature.
const LOCAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Identifies one acknowledgment, so an old timer cannot hide a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckToken(u64);

#[derive(Debug)]
pub struct Board {
    config: BoardConfig,
    feed: Feed,
    pager: Pager,
    draft: String,
    ack: Option<AckToken>,
    next_ack: u64,
    in_flight: usize,
}

impl Board {
    pub fn new(config: BoardConfig) -> Self {
        let pager = Pager::new(config.page_size)
            .out_of_range(config.out_of_range)
            .on_shrink(config.on_shrink);
        Self {
            config,
            feed: Feed::default(),
            pager,
            draft: String::new(),
            ack: None,
            next_ack: 0,
            in_flight: 0,
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn query(&self) -> Query {
        self.config.query()
    }

    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn edit(&mut self, text: String) {
        self.draft = text;
    }

    pub fn can_submit(&self) -> bool {
        NewRecord::from_draft(&self.draft).is_some()
    }

    /// Submissions sent but not answered yet. Nothing stops a user from
    /// sending the same text twice.
    pub fn pending_submissions(&self) -> usize {
        self.in_flight
    }

    /// Starts appending the draft to the board's collection. Returns `None`
    /// for a blank draft. The draft is only cleared once the store confirms.
    pub fn begin_submit<S>(&mut self, store: &S) -> Option<BoxFuture<'static, Result<RecordId, S::Error>>>
    where
        S: DocumentStore,
    {
        let record = NewRecord::from_draft(&self.draft)?;
        self.in_flight += 1;
        Some(store.append(&self.config.collection, &self.config.fields, record))
    }

    pub fn submit_succeeded(&mut self, id: &RecordId) -> AckToken {
        self.in_flight = self.in_flight.saturating_sub(1);
        log::debug!("{id} stored in {}", self.config.collection);
        self.draft.clear();

        let token = AckToken(self.next_ack);
        self.next_ack += 1;
        self.ack = Some(token);
        token
    }

    /// The failure is only logged: the draft stays and no banner is shown.
    pub fn submit_failed<E: Error>(&mut self, err: &E) {
        self.in_flight = self.in_flight.saturating_sub(1);
        log::error!(
            "error submitting message to {}: {}",
            self.config.collection,
            ErrorWithCauses(err)
        );
    }

    pub fn ack_expired(&mut self, token: AckToken) {
        if self.ack == Some(token) {
            self.ack = None;
        }
    }

    pub fn is_acknowledged(&self) -> bool {
        self.ack.is_some()
    }

    /// Called when the view starts listening. A listener the board was
    /// already unmounted from is refused.
    pub fn mount(&mut self, listener: ListenerId) -> bool {
        self.feed.attach(listener)
    }

    /// Called when the view stops listening. Snapshots still on their way
    /// from the old listener are ignored from here on.
    pub fn unmount(&mut self) {
        self.feed.detach();
    }

    /// Replaces the feed if the snapshot comes from the mounted listener.
    pub fn apply_snapshot(&mut self, listener: ListenerId, snapshot: Snapshot) -> bool {
        if !self.feed.apply(listener, snapshot) {
            return false;
        }
        let total = self.total_pages();
        if self.pager.feed_resized(total) {
            log::debug!("feed shrank, now on page {}", self.pager.current());
        }
        true
    }

    pub fn total_pages(&self) -> usize {
        self.pager.total_pages(self.feed.len())
    }

    pub fn page(&self) -> Page<'_, Record> {
        self.pager.page(self.feed.records())
    }

    pub fn go_to(&mut self, page: usize) -> bool {
        let total = self.total_pages();
        self.pager.go_to(page, total)
    }

    pub fn next_page(&mut self) -> bool {
        let total = self.total_pages();
        self.pager.next(total)
    }

    pub fn prev_page(&mut self) -> bool {
        let total = self.total_pages();
        self.pager.prev(total)
    }
}

/// Renders a creation time in the local time zone.
pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    format_timestamp_in(ts, &Local)
}

pub fn format_timestamp_in<Tz>(ts: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match ts {
        Some(ts) => ts.with_timezone(tz).format(LOCAL_TIMESTAMP_FORMAT).to_string(),
        None => "pending".to_string(),
    }
}
