//! Firestore over its REST API.
//!
//! Appends go through `documents:commit` with a `REQUEST_TIME` transform on
//! the timestamp field. The REST API has no push channel, so listening polls
//! `documents:runQuery` and yields a snapshot whenever the result changes.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::{stream, Stream};
use reqwest::header::USER_AGENT;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use super::{DocumentStore, SnapshotStream};
use crate::model::value::{Document, Value};
use crate::model::{Direction, FieldMapping, NewRecord, Query, RecordId, Snapshot};
use crate::platform::{self, BoxFuture, Sleeper};

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1/";
pub const DEFAULT_DATABASE: &str = "(default)";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("http error")]
    Http(#[from] reqwest::Error),
    #[error("invalid Firestore URL: {0}")]
    InvalidUrl(Url),
    #[error("could not parse URL")]
    UrlParse(#[from] url::ParseError),
    #[error("serialization error")]
    Serialization(#[from] serde_json::Error),
    #[error("firestore returned {code}: {message}")]
    Status { code: u16, message: String },
}

/// Where the database lives and how often to poll it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub database: String,
    pub api_key: Option<String>,
    /// The REST root, e.g. `http://localhost:8080/v1/` for the emulator.
    pub base_url: Option<Url>,
    pub poll_interval: Duration,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database: DEFAULT_DATABASE.to_string(),
            api_key: None,
            base_url: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Clone)]
pub struct Firestore {
    http: Client,
    base_url: Url,
    project_id: String,
    database: String,
    api_key: Option<String>,
    user_agent: String,
    poll_interval: Duration,
    sleep: Sleeper,
}

impl fmt::Debug for Firestore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Firestore")
            .field("base_url", &self.base_url.as_str())
            .field("project_id", &self.project_id)
            .field("database", &self.database)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

// request bodies

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommitRequest<'a> {
    writes: Vec<Write<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Write<'a> {
    update: Document,
    update_transforms: Vec<FieldTransform<'a>>,
    current_document: Precondition,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldTransform<'a> {
    field_path: &'a str,
    set_to_server_value: ServerValue,
}

#[derive(Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum ServerValue {
    RequestTime,
}

#[derive(Serialize)]
struct Precondition {
    exists: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunQueryRequest<'a> {
    structured_query: StructuredQuery<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StructuredQuery<'a> {
    from: [CollectionSelector<'a>; 1],
    order_by: [Order<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionSelector<'a> {
    collection_id: &'a str,
}

#[derive(Serialize)]
struct Order<'a> {
    field: FieldReference<'a>,
    direction: Direction,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldReference<'a> {
    field_path: &'a str,
}

// response bodies

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunQueryResponse {
    document: Option<Document>,
    read_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorStatus,
}

#[derive(Deserialize)]
struct ErrorStatus {
    message: String,
}

impl Firestore {
    /// `sleep` is the timer used between polls.
    pub fn new(config: FirestoreConfig, user_agent: String, sleep: Sleeper) -> Result<Self, Error> {
        let base_url = match config.base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_BASE_URL)?,
        };
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(base_url));
        }

        Ok(Self {
            http: Client::new(),
            base_url,
            project_id: config.project_id,
            database: config.database,
            api_key: config.api_key,
            user_agent,
            poll_interval: config.poll_interval,
            sleep,
        })
    }

    /// `projects/<project>/databases/<database>/documents`
    fn documents_path(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database
        )
    }

    fn endpoint(&self, method: &str) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        let last = format!("documents:{method}");
        let Ok(mut segments) = url.path_segments_mut() else {
            return Err(Error::InvalidUrl(self.base_url.clone()));
        };

        segments.pop_if_empty().extend([
            "projects",
            self.project_id.as_str(),
            "databases",
            self.database.as_str(),
            last.as_str(),
        ]);

        drop(segments);

        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }

        Ok(url)
    }

    fn commit_body<'a>(
        &self,
        collection: &str,
        fields: &'a FieldMapping,
        id: &RecordId,
        record: NewRecord,
    ) -> CommitRequest<'a> {
        let mut values = HashMap::new();
        values.insert(fields.text.clone(), Value::StringValue(record.text));

        CommitRequest {
            writes: vec![Write {
                update: Document {
                    name: format!("{}/{collection}/{id}", self.documents_path()),
                    fields: values,
                    ..Default::default()
                },
                update_transforms: vec![FieldTransform {
                    field_path: &fields.created_at,
                    set_to_server_value: ServerValue::RequestTime,
                }],
                current_document: Precondition { exists: false },
            }],
        }
    }

    async fn check(res: Response) -> Result<Response, Error> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let message = match res.json::<ErrorResponse>().await {
            Ok(body) => body.error.message,
            Err(_) => status.canonical_reason().unwrap_or_default().to_string(),
        };

        Err(Error::Status {
            code: status.as_u16(),
            message,
        })
    }

    /// Appends a record with a server-assigned timestamp. The document id is
    /// generated here, as the Firestore SDKs do.
    pub async fn create(
        &self,
        collection: &str,
        fields: &FieldMapping,
        record: NewRecord,
    ) -> Result<RecordId, Error> {
        let id = RecordId::generate();
        let body = self.commit_body(collection, fields, &id, record);

        let res = self
            .http
            .post(self.endpoint("commit")?)
            .header(USER_AGENT, &self.user_agent)
            .json(&body)
            .send()
            .await?;
        Self::check(res).await?;

        log::debug!("committed {collection}/{id}");
        Ok(id)
    }

    /// Runs `query` once and returns the whole ordered result.
    pub async fn run_query(&self, query: &Query, fields: &FieldMapping) -> Result<Snapshot, Error> {
        let body = RunQueryRequest {
            structured_query: StructuredQuery {
                from: [CollectionSelector {
                    collection_id: &query.collection,
                }],
                order_by: [Order {
                    field: FieldReference {
                        field_path: &query.order_by,
                    },
                    direction: query.direction,
                }],
            },
        };

        let res = self
            .http
            .post(self.endpoint("runQuery")?)
            .header(USER_AGENT, &self.user_agent)
            .json(&body)
            .send()
            .await?;
        let items: Vec<RunQueryResponse> = Self::check(res).await?.json().await?;

        Ok(to_snapshot(items, fields))
    }

    fn poll_snapshots(
        &self,
        query: Query,
        fields: FieldMapping,
    ) -> impl Stream<Item = Result<Snapshot, Error>> {
        let store = self.clone();
        let fetch = move || {
            let store = store.clone();
            let query = query.clone();
            let fields = fields.clone();
            async move { store.run_query(&query, &fields).await }
        };
        poll_changes(fetch, self.sleep.clone(), self.poll_interval)
    }
}

/// Calls `fetch` right away and then after every `interval`. A snapshot is
/// only yielded when its records differ from the last one yielded. Errors are
/// yielded as they come and polling goes on.
fn poll_changes<F, Fut, E>(
    fetch: F,
    sleep: Sleeper,
    interval: Duration,
) -> impl Stream<Item = Result<Snapshot, E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Snapshot, E>>,
{
    struct PollState<F> {
        fetch: F,
        sleep: Sleeper,
        interval: Duration,
        last: Option<Snapshot>,
        first: bool,
    }

    let state = PollState {
        fetch,
        sleep,
        interval,
        last: None,
        first: true,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if !state.first {
                (state.sleep)(state.interval).await;
            }
            state.first = false;

            match (state.fetch)().await {
                Ok(snapshot) => {
                    if state
                        .last
                        .as_ref()
                        .is_some_and(|last| last.same_records(&snapshot))
                    {
                        continue;
                    }
                    state.last = Some(snapshot.clone());
                    return Some((Ok(snapshot), state));
                }
                Err(e) => return Some((Err(e), state)),
            }
        }
    })
}

fn to_snapshot(items: Vec<RunQueryResponse>, fields: &FieldMapping) -> Snapshot {
    let read_time = items.iter().filter_map(|item| item.read_time).max();
    let records = items
        .into_iter()
        .filter_map(|item| item.document)
        .map(|doc| doc.to_record(fields))
        .collect();
    Snapshot::new(records, read_time)
}

impl DocumentStore for Firestore {
    type Error = Error;

    fn listen(&self, query: &Query, fields: &FieldMapping) -> SnapshotStream<Error> {
        platform::boxed_stream(self.poll_snapshots(query.clone(), fields.clone()))
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
        platform::boxed(async move { store.create(&collection, &fields, record).await })
    }
}
