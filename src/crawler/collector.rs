//! Cache-aware collection of comment entries
//!
//! Collection runs in two phases. The decision phase is pure: given each
//! handle's record key and whether a record already exists, `plan_collection`
//! decides which handles are served from the cache and which are fetched.
//! The execution phase then performs the reads, network calls and writes in
//! discovery order, one handle at a time.

use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::bilibili::{ApiClient, ContentHandle};
use crate::crawler::error::CrawlError;
use crate::crawler::normalize::normalize;
use crate::crawler::pacing::Pacer;
use crate::crawler::storage::{RecordKey, RecordStore};
use crate::http::Transport;

/// What to do for one handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectStep {
    /// A record exists and is authoritative; no network activity
    UseCached(RecordKey),

    /// Resolve, fetch, normalize and persist
    Fetch(RecordKey),
}

impl CollectStep {
    pub fn key(&self) -> &RecordKey {
        match self {
            CollectStep::UseCached(key) | CollectStep::Fetch(key) => key,
        }
    }
}

/// Outcome for one handle
#[derive(Debug)]
pub enum ItemOutcome {
    /// Served from an existing record
    Cached { entries: usize },

    /// Fetched and persisted
    Fetched { title: String, entries: usize },

    /// Skipped; contributed nothing to the corpus
    Failed { error: CrawlError },
}

/// Coarse status sent with progress updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Cached,
    Fetched,
    Failed,
}

impl From<&ItemOutcome> for ItemStatus {
    fn from(outcome: &ItemOutcome) -> Self {
        match outcome {
            ItemOutcome::Cached { .. } => ItemStatus::Cached,
            ItemOutcome::Fetched { .. } => ItemStatus::Fetched,
            ItemOutcome::Failed { .. } => ItemStatus::Failed,
        }
    }
}

/// Progress update sent after each handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectProgress {
    /// 1-based discovery index
    pub index: usize,
    pub total: usize,
    pub handle: ContentHandle,
    pub status: ItemStatus,
}

/// Per-handle report
#[derive(Debug)]
pub struct ItemReport {
    pub key: RecordKey,
    pub outcome: ItemOutcome,
}

/// Result of a collection run
#[derive(Debug, Default)]
pub struct Collection {
    /// Every collected entry in discovery order
    pub corpus: Vec<String>,

    /// One report per handle, in discovery order
    pub items: Vec<ItemReport>,
}

impl Collection {
    fn count(&self, status: ItemStatus) -> usize {
        self.items
            .iter()
            .filter(|item| ItemStatus::from(&item.outcome) == status)
            .count()
    }

    pub fn cached(&self) -> usize {
        self.count(ItemStatus::Cached)
    }

    pub fn fetched(&self) -> usize {
        self.count(ItemStatus::Fetched)
    }

    pub fn failed(&self) -> usize {
        self.count(ItemStatus::Failed)
    }
}

/// Record keys for handles in discovery order, indexed from 1
pub fn record_keys(handles: &[ContentHandle]) -> Vec<RecordKey> {
    handles
        .iter()
        .enumerate()
        .map(|(i, handle)| RecordKey::new(i + 1, handle.clone()))
        .collect()
}

/// Decide, per key, whether the cache or the network serves it
pub fn plan_collection(presence: Vec<(RecordKey, bool)>) -> Vec<CollectStep> {
    presence
        .into_iter()
        .map(|(key, cached)| {
            if cached {
                CollectStep::UseCached(key)
            } else {
                CollectStep::Fetch(key)
            }
        })
        .collect()
}

/// Resolve a handle and return its title and normalized comments
async fn fetch_entries<T: Transport>(
    client: &ApiClient<T>,
    handle: &ContentHandle,
) -> Result<(String, Vec<String>), CrawlError> {
    let stream = client
        .resolve(handle)
        .await
        .map_err(|source| CrawlError::Resolution {
            handle: handle.clone(),
            source,
        })?;

    let raw = client
        .fetch_comments(&stream)
        .await
        .map_err(|source| CrawlError::Fetch {
            handle: handle.clone(),
            source,
        })?;

    let entries = raw
        .iter()
        .filter(|text| !text.trim().is_empty())
        .map(|text| normalize(text))
        .collect();

    Ok((stream.title, entries))
}

/// Carry out one step, returning the contributed entries and the outcome
async fn execute_step<T, S>(
    client: &ApiClient<T>,
    store: &S,
    step: &CollectStep,
) -> (Vec<String>, ItemOutcome)
where
    T: Transport,
    S: RecordStore,
{
    match step {
        CollectStep::UseCached(key) => match store.load(key).await {
            Ok(entries) => {
                let outcome = ItemOutcome::Cached {
                    entries: entries.len(),
                };
                (entries, outcome)
            }
            Err(source) => (
                Vec::new(),
                ItemOutcome::Failed {
                    error: CrawlError::CacheRead {
                        handle: key.handle.clone(),
                        source,
                    },
                },
            ),
        },
        CollectStep::Fetch(key) => {
            let (title, entries) = match fetch_entries(client, &key.handle).await {
                Ok(fetched) => fetched,
                Err(error) => return (Vec::new(), ItemOutcome::Failed { error }),
            };

            if let Err(source) = store.save(key, &entries).await {
                let error = CrawlError::CacheWrite {
                    handle: key.handle.clone(),
                    source,
                };
                return (Vec::new(), ItemOutcome::Failed { error });
            }

            let outcome = ItemOutcome::Fetched {
                title,
                entries: entries.len(),
            };
            (entries, outcome)
        }
    }
}

/// Collect the corpus for `handles`, consulting the cache first
///
/// # Arguments
///
/// * `client` - The API client used for cache misses
/// * `store` - Record storage; existing records are never re-fetched
/// * `pacer` - Waits between consecutive handles
/// * `handles` - Handles in discovery order
/// * `progress` - Optional channel receiving one update per handle
///
/// # Returns
///
/// The corpus and a report per handle. Per-handle failures are recorded in
/// the reports and never abort the run.
#[instrument(skip_all, fields(handles = handles.len()))]
pub async fn collect<T, S, P>(
    client: &ApiClient<T>,
    store: &S,
    pacer: &P,
    handles: &[ContentHandle],
    progress: Option<mpsc::Sender<CollectProgress>>,
) -> Collection
where
    T: Transport,
    S: RecordStore,
    P: Pacer,
{
    let total = handles.len();

    let mut presence = Vec::with_capacity(total);
    for key in record_keys(handles) {
        let cached = store.exists(&key).await.unwrap_or_else(|e| {
            warn!("Could not check cache for {}: {}", key.file_name(), e);
            false
        });
        presence.push((key, cached));
    }
    let steps = plan_collection(presence);

    let mut collection = Collection::default();
    for (position, step) in steps.iter().enumerate() {
        let key = step.key();
        let (entries, outcome) = execute_step(client, store, step).await;

        match &outcome {
            ItemOutcome::Cached { entries } => {
                info!("{:03}: cached, {} entries, skipping download", key.index, entries)
            }
            ItemOutcome::Fetched { title, entries } => {
                info!("{:03}: {} ({} entries)", key.index, title, entries)
            }
            ItemOutcome::Failed { error } => {
                warn!("{:03}: {} skipped: {}", key.index, key.handle, error)
            }
        }

        collection.corpus.extend(entries);

        if let Some(sender) = &progress {
            let update = CollectProgress {
                index: key.index,
                total,
                handle: key.handle.clone(),
                status: ItemStatus::from(&outcome),
            };
            if sender.send(update).await.is_err() {
                debug!("Progress receiver dropped");
            }
        }

        collection.items.push(ItemReport {
            key: key.clone(),
            outcome,
        });

        if position + 1 < total {
            pacer.pause().await;
        }
    }

    info!(
        "Collected {} entries: {} cached, {} fetched, {} failed",
        collection.corpus.len(),
        collection.cached(),
        collection.fetched(),
        collection.failed()
    );
    collection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endpoints;
    use crate::crawler::pacing::NoPause;
    use crate::crawler::storage::{MemoryStore, Storage, StorageConfig, StorageError};
    use std::io;

    /// Store that has no records and refuses every write
    struct ReadOnlyStore;

    impl RecordStore for ReadOnlyStore {
        async fn exists(&self, _key: &RecordKey) -> Result<bool, StorageError> {
            Ok(false)
        }

        async fn load(&self, key: &RecordKey) -> Result<Vec<String>, StorageError> {
            Err(StorageError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                key.file_name(),
            )))
        }

        async fn save(&self, _key: &RecordKey, _comments: &[String]) -> Result<(), StorageError> {
            Err(StorageError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "read-only file system",
            )))
        }
    }
    use crate::http::mock_transport::MockTransport;

    fn handles(names: &[&str]) -> Vec<ContentHandle> {
        names.iter().map(|h| ContentHandle::new(*h)).collect()
    }

    fn client(mock: &MockTransport) -> ApiClient<MockTransport> {
        ApiClient::new(mock.clone(), Endpoints::with_base("http://test"))
    }

    async fn serve_video(mock: &MockTransport, handle: &str, cid: u64, comments: &[&str]) {
        mock.respond(
            &format!("bvid={handle}"),
            200,
            format!(r#"{{"code":0,"data":{{"cid":{cid},"title":"Video {handle}"}}}}"#),
        )
        .await;
        let body = comments
            .iter()
            .map(|c| format!(r#"<d p="0,1,25,0,0,0,x,1">{c}</d>"#))
            .collect::<String>();
        mock.respond(
            &format!("/{cid}.xml"),
            200,
            format!("<?xml version=\"1.0\"?><i><chatid>{cid}</chatid>{body}</i>"),
        )
        .await;
    }

    #[test]
    fn test_plan_collection() {
        let keys = record_keys(&handles(&["BV1", "BV2", "BV3"]));
        assert_eq!(keys[0].index, 1);
        assert_eq!(keys[2].index, 3);

        let plan = plan_collection(vec![
            (keys[0].clone(), true),
            (keys[1].clone(), false),
            (keys[2].clone(), true),
        ]);
        assert_eq!(
            plan,
            vec![
                CollectStep::UseCached(keys[0].clone()),
                CollectStep::Fetch(keys[1].clone()),
                CollectStep::UseCached(keys[2].clone()),
            ]
        );
    }

    #[tokio::test]
    async fn test_cache_hit_issues_no_requests() {
        let mock = MockTransport::new();
        let store = MemoryStore::new();
        let list = handles(&["BV001"]);
        let cached = vec!["hello".to_string(), "hello".to_string(), "world".to_string()];
        store.insert(&record_keys(&list)[0], cached.clone()).await;

        let collection = collect(&client(&mock), &store, &NoPause, &list, None).await;

        assert_eq!(collection.corpus, cached);
        assert_eq!(collection.cached(), 1);
        assert!(mock.requests().await.is_empty());
        assert_eq!(store.writes().await, 0);
    }

    #[tokio::test]
    async fn test_fetch_normalizes_and_persists() {
        let mock = MockTransport::new();
        serve_video(&mock, "BV002", 2002, &["  foo ", "bar\n", "   ", "a b c"]).await;
        let store = MemoryStore::new();
        let list = handles(&["BV002"]);

        let collection = collect(&client(&mock), &store, &NoPause, &list, None).await;

        assert_eq!(collection.corpus, vec!["foo", "bar", "abc"]);
        assert_eq!(
            store.get(&record_keys(&list)[0]).await.unwrap(),
            vec!["foo", "bar", "abc"]
        );
        match &collection.items[0].outcome {
            ItemOutcome::Fetched { title, entries } => {
                assert_eq!(title, "Video BV002");
                assert_eq!(*entries, 3);
            }
            other => panic!("Expected Fetched, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_partial_failure_is_contained() {
        let mock = MockTransport::new();
        serve_video(&mock, "BV1", 11, &["one"]).await;
        mock.respond("bvid=BV2", 200, r#"{"code":-404,"message":"啥都木有"}"#)
            .await;
        serve_video(&mock, "BV3", 33, &["three", "three"]).await;
        let store = MemoryStore::new();
        let list = handles(&["BV1", "BV2", "BV3"]);

        let collection = collect(&client(&mock), &store, &NoPause, &list, None).await;

        assert_eq!(collection.corpus, vec!["one", "three", "three"]);
        assert_eq!(collection.fetched(), 2);
        assert_eq!(collection.failed(), 1);
        match &collection.items[1].outcome {
            ItemOutcome::Failed { error } => {
                assert!(matches!(error, CrawlError::Resolution { .. }));
                assert_eq!(error.handle().as_str(), "BV2");
                assert!(error.to_string().contains("啥都木有"));
            }
            other => panic!("Expected Failed, got {other:?}"),
        }
        assert!(store.get(&record_keys(&list)[1]).await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_contained() {
        let mock = MockTransport::new();
        mock.respond("bvid=BV1", 200, r#"{"code":0,"data":{"cid":5,"title":"t"}}"#)
            .await;
        mock.respond("/5.xml", 200, "<i><d p=\"1\">broken</x></i>").await;
        let store = MemoryStore::new();

        let collection =
            collect(&client(&mock), &store, &NoPause, &handles(&["BV1"]), None).await;

        assert!(collection.corpus.is_empty());
        assert!(matches!(
            collection.items[0].outcome,
            ItemOutcome::Failed {
                error: CrawlError::Fetch { .. }
            }
        ));
        assert_eq!(store.writes().await, 0);
    }

    #[tokio::test]
    async fn test_empty_video_is_cached_as_empty() {
        let mock = MockTransport::new();
        serve_video(&mock, "BV1", 7, &[]).await;
        let store = MemoryStore::new();
        let list = handles(&["BV1"]);

        let collection = collect(&client(&mock), &store, &NoPause, &list, None).await;

        assert!(collection.corpus.is_empty());
        assert_eq!(collection.fetched(), 1);
        assert_eq!(store.get(&record_keys(&list)[0]).await.unwrap(), Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_resumes_from_partially_populated_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::with_config(StorageConfig {
            base_path: dir.path().to_path_buf(),
        });
        let mock = MockTransport::new();
        serve_video(&mock, "BV1", 1, &["first"]).await;
        serve_video(&mock, "BV2", 2, &["second"]).await;
        let list = handles(&["BV1", "BV2"]);

        let first = collect(&client(&mock), &storage, &NoPause, &list, None).await;
        assert_eq!(first.fetched(), 2);
        let requests_after_first = mock.requests().await.len();

        let second = collect(&client(&mock), &storage, &NoPause, &list, None).await;
        assert_eq!(second.cached(), 2);
        assert_eq!(second.corpus, first.corpus);
        assert_eq!(mock.requests().await.len(), requests_after_first);
    }

    #[tokio::test]
    async fn test_corrupt_record_is_not_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::with_config(StorageConfig {
            base_path: dir.path().to_path_buf(),
        });
        let list = handles(&["BV1"]);
        let path = storage.get_storage_path(&record_keys(&list)[0]);
        assert!(path.ends_with("001_BV1.xml"));
        let garbage = b"<record><handle>BV1</handle><comment>unterminated".to_vec();
        std::fs::write(&path, &garbage).unwrap();

        let mock = MockTransport::new();
        serve_video(&mock, "BV1", 1, &["fresh"]).await;

        let collection = collect(&client(&mock), &storage, &NoPause, &list, None).await;

        assert!(collection.corpus.is_empty());
        assert_eq!(collection.failed(), 1);
        match &collection.items[0].outcome {
            ItemOutcome::Failed { error } => {
                assert!(matches!(error, CrawlError::CacheRead { .. }));
                assert_eq!(error.handle().as_str(), "BV1");
            }
            other => panic!("Expected Failed, got {other:?}"),
        }
        assert!(mock.requests().await.is_empty());
        assert_eq!(std::fs::read(&path).unwrap(), garbage);
    }

    #[tokio::test]
    async fn test_persist_failure_contributes_nothing() {
        let mock = MockTransport::new();
        serve_video(&mock, "BV1", 1, &["one", "two"]).await;
        serve_video(&mock, "BV2", 2, &["three"]).await;

        let collection = collect(
            &client(&mock),
            &ReadOnlyStore,
            &NoPause,
            &handles(&["BV1", "BV2"]),
            None,
        )
        .await;

        assert!(collection.corpus.is_empty());
        assert_eq!(collection.failed(), 2);
        for item in &collection.items {
            assert!(matches!(
                item.outcome,
                ItemOutcome::Failed {
                    error: CrawlError::CacheWrite { .. }
                }
            ));
        }
        assert_eq!(mock.count("/1.xml").await, 1);
    }

    #[tokio::test]
    async fn test_progress_updates() {
        let mock = MockTransport::new();
        serve_video(&mock, "BV1", 1, &["a"]).await;
        let store = MemoryStore::new();
        let list = handles(&["BV1", "BV2"]);
        let (sender, mut receiver) = mpsc::channel(10);

        collect(&client(&mock), &store, &NoPause, &list, Some(sender)).await;

        let first = receiver.recv().await.unwrap();
        assert_eq!(first.index, 1);
        assert_eq!(first.total, 2);
        assert_eq!(first.status, ItemStatus::Fetched);
        let second = receiver.recv().await.unwrap();
        assert_eq!(second.handle.as_str(), "BV2");
        assert_eq!(second.status, ItemStatus::Failed);
        assert!(receiver.recv().await.is_none());
    }
}
