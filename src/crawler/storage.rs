use quick_xml::{de::from_str, se::to_string};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::{io, path::Path, path::PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::bilibili::ContentHandle;

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding the cache records
    pub base_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("danmaku_data"),
        }
    }
}

/// Identity of one cache record: discovery position plus handle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    /// 1-based discovery index
    pub index: usize,

    pub handle: ContentHandle,
}

impl RecordKey {
    pub fn new(index: usize, handle: ContentHandle) -> Self {
        Self { index, handle }
    }

    /// File name of the record, e.g. `007_BV1xx411c7mD.xml`
    pub fn file_name(&self) -> String {
        // Replace non-alphanumeric characters with underscores
        let safe_handle = self
            .handle
            .as_str()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect::<String>();
        format!("{:03}_{}.xml", self.index, safe_handle)
    }
}

/// XML representation of a cache record
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename = "record")]
pub struct RecordFile {
    /// Handle the record belongs to
    pub handle: String,

    /// Normalized comments in fetch order
    #[serde(rename = "comment", default)]
    pub comments: Vec<String>,
}

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("XML serialization error: {0}")]
    SerializeError(#[from] quick_xml::errors::serialize::SeError),

    #[error("XML deserialization error: {0}")]
    DeserializeError(#[from] quick_xml::errors::serialize::DeError),

    #[error("Record belongs to {found}, expected {expected}")]
    HandleMismatch { expected: String, found: String },
}

type Result<T> = std::result::Result<T, StorageError>;

/// Persistent per-video record storage
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    /// Whether a record exists for `key`
    async fn exists(&self, key: &RecordKey) -> Result<bool>;

    /// Load the stored comments for `key`
    async fn load(&self, key: &RecordKey) -> Result<Vec<String>>;

    /// Persist `comments` as the record for `key`
    async fn save(&self, key: &RecordKey, comments: &[String]) -> Result<()>;
}

/// Filesystem storage, one XML file per record
#[derive(Debug, Clone)]
pub struct Storage {
    config: StorageConfig,
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage {
    /// Create a new storage with default configuration
    pub fn new() -> Self {
        Self {
            config: StorageConfig::default(),
        }
    }

    /// Create a new storage with custom configuration
    pub fn with_config(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Gets the storage path for a record
    pub fn get_storage_path(&self, key: &RecordKey) -> PathBuf {
        self.config.base_path.join(key.file_name())
    }

    /// Creates necessary directories for storage
    async fn ensure_directories(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

impl RecordStore for Storage {
    async fn exists(&self, key: &RecordKey) -> Result<bool> {
        Ok(fs::try_exists(self.get_storage_path(key)).await?)
    }

    async fn load(&self, key: &RecordKey) -> Result<Vec<String>> {
        let xml_content = fs::read_to_string(self.get_storage_path(key)).await?;
        let record: RecordFile = from_str(&xml_content)?;

        if record.handle != key.handle.as_str() {
            return Err(StorageError::HandleMismatch {
                expected: key.handle.to_string(),
                found: record.handle,
            });
        }
        Ok(record.comments)
    }

    async fn save(&self, key: &RecordKey, comments: &[String]) -> Result<()> {
        let storage_path = self.get_storage_path(key);
        self.ensure_directories(&storage_path).await?;

        let record = RecordFile {
            handle: key.handle.to_string(),
            comments: comments.to_vec(),
        };
        let xml = to_string(&record)?;

        // Write next to the target and rename so a crash never leaves a
        // truncated file that later runs would treat as authoritative
        let partial_path = storage_path.with_extension("xml.partial");
        fs::write(
            &partial_path,
            format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", xml),
        )
        .await?;
        fs::rename(&partial_path, &storage_path).await?;
        Ok(())
    }
}

/// In-memory storage keyed by record file name
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<String, Vec<String>>>>,
    writes: Arc<Mutex<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record without counting it as a write
    pub async fn insert(&self, key: &RecordKey, comments: Vec<String>) {
        self.records.lock().await.insert(key.file_name(), comments);
    }

    /// Stored comments for `key`, if any
    pub async fn get(&self, key: &RecordKey) -> Option<Vec<String>> {
        self.records.lock().await.get(&key.file_name()).cloned()
    }

    /// Number of `save` calls so far
    pub async fn writes(&self) -> usize {
        *self.writes.lock().await
    }
}

impl RecordStore for MemoryStore {
    async fn exists(&self, key: &RecordKey) -> Result<bool> {
        Ok(self.records.lock().await.contains_key(&key.file_name()))
    }

    async fn load(&self, key: &RecordKey) -> Result<Vec<String>> {
        self.records
            .lock()
            .await
            .get(&key.file_name())
            .cloned()
            .ok_or_else(|| {
                StorageError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no record {}", key.file_name()),
                ))
            })
    }

    async fn save(&self, key: &RecordKey, comments: &[String]) -> Result<()> {
        self.records
            .lock()
            .await
            .insert(key.file_name(), comments.to_vec());
        *self.writes.lock().await += 1;
        Ok(())
    }
}
