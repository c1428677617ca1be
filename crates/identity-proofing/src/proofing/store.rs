use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::vendor_result::VendorResult;

const MAX_RESULT_ID_LEN: usize = 128;

/// Opaque correlation token minted by the request path that started proofing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResultId(String);

impl ResultId {
    pub fn mint() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Ids arrive from other processes, so they are restricted to a filename-safe alphabet.
    pub fn parse(raw: impl Into<String>) -> Result<Self, StoreError> {
        let raw = raw.into();
        let valid = !raw.is_empty()
            && raw.len() <= MAX_RESULT_ID_LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(raw))
        } else {
            Err(StoreError::InvalidId(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ResultId {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ResultId> for String {
    fn from(value: ResultId) -> Self {
        value.0
    }
}

/// A stored result together with its write time, used for retention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub result_id: ResultId,
    pub result: VendorResult,
    pub stored_at: DateTime<Utc>,
}

impl ResultEntry {
    pub fn new(result_id: ResultId, result: VendorResult) -> Self {
        Self {
            result_id,
            result,
            stored_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now.signed_duration_since(self.stored_at) >= ttl,
            Err(_) => false,
        }
    }
}

/// Key/value persistence for proofing outcomes.
///
/// A second `store` for the same id replaces the first. Entries older than the store's
/// retention window read as absent.
pub trait ResultStore: Send + Sync {
    fn store(&self, result_id: &ResultId, result: VendorResult) -> Result<(), StoreError>;
    fn load(&self, result_id: &ResultId) -> Result<Option<ResultEntry>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid result id '{0}'")]
    InvalidId(String),
    #[error("result store unavailable: {0}")]
    Unavailable(String),
    #[error("result store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored result is unreadable: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Process-local store; suitable for tests and single-process in-process execution.
#[derive(Debug, Clone)]
pub struct InMemoryResultStore {
    entries: Arc<Mutex<HashMap<ResultId, ResultEntry>>>,
    ttl: Duration,
}

impl InMemoryResultStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::default(),
            ttl,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<ResultId, ResultEntry>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Unavailable("result store mutex poisoned".to_string()))
    }
}

impl ResultStore for InMemoryResultStore {
    fn store(&self, result_id: &ResultId, result: VendorResult) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let now = Utc::now();
        guard.retain(|_, entry| !entry.is_expired(self.ttl, now));
        guard.insert(result_id.clone(), ResultEntry::new(result_id.clone(), result));
        Ok(())
    }

    fn load(&self, result_id: &ResultId) -> Result<Option<ResultEntry>, StoreError> {
        let mut guard = self.lock()?;
        match guard.get(result_id) {
            Some(entry) if entry.is_expired(self.ttl, Utc::now()) => {
                guard.remove(result_id);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.clone())),
            None => Ok(None),
        }
    }
}

/// One JSON file per result id in a shared directory.
///
/// Writes go to a unique temporary file that is renamed into place, so concurrent writers in
/// different processes never interleave and readers only observe complete entries.
#[derive(Debug, Clone)]
pub struct FileResultStore {
    dir: PathBuf,
    ttl: Duration,
}

impl FileResultStore {
    pub fn open(dir: impl Into<PathBuf>, ttl: Duration) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, ttl })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, result_id: &ResultId) -> PathBuf {
        self.dir.join(format!("{result_id}.json"))
    }
}

impl ResultStore for FileResultStore {
    fn store(&self, result_id: &ResultId, result: VendorResult) -> Result<(), StoreError> {
        let entry = ResultEntry::new(result_id.clone(), result);
        let payload = serde_json::to_vec(&entry)?;
        let staging = self
            .dir
            .join(format!(".{result_id}.{}.tmp", uuid::Uuid::new_v4()));
        std::fs::write(&staging, payload)?;
        if let Err(err) = std::fs::rename(&staging, self.path_for(result_id)) {
            let _ = std::fs::remove_file(&staging);
            return Err(err.into());
        }
        Ok(())
    }

    fn load(&self, result_id: &ResultId) -> Result<Option<ResultEntry>, StoreError> {
        let path = self.path_for(result_id);
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let entry: ResultEntry = serde_json::from_slice(&raw)?;
        if entry.is_expired(self.ttl, Utc::now()) {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
            return Ok(None);
        }
        Ok(Some(entry))
    }
}
