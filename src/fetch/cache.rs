//! Response cache.
//!
//! Successful payloads are kept in memory for a fixed TTL and, when a cache
//! directory is configured, mirrored to disk so a restarted process can reuse
//! them. Failures are never cached.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, warn};

use super::ResourceKind;

/// Cache key: the resource kind plus its normalized id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub kind: ResourceKind,
    pub id: String,
}

impl CacheKey {
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

struct MemoryEntry {
    payload: Arc<Value>,
    stored_at: Instant,
}

/// Expiring map of fetched payloads.
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, MemoryEntry>>,
    disk: Option<DiskCache>,
}

impl ResponseCache {
    /// Memory-only cache.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
            disk: None,
        }
    }

    /// Memory cache backed by a directory on disk.
    pub fn with_disk(ttl: Duration, dir: impl Into<PathBuf>) -> Self {
        Self {
            disk: Some(DiskCache {
                dir: dir.into(),
                ttl,
            }),
            ..Self::new(ttl)
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, MemoryEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fresh payload for `key`, checking memory first and then disk.
    pub async fn get(&self, key: &CacheKey) -> Option<Arc<Value>> {
        if let Some(payload) = self.get_memory(key) {
            debug!("memory cache hit for {:?}", key);
            return Some(payload);
        }

        let disk = self.disk.as_ref()?;
        let (payload, fetched_at) = disk.read(key).await?;
        debug!("disk cache hit for {:?} (fetched {})", key, fetched_at);

        // Only keep the remaining part of the TTL in memory.
        let age = (Utc::now() - fetched_at).to_std().unwrap_or_default();
        let stored_at = Instant::now()
            .checked_sub(age)
            .unwrap_or_else(Instant::now);
        let payload = Arc::new(payload);
        self.lock().insert(
            key.clone(),
            MemoryEntry {
                payload: Arc::clone(&payload),
                stored_at,
            },
        );
        Some(payload)
    }

    fn get_memory(&self, key: &CacheKey) -> Option<Arc<Value>> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(Arc::clone(&entry.payload)),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a payload, replacing any previous one for the key.
    ///
    /// Expired entries for other keys are swept out on the way in.
    pub async fn insert(&self, key: CacheKey, payload: Arc<Value>) {
        if let Some(disk) = &self.disk {
            if let Err(e) = disk.write(&key, &payload).await {
                warn!("failed to write disk cache entry for {:?}: {}", key, e);
            }
        }

        let ttl = self.ttl;
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| e.stored_at.elapsed() < ttl);
        if entries.len() < before {
            debug!("evicted {} expired cache entries", before - entries.len());
        }
        entries.insert(
            key,
            MemoryEntry {
                payload,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop a key from memory and disk.
    pub async fn invalidate(&self, key: &CacheKey) {
        self.lock().remove(key);
        if let Some(disk) = &self.disk {
            disk.remove(key).await;
        }
    }

    /// Number of in-memory entries (fresh or not yet evicted).
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What is written to disk for each entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DiskEntry {
    kind: ResourceKind,
    id: String,
    fetched_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    payload: Value,
}

struct DiskCache {
    dir: PathBuf,
    ttl: Duration,
}

impl DiskCache {
    fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir
            .join(key.kind.as_str())
            .join(format!("{}.json", Self::id_hash(&key.id)))
    }

    /// Hash an id to a short, filesystem-safe string.
    fn id_hash(id: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(id.as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..8])
    }

    async fn read(&self, key: &CacheKey) -> Option<(Value, DateTime<Utc>)> {
        let path = self.path_for(key);
        let content = fs::read_to_string(&path).await.ok()?;
        let entry: DiskEntry = match serde_json::from_str(&content) {
            Ok(e) => e,
            Err(e) => {
                warn!("ignoring corrupt cache file {}: {}", path.display(), e);
                return None;
            }
        };

        // Guard against hash collisions.
        if entry.kind != key.kind || entry.id != key.id {
            return None;
        }
        if Utc::now() >= entry.expires_at {
            debug!("disk cache expired for {:?}", key);
            return None;
        }

        Some((entry.payload, entry.fetched_at))
    }

    async fn write(&self, key: &CacheKey, payload: &Value) -> std::io::Result<()> {
        let path = self.path_for(key);
        ensure_parent(&path).await?;

        let fetched_at = Utc::now();
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero());
        let entry = DiskEntry {
            kind: key.kind,
            id: key.id.clone(),
            fetched_at,
            expires_at: fetched_at + ttl,
            payload: payload.clone(),
        };

        let json = serde_json::to_string(&entry)?;
        fs::write(&path, json).await
    }

    async fn remove(&self, key: &CacheKey) {
        let _ = fs::remove_file(self.path_for(key)).await;
    }
}

async fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent).await,
        None => Ok(()),
    }
}
