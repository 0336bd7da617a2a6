//! Content-addressed claim cache (C2).
//!
//! Keys are the SHA-256 hex digest of the material that produced a cached
//! value (e.g. a chunk's text plus the model id that extracted claims from
//! it), so a cache hit means "this exact input was already processed by
//! this exact model," not merely "a file with this name exists."
//!
//! Entries are stored as `<root>/<key>.json` (§4.2: the structured,
//! machine-readable representation is the sole authoritative cache form —
//! no XML mirror). Writes go to a temp file in the same directory and are
//! renamed into place, so a reader never observes a partially written
//! entry: `get` sees either the old value or the new one, never a torn
//! write. A metadata sidecar at `<root>/<key>.meta.json` records when the
//! entry was written and what produced it.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Metadata stored alongside a cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntryMeta {
    pub key: String,
    pub created_at: DateTime<Utc>,
    /// Free-form label identifying what produced this entry (e.g. a model
    /// id or tool name), surfaced for debugging cache hit/miss behavior.
    pub source: String,
}

/// Cache hit/miss/write counters for one cache instance's lifetime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    /// Entries deleted because their JSON failed to parse.
    pub healed: u64,
}

/// Content-addressed, filesystem-backed cache for extracted claims and
/// verification verdicts.
pub struct ClaimCache {
    root: PathBuf,
    stats: std::sync::Mutex<CacheStats>,
}

impl ClaimCache {
    /// Open (creating if needed) a cache rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            stats: std::sync::Mutex::new(CacheStats::default()),
        })
    }

    /// Compute the content-addressed key for a piece of cache material.
    /// Callers combine whatever makes an entry uniquely reusable (chunk
    /// text, model id, prompt version) into `material` before hashing.
    pub fn compute_key(material: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(material.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.meta.json"))
    }

    /// Look up a cached value by key. A corrupt entry (unparseable JSON)
    /// is deleted and treated as a miss rather than surfaced as an error,
    /// so one damaged file can't wedge the pipeline.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.entry_path(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.stats.lock().unwrap().misses += 1;
                return Ok(None);
            }
            Err(e) => return Err(Error::from(e)),
        };

        match serde_json::from_str::<T>(&raw) {
            Ok(value) => {
                self.stats.lock().unwrap().hits += 1;
                Ok(Some(value))
            }
            Err(_) => {
                let _ = fs::remove_file(&path);
                let _ = fs::remove_file(self.meta_path(key));
                let mut stats = self.stats.lock().unwrap();
                stats.healed += 1;
                stats.misses += 1;
                Ok(None)
            }
        }
    }

    /// Store a value under `key`. Writes are staged to a temp file in the
    /// same directory and renamed into place so readers never see a
    /// partial write.
    pub fn put<T: Serialize>(&self, key: &str, value: &T, source: impl Into<String>) -> Result<()> {
        let serialized = serde_json::to_vec_pretty(value)?;
        write_atomic(&self.entry_path(key), &serialized)?;

        let meta = CacheEntryMeta {
            key: key.to_string(),
            created_at: Utc::now(),
            source: source.into(),
        };
        let meta_bytes = serde_json::to_vec_pretty(&meta)?;
        write_atomic(&self.meta_path(key), &meta_bytes)?;

        self.stats.lock().unwrap().writes += 1;
        Ok(())
    }

    /// Fetch-or-compute: return the cached value for `key` if present,
    /// otherwise call `compute`, store its result, and return it.
    pub fn get_or_insert_with<T, F>(&self, key: &str, source: impl Into<String>, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        if let Some(value) = self.get::<T>(key)? {
            return Ok(value);
        }
        let value = compute()?;
        self.put(key, &value, source)?;
        Ok(value)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.lock().unwrap().clone()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().ok_or_else(|| Error::cache("cache entry path has no parent directory"))?;
    let mut tmp = tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    let tmp_path = tmp.into_temp_path();
    tmp_path
        .persist(path)
        .map_err(|e| Error::cache(format!("failed to persist cache entry: {e}")))?;
    Ok(())
}

fn tempfile_in(dir: &Path) -> Result<tempfile::NamedTempFile> {
    tempfile::NamedTempFile::new_in(dir).map_err(Error::from)
}
