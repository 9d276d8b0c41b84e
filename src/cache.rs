use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use thiserror::Error;
use tokio::sync::OnceCell;

use crate::models::{ArtifactRecord, CacheKey};

const CACHE_DIR_NAME: &str = ".bookhooks_cache";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Error)]
pub enum StorageFault {
    #[error("failed to create cache directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read cache record {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write cache record {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed cache record {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to serialize cache record for {key}: {source}")]
    Serialize {
        key: String,
        source: serde_json::Error,
    },
}

pub fn default_cache_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CACHE_DIR_NAME)
}

/// Persistent key → text store with one JSON file per key.
///
/// Reads and writes never fail the caller: any [`StorageFault`] is logged and
/// turned into a miss (on `get`) or a no-op (on `put`). There is no eviction
/// and no cross-process locking; concurrent writers to one key race and the
/// last rename wins.
#[derive(Clone)]
pub struct ArtifactCache {
    root: PathBuf,
    ready: Arc<OnceCell<()>>,
}

impl ArtifactCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ready: Arc::new(OnceCell::new()),
        }
    }

    /// Process-wide cache rooted at [`default_cache_dir`].
    pub fn shared() -> &'static ArtifactCache {
        static SHARED: OnceLock<ArtifactCache> = OnceLock::new();
        SHARED.get_or_init(|| ArtifactCache::new(default_cache_dir()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn get(&self, key: &CacheKey) -> Option<String> {
        match self.read_record(key).await {
            Ok(Some(record)) if record.summary.is_empty() => None,
            Ok(Some(record)) if record.key.as_deref().is_some_and(|k| k != key.as_str()) => {
                tracing::debug!(key = %key, stored = ?record.key, "cache record belongs to another key");
                None
            }
            Ok(Some(record)) => Some(record.summary),
            Ok(None) => None,
            Err(err) => {
                tracing::debug!(key = %key, error = %err, "treating unreadable cache record as miss");
                None
            }
        }
    }

    pub async fn put(&self, key: &CacheKey, text: &str) {
        if let Err(err) = self.write_record(key, text).await {
            tracing::warn!(key = %key, error = %err, "cache write failed; continuing uncached");
        }
    }

    /// File holding `key`. Distinct keys map to distinct file names.
    pub fn record_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("{}.json", encode_key(key.as_str())))
    }

    async fn read_record(&self, key: &CacheKey) -> Result<Option<ArtifactRecord>, StorageFault> {
        let path = self.record_path(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageFault::Read { path, source }),
        };

        serde_json::from_slice::<ArtifactRecord>(&bytes)
            .map(Some)
            .map_err(|source| StorageFault::Malformed { path, source })
    }

    async fn write_record(&self, key: &CacheKey, text: &str) -> Result<(), StorageFault> {
        self.ensure_root().await?;

        let record = ArtifactRecord {
            key: Some(key.as_str().to_string()),
            summary: text.to_string(),
        };
        let body = serde_json::to_vec(&record).map_err(|source| StorageFault::Serialize {
            key: key.as_str().to_string(),
            source,
        })?;

        let path = self.record_path(key);
        let tmp = path.with_extension(format!(
            "json.tmp-{}-{}",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(source) = tokio::fs::write(&tmp, &body).await {
            return Err(StorageFault::Write { path: tmp, source });
        }
        if let Err(source) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StorageFault::Write { path, source });
        }
        Ok(())
    }

    /// Creates the root directory once; a failed attempt is retried by the
    /// next write.
    async fn ensure_root(&self) -> Result<(), StorageFault> {
        self.ready
            .get_or_try_init(|| async {
                tokio::fs::create_dir_all(&self.root)
                    .await
                    .map_err(|source| StorageFault::CreateDir {
                        path: self.root.clone(),
                        source,
                    })
            })
            .await
            .map(|_| ())
    }
}

/// `[A-Za-z0-9_]` pass through; every other byte becomes `-XX` (uppercase
/// hex). `-` only ever starts an escape, so the encoding is reversible.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("-{byte:02X}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let tmp = tempdir().unwrap();
        let cache = ArtifactCache::new(tmp.path());
        let key = CacheKey::book_summary("book-1");

        cache.put(&key, "A storm gathers.").await;
        assert_eq!(cache.get(&key).await.as_deref(), Some("A storm gathers."));

        cache.put(&key, "A storm gathers.").await;
        assert_eq!(cache.get(&key).await.as_deref(), Some("A storm gathers."));
    }

    #[tokio::test]
    async fn overwrite_replaces_whole_record() {
        let tmp = tempdir().unwrap();
        let cache = ArtifactCache::new(tmp.path());
        let key = CacheKey::segment_teaser("deadbeef");

        cache.put(&key, "first").await;
        cache.put(&key, "second").await;
        assert_eq!(cache.get(&key).await.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn missing_record_is_a_miss() {
        let tmp = tempdir().unwrap();
        let cache = ArtifactCache::new(tmp.path().join("never-created"));
        assert!(cache.get(&CacheKey::book_summary("nope")).await.is_none());
        assert!(!cache.root().exists());
    }

    #[tokio::test]
    async fn malformed_record_is_a_miss() {
        let tmp = tempdir().unwrap();
        let cache = ArtifactCache::new(tmp.path());
        let key = CacheKey::book_summary("broken");
        std::fs::write(cache.record_path(&key), b"{not json").unwrap();

        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn empty_record_is_a_miss() {
        let tmp = tempdir().unwrap();
        let cache = ArtifactCache::new(tmp.path());
        let key = CacheKey::book_summary("empty");
        std::fs::write(cache.record_path(&key), br#"{"summary": ""}"#).unwrap();

        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn root_is_created_lazily_on_first_write() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("a").join("b");
        let cache = ArtifactCache::new(&root);
        assert!(!root.exists());

        cache.put(&CacheKey::book_summary("lazy"), "text").await;
        assert!(root.is_dir());
        assert!(cache.record_path(&CacheKey::book_summary("lazy")).is_file());
    }

    #[tokio::test]
    async fn write_failure_is_swallowed() {
        let tmp = tempdir().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();
        let cache = ArtifactCache::new(blocker.join("cache"));
        let key = CacheKey::book_summary("x");

        cache.put(&key, "text").await;
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn no_temp_files_left_behind() {
        let tmp = tempdir().unwrap();
        let cache = ArtifactCache::new(tmp.path());
        cache.put(&CacheKey::segment_teaser("aaaa0000"), "t").await;

        let names: Vec<String> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["para_summary_aaaa0000.json".to_string()]);
    }

    #[test]
    fn shared_cache_is_initialized_once() {
        let first = ArtifactCache::shared() as *const ArtifactCache;
        let second = ArtifactCache::shared() as *const ArtifactCache;
        assert_eq!(first, second);
        assert_eq!(ArtifactCache::shared().root(), default_cache_dir());
    }

    #[test]
    fn serialize_fault_names_the_key_not_a_path() {
        let source = serde_json::from_str::<ArtifactRecord>("[").unwrap_err();
        let fault = StorageFault::Serialize {
            key: "dune_summary".to_string(),
            source,
        };
        assert!(fault.to_string().starts_with("failed to serialize cache record for dune_summary"));
    }

    #[test]
    fn keys_are_escaped_into_file_names() {
        let cache = ArtifactCache::new("/cache");
        let path = cache.record_path(&CacheKey::book_summary("../etc/passwd"));
        assert_eq!(path, PathBuf::from("/cache/-2E-2E-2Fetc-2Fpasswd_summary.json"));
        assert_eq!(
            cache.record_path(&CacheKey::segment_teaser("ab12cd34")),
            PathBuf::from("/cache/para_summary_ab12cd34.json")
        );
    }

    #[test]
    fn lookalike_keys_get_distinct_files() {
        let cache = ArtifactCache::new("/cache");
        let pairs = [
            ("war.and.peace", "war_and_peace"),
            ("war-and-peace", "war_and_peace"),
            ("a-2Eb", "a.b"),
            ("caf\u{e9}", "caf_"),
        ];
        for (a, b) in pairs {
            assert_ne!(
                cache.record_path(&CacheKey::book_summary(a)),
                cache.record_path(&CacheKey::book_summary(b)),
                "{a} vs {b}"
            );
        }
    }

    #[tokio::test]
    async fn lookalike_book_ids_do_not_share_summaries() {
        let tmp = tempdir().unwrap();
        let cache = ArtifactCache::new(tmp.path());
        cache
            .put(&CacheKey::book_summary("war.and.peace"), "Summary of book A")
            .await;

        assert!(cache.get(&CacheKey::book_summary("war_and_peace")).await.is_none());
        assert_eq!(
            cache.get(&CacheKey::book_summary("war.and.peace")).await.as_deref(),
            Some("Summary of book A")
        );
    }

    #[tokio::test]
    async fn record_stored_under_another_key_is_a_miss() {
        // Case-insensitive filesystems can hand back the file of a key that
        // differs only in case.
        let tmp = tempdir().unwrap();
        let cache = ArtifactCache::new(tmp.path());
        let key = CacheKey::book_summary("dune");
        std::fs::write(
            cache.record_path(&key),
            br#"{"key": "Dune_summary", "summary": "Spice."}"#,
        )
        .unwrap();

        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn record_without_key_is_still_served() {
        let tmp = tempdir().unwrap();
        let cache = ArtifactCache::new(tmp.path());
        let key = CacheKey::book_summary("legacy");
        std::fs::write(cache.record_path(&key), br#"{"summary": "Old text."}"#).unwrap();

        assert_eq!(cache.get(&key).await.as_deref(), Some("Old text."));
    }
}
