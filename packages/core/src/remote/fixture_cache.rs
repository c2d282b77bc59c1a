//! On-disk fixture cache
//!
//! `FixtureCache` wraps another `RecordClient` and records fetched pages to
//! `<dir>/<page id>.json` so test runs can replay them offline. Files hold the
//! record's JSON compressed as a zstd frame; hand-written plain JSON fixtures
//! are accepted too. Page ids must be plain file names (ASCII letters,
//! digits, `-` and `_`); anything else is refused before touching disk.
//!
//! - `Replay`: serve from disk, fetch and persist on a miss
//! - `Refresh`: clear the directory once (before the first write), then fetch
//!   and persist every page
//! - `Off`: plain pass-through

use super::{FetchOptions, RecordClient};
use crate::config::{ContentConfig, FixtureMode};
use crate::error::ContentError;
use crate::models::{PageId, RawRecord};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;

/// Leading bytes of every zstd frame
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

const COMPRESSION_LEVEL: i32 = 3;

/// Record client decorator persisting records to disk
#[derive(Debug)]
pub struct FixtureCache<C> {
    inner: C,
    dir: PathBuf,
    mode: FixtureMode,
    cleared: OnceCell<()>,
}

impl<C: RecordClient> FixtureCache<C> {
    pub fn new(inner: C, dir: impl Into<PathBuf>, mode: FixtureMode) -> Self {
        Self {
            inner,
            dir: dir.into(),
            mode,
            cleared: OnceCell::new(),
        }
    }

    /// Wrap `inner` using the configured directory and mode
    pub fn from_config(inner: C, config: &ContentConfig) -> Self {
        Self::new(inner, config.test_cache_dir.clone(), config.fixture_mode)
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn mode(&self) -> FixtureMode {
        self.mode
    }

    /// Fixture file for a page
    ///
    /// # Errors
    ///
    /// `Cache` when the id could name a file outside the cache directory.
    pub fn path_for(&self, page_id: &PageId) -> Result<PathBuf, ContentError> {
        let name = page_id.as_str();
        if !is_file_safe(name) {
            return Err(ContentError::cache(
                &self.dir,
                format!("page id '{}' is not a usable fixture file name", name),
            ));
        }
        Ok(self.dir.join(format!("{}.json", name)))
    }

    async fn fetch_and_store(
        &self,
        page_id: &PageId,
        path: &Path,
        options: FetchOptions,
    ) -> Result<RawRecord, ContentError> {
        let record = self.inner.fetch(page_id, options).await?;
        self.write(page_id, path, &record).await?;
        Ok(record)
    }

    async fn read(&self, path: &Path) -> Result<Option<RawRecord>, ContentError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ContentError::cache(path, e.to_string())),
        };

        let json = if bytes.starts_with(&ZSTD_MAGIC) {
            zstd::decode_all(bytes.as_slice())
                .map_err(|e| ContentError::cache(path, format!("decompression failed: {}", e)))?
        } else {
            bytes
        };

        serde_json::from_slice(&json)
            .map(Some)
            .map_err(|e| ContentError::cache(path, format!("invalid record JSON: {}", e)))
    }

    async fn write(
        &self,
        page_id: &PageId,
        path: &Path,
        record: &RawRecord,
    ) -> Result<(), ContentError> {
        if self.mode == FixtureMode::Refresh {
            self.cleared
                .get_or_try_init(|| clear_dir(&self.dir))
                .await?;
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ContentError::cache(&self.dir, e.to_string()))?;

        let json = serde_json::to_vec(record)
            .map_err(|e| ContentError::cache(path, format!("serialization failed: {}", e)))?;
        let compressed = zstd::encode_all(json.as_slice(), COMPRESSION_LEVEL)
            .map_err(|e| ContentError::cache(path, format!("compression failed: {}", e)))?;

        tokio::fs::write(path, compressed)
            .await
            .map_err(|e| ContentError::cache(path, e.to_string()))?;

        tracing::debug!(page_id = %page_id, path = %path.display(), "Stored fixture");
        Ok(())
    }
}

/// Non-empty and made only of ASCII alphanumerics, `-` and `_`
fn is_file_safe(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

async fn clear_dir(dir: &Path) -> Result<(), ContentError> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {
            tracing::info!(dir = %dir.display(), "Cleared fixture cache");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ContentError::cache(dir, e.to_string())),
    }
}

#[async_trait]
impl<C: RecordClient> RecordClient for FixtureCache<C> {
    async fn fetch(
        &self,
        page_id: &PageId,
        options: FetchOptions,
    ) -> Result<RawRecord, ContentError> {
        if self.mode == FixtureMode::Off {
            return self.inner.fetch(page_id, options).await;
        }

        let path = self.path_for(page_id)?;
        match self.mode {
            FixtureMode::Replay => match self.read(&path).await? {
                Some(record) => {
                    tracing::debug!(page_id = %page_id, "Fixture cache hit");
                    Ok(record)
                }
                None => {
                    tracing::debug!(page_id = %page_id, "Fixture cache miss");
                    self.fetch_and_store(page_id, &path, options).await
                }
            },
            FixtureMode::Refresh | FixtureMode::Off => {
                self.fetch_and_store(page_id, &path, options).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Block, RecordEntry};
    use crate::remote::InMemoryClient;
    use tempfile::TempDir;

    fn sample_record(id: &str) -> RawRecord {
        let mut record = RawRecord::default();
        record.block.insert(
            id.to_string(),
            RecordEntry::new(Block {
                id: id.to_string(),
                block_type: "page".to_string(),
                created_time: Some(1714521600000.0),
                ..Block::default()
            }),
        );
        record
    }

    #[tokio::test]
    async fn test_replay_persists_miss_then_serves_from_disk() {
        let dir = TempDir::new().unwrap();
        let id = PageId::new("page");

        let recording = FixtureCache::new(
            InMemoryClient::new().with_record("page", sample_record("page")),
            dir.path(),
            FixtureMode::Replay,
        );
        let first = recording.fetch(&id, FetchOptions::default()).await.unwrap();
        assert_eq!(recording.inner().call_count("page"), 1);
        let path = recording.path_for(&id).unwrap();
        assert!(path.exists());

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(&ZSTD_MAGIC));

        // A second cache over an empty client can only answer from disk
        let replaying = FixtureCache::new(InMemoryClient::new(), dir.path(), FixtureMode::Replay);
        let replayed = replaying.fetch(&id, FetchOptions::default()).await.unwrap();
        assert_eq!(replayed, first);
        assert_eq!(replaying.inner().call_count("page"), 0);
    }

    #[tokio::test]
    async fn test_refresh_clears_once_and_always_fetches() {
        let dir = TempDir::new().unwrap();
        let stale = dir.path().join("stale.json");
        std::fs::write(&stale, b"{}").unwrap();

        let cache = FixtureCache::new(
            InMemoryClient::new()
                .with_record("a", sample_record("a"))
                .with_record("b", sample_record("b")),
            dir.path(),
            FixtureMode::Refresh,
        );

        cache.fetch(&PageId::new("a"), FetchOptions::default()).await.unwrap();
        assert!(!stale.exists());

        cache.fetch(&PageId::new("b"), FetchOptions::default()).await.unwrap();
        cache.fetch(&PageId::new("a"), FetchOptions::default()).await.unwrap();

        // The clear ran once: a's first recording survived b's write
        assert!(cache.path_for(&PageId::new("a")).unwrap().exists());
        assert!(cache.path_for(&PageId::new("b")).unwrap().exists());
        assert_eq!(cache.inner().call_count("a"), 2);
    }

    #[tokio::test]
    async fn test_plain_json_fixture_is_accepted() {
        let dir = TempDir::new().unwrap();
        let record = sample_record("hand");
        std::fs::write(
            dir.path().join("hand.json"),
            serde_json::to_vec(&record).unwrap(),
        )
        .unwrap();

        let cache = FixtureCache::new(InMemoryClient::new(), dir.path(), FixtureMode::Replay);
        let loaded = cache
            .fetch(&PageId::new("hand"), FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn test_corrupt_fixture_is_cache_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.json"), b"not json").unwrap();

        let cache = FixtureCache::new(InMemoryClient::new(), dir.path(), FixtureMode::Replay);
        let err = cache
            .fetch(&PageId::new("bad"), FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::Cache { .. }));
    }

    #[tokio::test]
    async fn test_off_mode_passes_through() {
        let dir = TempDir::new().unwrap();
        let cache_dir = dir.path().join("fixtures");
        let cache = FixtureCache::new(
            InMemoryClient::new().with_record("p", sample_record("p")),
            &cache_dir,
            FixtureMode::Off,
        );

        cache.fetch(&PageId::new("p"), FetchOptions::default()).await.unwrap();
        cache.fetch(&PageId::new("p"), FetchOptions::default()).await.unwrap();

        assert_eq!(cache.inner().call_count("p"), 2);
        assert!(!cache_dir.exists());
    }

    #[tokio::test]
    async fn test_inner_failure_is_not_persisted() {
        let dir = TempDir::new().unwrap();
        let cache = FixtureCache::new(
            InMemoryClient::new().with_failure("p", "HTTP 500"),
            dir.path(),
            FixtureMode::Replay,
        );

        let err = cache
            .fetch(&PageId::new("p"), FetchOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_remote());
        assert!(!cache.path_for(&PageId::new("p")).unwrap().exists());
    }

    #[test]
    fn test_path_for_rejects_unsafe_ids() {
        let cache = FixtureCache::new(InMemoryClient::new(), "/tmp/fixtures", FixtureMode::Replay);

        for id in ["../escape", "a/b", "..", "", "a\\b", "/etc/passwd", "a.b"] {
            let err = cache.path_for(&PageId::new(id)).unwrap_err();
            assert!(matches!(err, ContentError::Cache { .. }), "id {:?}", id);
        }

        let path = cache
            .path_for(&PageId::new("5f0c7b1e-2d3a-4c5b-8e9f-0a1b2c3d4e5f"))
            .unwrap();
        assert_eq!(
            path,
            Path::new("/tmp/fixtures/5f0c7b1e-2d3a-4c5b-8e9f-0a1b2c3d4e5f.json")
        );
    }

    #[tokio::test]
    async fn test_unsafe_id_never_touches_disk() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("fixtures");
        let cache = FixtureCache::new(
            InMemoryClient::new().with_record("../escape", sample_record("../escape")),
            &dir,
            FixtureMode::Refresh,
        );

        let err = cache
            .fetch(&PageId::new("../escape"), FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::Cache { .. }));
        assert!(!root.path().join("escape.json").exists());
        assert!(!dir.exists());
        assert_eq!(cache.inner().call_count("../escape"), 0);
    }
}
