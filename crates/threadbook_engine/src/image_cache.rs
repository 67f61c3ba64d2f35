//! Content-addressed local image cache: downloads each external image once
//! and stores it as `<content key>.<ext>`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use book_logging::{book_info, book_warn};
use futures_util::{stream, StreamExt};
use thiserror::Error;
use threadbook_core::{image_file_name, AssetStore};

use crate::fetch::{Fetcher, ProgressSink};
use crate::persist::{ensure_output_dir, AtomicFileWriter, PersistError};
use crate::{FailureKind, FetchError, FetchEvent};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("image cache directory unusable: {0}")]
    Directory(#[from] PersistError),
    #[error("failed to start the download runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Counts from one precache pass. Failures are never fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecacheReport {
    /// Distinct cache files asked for.
    pub requested: usize,
    pub already_cached: usize,
    pub fetched: usize,
    pub failed: Vec<(String, FailureKind)>,
}

#[derive(Debug, Clone)]
pub struct ImageCache {
    writer: AtomicFileWriter,
}

impl ImageCache {
    /// Opens the cache, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        ensure_output_dir(&dir)?;
        Ok(Self {
            writer: AtomicFileWriter::new(dir),
        })
    }

    pub fn dir(&self) -> &Path {
        self.writer.dir()
    }

    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.dir().join(file_name)
    }

    /// Blocking wrapper around [`ImageCache::precache_async`] on a private runtime.
    pub fn precache(
        &self,
        sources: &[String],
        fetcher: &dyn Fetcher,
        sink: &dyn ProgressSink,
        concurrency: usize,
    ) -> Result<PrecacheReport, CacheError> {
        let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
        Ok(runtime.block_on(self.precache_async(sources, fetcher, sink, concurrency)))
    }

    /// Fetches every source not yet cached, at most `concurrency` at a time.
    /// Sources mapping to the same cache file are fetched once.
    pub async fn precache_async(
        &self,
        sources: &[String],
        fetcher: &dyn Fetcher,
        sink: &dyn ProgressSink,
        concurrency: usize,
    ) -> PrecacheReport {
        let mut wanted: BTreeMap<String, &str> = BTreeMap::new();
        for source in sources {
            wanted.entry(image_file_name(source)).or_insert(source.as_str());
        }

        let mut report = PrecacheReport {
            requested: wanted.len(),
            ..PrecacheReport::default()
        };
        let missing: Vec<(String, &str)> = wanted
            .into_iter()
            .filter(|(file_name, _)| !self.has_asset(file_name))
            .collect();
        report.already_cached = report.requested - missing.len();

        let results: Vec<(String, Result<u64, FetchError>)> = stream::iter(missing)
            .map(|(file_name, source)| async move {
                let result = self.fetch_one(&file_name, source, fetcher, sink).await;
                (source.to_string(), result)
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        for (source, result) in results {
            match result {
                Ok(_) => report.fetched += 1,
                Err(err) => {
                    book_warn!("Could not cache image {}: {}", source, err);
                    report.failed.push((source, err.kind));
                }
            }
        }
        report.failed.sort_by(|a, b| a.0.cmp(&b.0));

        book_info!(
            "Image cache: {} requested, {} already cached, {} fetched, {} failed",
            report.requested,
            report.already_cached,
            report.fetched,
            report.failed.len()
        );
        report
    }

    async fn fetch_one(
        &self,
        file_name: &str,
        source: &str,
        fetcher: &dyn Fetcher,
        sink: &dyn ProgressSink,
    ) -> Result<u64, FetchError> {
        let result = match fetcher.fetch(source, sink).await {
            Ok(output) => self
                .writer
                .write_bytes(file_name, &output.bytes)
                .map(|_| output.metadata.byte_len)
                .map_err(|err| FetchError::new(FailureKind::Storage, err.to_string())),
            Err(err) => Err(err),
        };
        sink.emit(FetchEvent::Completed {
            url: source.to_string(),
            result: result.as_ref().copied().map_err(|err| err.kind.clone()),
        });
        result
    }
}

impl AssetStore for ImageCache {
    fn has_asset(&self, file_name: &str) -> bool {
        self.path_of(file_name).is_file()
    }
}
