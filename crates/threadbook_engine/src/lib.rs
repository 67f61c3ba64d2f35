//! Threadbook engine: corpus loading, image caching and package writing.
mod avatars;
mod corpus;
mod fetch;
mod image_cache;
mod opf;
mod package;
mod persist;
mod types;

pub use avatars::AvatarDirectory;
pub use corpus::{load_corpus, load_thread, CorpusError, POSTS_DIR, POST_FILE, REPLIES_FILE};
pub use fetch::{FetchSettings, Fetcher, LogProgressSink, NullProgressSink, ProgressSink, ReqwestFetcher};
pub use image_cache::{CacheError, ImageCache, PrecacheReport};
pub use opf::{media_type, MIMETYPE};
pub use package::{write_package, PackageAssets, PackageError, PackageSummary, PackageTarget};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use types::{FailureKind, FetchError, FetchEvent, FetchMetadata, FetchOutput};
