//! Writes a built book as an e-book package, either as a loose directory
//! tree or as a single zip archive.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use book_logging::{book_debug, book_info};
use chrono::Utc;
use tempfile::NamedTempFile;
use thiserror::Error;
use threadbook_core::{BookMetadata, BuiltBook};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::opf::{self, COVER_FILE, CONTAINER_XML, MIMETYPE, STYLESHEET, TITLE_PAGE};
use crate::persist::{ensure_output_dir, AtomicFileWriter, PersistError};

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("cannot read {path}: {source}")]
    Asset {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageTarget {
    /// Loose tree, one atomic write per file.
    Directory(PathBuf),
    /// Zip archive with the `mimetype` entry first and uncompressed.
    Archive(PathBuf),
}

impl PackageTarget {
    pub fn path(&self) -> &Path {
        match self {
            PackageTarget::Directory(path) | PackageTarget::Archive(path) => path,
        }
    }
}

/// Where the binary files copied into the package live.
#[derive(Debug, Clone, Default)]
pub struct PackageAssets {
    pub image_dir: PathBuf,
    pub avatar_dir: Option<PathBuf>,
    pub cover: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSummary {
    pub chapter_files: usize,
    pub images: usize,
    pub avatars: usize,
    pub has_cover: bool,
}

trait EntrySink {
    fn put(&mut self, name: &str, bytes: &[u8], compress: bool) -> Result<(), PackageError>;
}

struct DirectorySink {
    writer: AtomicFileWriter,
}

impl EntrySink for DirectorySink {
    fn put(&mut self, name: &str, bytes: &[u8], _compress: bool) -> Result<(), PackageError> {
        self.writer.write_bytes(name, bytes)?;
        Ok(())
    }
}

struct ArchiveSink {
    zip: ZipWriter<NamedTempFile>,
}

impl EntrySink for ArchiveSink {
    fn put(&mut self, name: &str, bytes: &[u8], compress: bool) -> Result<(), PackageError> {
        let method = if compress {
            zip::CompressionMethod::Deflated
        } else {
            zip::CompressionMethod::Stored
        };
        self.zip
            .start_file(name, SimpleFileOptions::default().compression_method(method))?;
        self.zip.write_all(bytes)?;
        Ok(())
    }
}

fn read_asset(path: &Path) -> Result<Vec<u8>, PackageError> {
    fs::read(path).map_err(|source| PackageError::Asset {
        path: path.to_path_buf(),
        source,
    })
}

fn write_entries(
    sink: &mut dyn EntrySink,
    book: &BuiltBook<'_>,
    metadata: &BookMetadata,
    assets: &PackageAssets,
) -> Result<PackageSummary, PackageError> {
    let has_cover = assets.cover.is_some();
    let modified = Utc::now().format("%Y-%m-%d").to_string();

    sink.put("mimetype", MIMETYPE.as_bytes(), false)?;
    sink.put("META-INF/container.xml", CONTAINER_XML.as_bytes(), true)?;
    sink.put(
        "OEBPS/content.opf",
        opf::content_opf(book, metadata, &modified, has_cover).as_bytes(),
        true,
    )?;
    sink.put("OEBPS/toc.ncx", opf::toc_ncx(book, metadata).as_bytes(), true)?;
    sink.put("OEBPS/stylesheet.css", STYLESHEET.as_bytes(), true)?;
    sink.put(
        &format!("OEBPS/Text/{TITLE_PAGE}"),
        opf::title_page(metadata, has_cover).as_bytes(),
        true,
    )?;

    for file in &book.files {
        sink.put(&format!("OEBPS/Text/{}", file.file_name), file.body.as_bytes(), true)?;
    }

    let images = book.images();
    for image in &images {
        let bytes = read_asset(&assets.image_dir.join(image))?;
        sink.put(&format!("OEBPS/Images/{image}"), &bytes, true)?;
    }

    let avatars = book.avatars();
    if !avatars.is_empty() {
        // Avatars are only referenced when an avatar directory was scanned.
        let dir = assets.avatar_dir.as_deref().unwrap_or_else(|| Path::new("."));
        for avatar in &avatars {
            let bytes = read_asset(&dir.join(avatar))?;
            sink.put(&format!("OEBPS/Avatars/{avatar}"), &bytes, true)?;
        }
    }

    if let Some(cover) = &assets.cover {
        let bytes = read_asset(cover)?;
        sink.put(&format!("OEBPS/{COVER_FILE}"), &bytes, true)?;
    }

    Ok(PackageSummary {
        chapter_files: book.files.len(),
        images: images.len(),
        avatars: avatars.len(),
        has_cover,
    })
}

/// Writes the whole package to `target`.
pub fn write_package(
    book: &BuiltBook<'_>,
    metadata: &BookMetadata,
    assets: &PackageAssets,
    target: &PackageTarget,
) -> Result<PackageSummary, PackageError> {
    let summary = match target {
        PackageTarget::Directory(dir) => {
            ensure_output_dir(dir)?;
            // Chapter files from an earlier split would otherwise linger unlisted.
            let text_dir = dir.join("OEBPS").join("Text");
            if text_dir.is_dir() {
                fs::remove_dir_all(&text_dir)?;
            }
            let mut sink = DirectorySink {
                writer: AtomicFileWriter::new(dir.clone()),
            };
            write_entries(&mut sink, book, metadata, assets)?
        }
        PackageTarget::Archive(path) => {
            let parent = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            ensure_output_dir(&parent)?;
            let mut sink = ArchiveSink {
                zip: ZipWriter::new(NamedTempFile::new_in(&parent)?),
            };
            let summary = write_entries(&mut sink, book, metadata, assets)?;
            let tmp = sink.zip.finish()?;
            tmp.persist(path).map_err(|e| PackageError::Io(e.error))?;
            summary
        }
    };
    book_debug!("Package summary: {:?}", summary);
    book_info!(
        "Wrote {} ({} chapter files, {} images, {} avatars)",
        target.path().display(),
        summary.chapter_files,
        summary.images,
        summary.avatars
    );
    Ok(summary)
}
