use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use book_logging::{book_debug, book_info};
use threadbook_core::AvatarStore;

/// Avatar images on disk, named `<icon id>.<ext>`.
#[derive(Debug, Clone, Default)]
pub struct AvatarDirectory {
    dir: PathBuf,
    files: BTreeMap<u64, String>,
}

impl AvatarDirectory {
    /// Indexes the directory. A missing directory yields an empty store.
    pub fn scan(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        let mut files = BTreeMap::new();
        if dir.is_dir() {
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                if !path.is_file() {
                    continue;
                }
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                match name.split_once('.').and_then(|(stem, _)| stem.parse::<u64>().ok()) {
                    Some(icon_id) => {
                        files.insert(icon_id, name.to_string());
                    }
                    None => book_debug!("Ignoring avatar file {}", name),
                }
            }
        }
        book_info!("Found {} avatars in {}", files.len(), dir.display());
        Ok(Self { dir, files })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl AvatarStore for AvatarDirectory {
    fn avatar_file(&self, icon_id: u64) -> Option<String> {
        self.files.get(&icon_id).cloned()
    }
}
