//! A backing store that directly overlays a host directory.
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use nix::sys::statvfs::statvfs;
use tracing::{debug, warn};

use crate::fs::{Backend, FileInfo, FsStat, Handler, HandlerError, Store};

/// A [`Backend`] rooted at a directory on the host filesystem.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Create a backend serving everything below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The host directory this backend is rooted at.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map path components onto a host path, refusing anything that would escape the root.
    fn abspath(&self, path: &[String]) -> Result<PathBuf, HandlerError> {
        let mut abs = self.root.clone();
        for component in path {
            let mut parts = Path::new(component).components();
            match (parts.next(), parts.next()) {
                (Some(Component::Normal(part)), None) => abs.push(part),
                _ => return Err(HandlerError::InvalidPath(component.clone())),
            }
        }
        Ok(abs)
    }

    fn file_info(name: String, metadata: &std::fs::Metadata) -> FileInfo {
        FileInfo {
            name,
            size: metadata.len(),
            is_dir: metadata.is_dir(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        }
    }
}

fn map_not_found(err: std::io::Error) -> HandlerError {
    if err.kind() == std::io::ErrorKind::NotFound {
        HandlerError::NotFound
    } else {
        HandlerError::Io(err)
    }
}

impl Backend for LocalBackend {
    fn stat(&self, path: &[String]) -> Result<FileInfo, HandlerError> {
        let abs = self.abspath(path)?;
        let metadata = std::fs::metadata(&abs).map_err(map_not_found)?;
        let name = path.last().cloned().unwrap_or_default();
        Ok(Self::file_info(name, &metadata))
    }

    /// Entries are returned sorted by name, so two reads of an unchanged directory produce the
    /// same listing and therefore the same cookie-verifier.
    fn read_dir(&self, path: &[String]) -> Result<Vec<FileInfo>, HandlerError> {
        let abs = self.abspath(path)?;
        let mut entries = Vec::new();
        for dir_entry in std::fs::read_dir(&abs).map_err(map_not_found)? {
            let dir_entry = dir_entry?;
            let Ok(name) = dir_entry.file_name().into_string() else {
                warn!(parent = ?abs, name = ?dir_entry.file_name(), "skipping non-UTF-8 entry");
                continue;
            };
            // Entries can vanish between readdir and stat.
            let metadata = match dir_entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            entries.push(Self::file_info(name, &metadata));
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

/// A base [`Handler`] exporting a single store under one export name.
pub struct MountHandler {
    export: String,
    store: Store,
    root: PathBuf,
}

impl MountHandler {
    /// Export the host directory `root` as `export`.
    pub fn new(export: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        let backend = LocalBackend::new(root);
        Self {
            export: export.into(),
            root: backend.root().to_path_buf(),
            store: Arc::new(backend),
        }
    }
}

impl Handler for MountHandler {
    fn mount(&self, export: &str) -> Result<Store, HandlerError> {
        if export.trim_end_matches('/') != self.export.trim_end_matches('/') {
            debug!(export, "mount of unknown export");
            return Err(HandlerError::NotFound);
        }
        Ok(Arc::clone(&self.store))
    }

    #[allow(clippy::allow_attributes)]
    #[allow(clippy::useless_conversion)]
    fn fs_stat(&self, _store: &Store, _path: &[String]) -> Result<FsStat, HandlerError> {
        let stat = statvfs(self.root.as_path()).map_err(std::io::Error::from)?;
        let fragment_size = u64::from(stat.fragment_size());

        Ok(FsStat {
            total_bytes: u64::from(stat.blocks()).saturating_mul(fragment_size),
            free_bytes: u64::from(stat.blocks_free()).saturating_mul(fragment_size),
            available_bytes: u64::from(stat.blocks_available()).saturating_mul(fragment_size),
            total_files: u64::from(stat.files()),
            free_files: u64::from(stat.files_free()),
        })
    }
}
