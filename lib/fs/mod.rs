//! The handler capability sets the caches sit behind, and the backing store they reference.
/// Host-directory backing store and a single-export base handler.
pub mod local;

use std::sync::Arc;
use std::time::SystemTime;

use thiserror::Error;

use crate::cache::handles::{FileHandle, HandleError};

/// Errors raised by a [`Backend`] or a base [`Handler`].
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The requested export or path does not exist.
    #[error("no such file or directory")]
    NotFound,

    /// A path component cannot be mapped onto the backing store.
    #[error("invalid path component: {0:?}")]
    InvalidPath(String),

    /// The presented handle no longer resolves.
    #[error(transparent)]
    Handle(#[from] HandleError),

    /// The backing store failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<HandlerError> for i32 {
    fn from(e: HandlerError) -> Self {
        match e {
            HandlerError::NotFound => libc::ENOENT,
            HandlerError::InvalidPath(_) => libc::EINVAL,
            HandlerError::Handle(handle_err) => handle_err.into(),
            HandlerError::Io(ref io_err) => io_err.raw_os_error().unwrap_or(libc::EIO),
        }
    }
}

/// Metadata for a single directory entry, as returned in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// The name of this entry within its parent directory.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Whether this entry is itself a directory.
    pub is_dir: bool,
    /// Last modification time.
    pub modified: SystemTime,
}

/// Filesystem usage statistics returned by [`Handler::fs_stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FsStat {
    /// Total size of the filesystem (bytes).
    pub total_bytes: u64,
    /// Free space (bytes).
    pub free_bytes: u64,
    /// Free space available to unprivileged users (bytes).
    pub available_bytes: u64,
    /// Total number of file nodes.
    pub total_files: u64,
    /// Number of free file nodes.
    pub free_files: u64,
}

/// A backing filesystem that handles point into.
///
/// Paths are sequences of components relative to the store's root; the empty path is the root.
pub trait Backend: Send + Sync + 'static {
    /// Stat a single path.
    fn stat(&self, path: &[String]) -> Result<FileInfo, HandlerError>;

    /// List the entries of a directory.
    fn read_dir(&self, path: &[String]) -> Result<Vec<FileInfo>, HandlerError>;
}

/// A shared reference to a backing store. Caches hold clones of this and never own the store.
pub type Store = Arc<dyn Backend>;

/// The base protocol-handler capability set.
///
/// Everything a server needs from its handler that is not object identity: resolving an export
/// to a store and reporting usage. [`CachingHandler`](crate::caching::CachingHandler) forwards
/// these unchanged.
pub trait Handler: Send + Sync {
    /// Resolve an export name to the store serving it.
    fn mount(&self, export: &str) -> Result<Store, HandlerError>;

    /// Report usage statistics for the filesystem containing `path`.
    fn fs_stat(&self, store: &Store, path: &[String]) -> Result<FsStat, HandlerError>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn mount(&self, export: &str) -> Result<Store, HandlerError> {
        (**self).mount(export)
    }

    fn fs_stat(&self, store: &Store, path: &[String]) -> Result<FsStat, HandlerError> {
        (**self).fs_stat(store, path)
    }
}

/// The object-identity capability set: opaque file handles and directory cookie-verifiers.
pub trait HandleTranslator: Send + Sync {
    /// Mint a fresh opaque handle for `path` within `store`.
    fn to_handle(&self, store: &Store, path: &[String]) -> FileHandle;

    /// Resolve a handle previously returned by [`to_handle`](Self::to_handle).
    fn from_handle(&self, fh: &[u8]) -> Result<(Store, Vec<String>), HandleError>;

    /// Retarget handles after `old_name` in the directory `dir_fh` was renamed to `new_name`.
    fn rename_handle(&self, dir_fh: &[u8], old_name: &str, new_name: &str)
    -> Result<(), HandleError>;

    /// Point an existing handle at a different `(store, path)`.
    fn rebind_handle(&self, fh: &[u8], store: Store, path: Vec<String>)
    -> Result<(), HandleError>;

    /// How many handles can be live at once before the oldest start going stale.
    fn handle_limit(&self) -> usize;

    /// Snapshot a directory listing and return the cookie-verifier naming it.
    fn verifier_for(&self, path: &str, listing: Vec<FileInfo>) -> u64;

    /// Fetch the listing a cookie-verifier names, or `None` if pagination must restart.
    fn data_for_verifier(&self, path: &str, verifier: u64) -> Option<Arc<[FileInfo]>>;

    /// Drop every listing snapshot taken of `path`.
    fn invalidate_verifier(&self, path: &str);
}
