//! Stateful translation between opaque file handles and `(store, path)` pairs.
//!
//! A host filesystem can hand out device and inode numbers as file handles. Most backing stores
//! have no such durable identity, so [`HandleCache`] instead mints a random 128-bit identifier per
//! request and remembers what it refers to. The table is bounded; once a handle falls off the end
//! of the LRU order it is gone, and clients presenting it get [`HandleError::Stale`] and must
//! re-resolve by path.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::cache::eviction::lru::LruMap;
use crate::fs::Store;

/// Raised when a presented handle does not resolve to a live entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HandleError {
    /// The handle is malformed, was never issued, or has been evicted.
    #[error("stale file handle")]
    Stale,
}

impl From<HandleError> for i32 {
    fn from(e: HandleError) -> Self {
        match e {
            HandleError::Stale => libc::ESTALE,
        }
    }
}

/// An opaque, fixed-length file handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileHandle(Uuid);

impl FileHandle {
    /// Length of a handle on the wire, in bytes.
    pub const LEN: usize = 16;

    /// Generates a fresh random handle.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a handle from its wire form. Any length other than [`Self::LEN`] is stale.
    pub fn parse(fh: &[u8]) -> Result<Self, HandleError> {
        Uuid::from_slice(fh).map(Self).map_err(|_| HandleError::Stale)
    }

    /// The raw wire bytes of this handle.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        self.0.as_bytes()
    }

    /// An owned copy of the wire bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl fmt::Display for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl From<FileHandle> for Bytes {
    fn from(handle: FileHandle) -> Self {
        handle.to_bytes()
    }
}

#[derive(Clone)]
struct HandleEntry {
    store: Store,
    path: Vec<String>,
}

/// Returns `true` if `candidate` is `path` itself or one of its ancestors.
///
/// The empty path is the export root and is an ancestor of every path. A non-empty candidate is
/// never an ancestor of the root.
#[must_use]
pub fn is_ancestor(candidate: &[String], path: &[String]) -> bool {
    path.starts_with(candidate)
}

/// Bounded map from [`FileHandle`] to the `(store, path)` it was minted for.
///
/// All operations take a single lock for their whole duration, so no caller ever observes an
/// entry half-way through a rename or rebind.
pub struct HandleCache {
    entries: Mutex<LruMap<FileHandle, HandleEntry>>,
}

impl HandleCache {
    /// Creates an empty cache holding at most `capacity` handles.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruMap::new(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruMap<FileHandle, HandleEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The maximum number of live handles.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    /// The number of live handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if no handles are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Mints a fresh handle for `path` within `store`.
    ///
    /// Evicts the least recently used handle if the cache is full. The store reference is
    /// cloned, not taken.
    pub fn mint(&self, store: &Store, path: &[String]) -> FileHandle {
        let handle = FileHandle::generate();
        let entry = HandleEntry {
            store: Arc::clone(store),
            path: path.to_vec(),
        };
        let evicted = self.lock().insert(handle, entry);
        if let Some((old, old_entry)) = evicted {
            debug!(handle = %old, path = ?old_entry.path, "evicted least recently used handle");
        }
        trace!(%handle, ?path, "minted handle");
        handle
    }

    /// Resolves a handle back to its `(store, path)`.
    ///
    /// On success every cached entry whose path is an ancestor of the resolved path is marked
    /// recently used, in its existing relative order, followed by the resolved entry itself.
    /// Directories a client is traversing through therefore outlive the descendants it holds
    /// handles to. This scans the whole cache.
    pub fn resolve(&self, fh: &[u8]) -> Result<(Store, Vec<String>), HandleError> {
        let handle = FileHandle::parse(fh)?;
        let mut entries = self.lock();
        let entry = entries.peek(&handle).cloned().ok_or(HandleError::Stale)?;

        let ancestors: Vec<FileHandle> = entries
            .iter()
            .filter(|(key, candidate)| {
                **key != handle && is_ancestor(&candidate.path, &entry.path)
            })
            .map(|(key, _)| *key)
            .collect();
        for key in &ancestors {
            entries.touch(key);
        }
        entries.touch(&handle);
        drop(entries);

        trace!(%handle, pinned = ancestors.len(), "resolved handle");
        Ok((entry.store, entry.path))
    }

    /// Retargets handles after the child `old_name` of the directory `dir_fh` was renamed.
    ///
    /// The handle for `dir/old_name` now resolves to `dir/new_name`, and handles below it follow
    /// along (`dir/old_name/rest` becomes `dir/new_name/rest`). Entries elsewhere that merely end
    /// in `old_name` are left alone. Resolving the directory counts as a use of it; the rewritten
    /// entries keep their place in the LRU order.
    pub fn rename_child(
        &self,
        dir_fh: &[u8],
        old_name: &str,
        new_name: &str,
    ) -> Result<(), HandleError> {
        let handle = FileHandle::parse(dir_fh)?;
        let mut entries = self.lock();
        let dir_path = entries
            .get(&handle)
            .map(|dir| dir.path.clone())
            .ok_or(HandleError::Stale)?;

        let mut old_path = dir_path.clone();
        old_path.push(old_name.to_owned());

        let targets: Vec<FileHandle> = entries
            .iter()
            .filter(|(_, candidate)| is_ancestor(&old_path, &candidate.path))
            .map(|(key, _)| *key)
            .collect();
        for key in &targets {
            if let Some(entry) = entries.peek_mut(key) {
                let mut renamed = Vec::with_capacity(entry.path.len());
                renamed.extend_from_slice(&dir_path);
                renamed.push(new_name.to_owned());
                renamed.extend_from_slice(&entry.path[old_path.len()..]);
                entry.path = renamed;
            }
        }
        drop(entries);

        debug!(dir = %handle, old_name, new_name, retargeted = targets.len(), "propagated rename");
        Ok(())
    }

    /// Points an existing handle at a different `(store, path)`.
    ///
    /// The entry is replaced in the cache itself and counts as a use.
    pub fn rebind(&self, fh: &[u8], store: Store, path: Vec<String>) -> Result<(), HandleError> {
        let handle = FileHandle::parse(fh)?;
        let mut entries = self.lock();
        if !entries.contains(&handle) {
            return Err(HandleError::Stale);
        }
        trace!(%handle, ?path, "rebinding handle");
        // Overwriting a present key never evicts.
        let _ = entries.insert(handle, HandleEntry { store, path });
        Ok(())
    }

    /// Point-in-time list of live handles and their paths, least recently used first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(FileHandle, Vec<String>)> {
        self.lock()
            .iter()
            .map(|(handle, entry)| (*handle, entry.path.clone()))
            .collect()
    }
}

impl fmt::Debug for HandleCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.lock();
        f.debug_struct("HandleCache")
            .field("len", &entries.len())
            .field("capacity", &entries.capacity())
            .finish()
    }
}
