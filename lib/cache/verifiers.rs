//! Directory listing snapshots keyed by cookie-verifier.
//!
//! Paginated directory reads hand the client a cookie into a listing plus a verifier naming the
//! exact listing the cookie indexes. [`VerifierCache`] keeps those listings so every page of one
//! read is served from the same snapshot.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sha2::{Digest as _, Sha256};
use tracing::{debug, trace};

use crate::cache::eviction::lru::LruMap;
use crate::fs::FileInfo;

/// Computes the cookie-verifier for a listing of `path`.
///
/// The verifier is the first eight bytes (big-endian) of a SHA-256 over the length-prefixed path
/// followed by each entry name in listing order. Reordering a listing changes its verifier.
/// Collisions are possible but negligible.
#[must_use]
pub fn fingerprint(path: &str, listing: &[FileInfo]) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update((path.len() as u64).to_be_bytes());
    hasher.update(path.as_bytes());
    for entry in listing {
        hasher.update(entry.name.as_bytes());
    }
    let digest = hasher.finalize();

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

struct VerifierEntry {
    path: String,
    listing: Arc<[FileInfo]>,
}

/// A diagnostic view of one cached listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierSummary {
    /// The cookie-verifier naming the listing.
    pub verifier: u64,
    /// The directory the listing was taken of.
    pub path: String,
    /// Entry names in listing order.
    pub names: Vec<String>,
}

/// Bounded map from cookie-verifier to the directory listing it names.
pub struct VerifierCache {
    entries: Mutex<LruMap<u64, VerifierEntry>>,
}

impl VerifierCache {
    /// Creates an empty cache holding at most `capacity` listings.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruMap::new(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruMap<u64, VerifierEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The maximum number of cached listings.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    /// The number of cached listings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if no listings are cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Stores `listing` as the current snapshot of `path` and returns its verifier.
    ///
    /// Snapshotting an identical listing again yields the same verifier and refreshes the entry.
    pub fn snapshot(&self, path: &str, listing: Vec<FileInfo>) -> u64 {
        let verifier = fingerprint(path, &listing);
        let entry = VerifierEntry {
            path: path.to_owned(),
            listing: listing.into(),
        };
        let evicted = self.lock().insert(verifier, entry);
        if let Some((old, old_entry)) = evicted {
            debug!(verifier = old, path = %old_entry.path, "evicted least recently used listing");
        }
        trace!(verifier, path, "snapshotted listing");
        verifier
    }

    /// Returns the listing named by `verifier`, or `None` if it was evicted or never issued.
    ///
    /// Lookup is keyed by verifier alone; `path` is informational. `None` tells the caller to
    /// restart pagination.
    pub fn lookup(&self, path: &str, verifier: u64) -> Option<Arc<[FileInfo]>> {
        let listing = self
            .lock()
            .get(&verifier)
            .map(|entry| Arc::clone(&entry.listing));
        if listing.is_none() {
            trace!(verifier, path, "unknown cookie-verifier");
        }
        listing
    }

    /// Drops every snapshot taken of `path`, returning how many were removed.
    ///
    /// Call whenever the directory's contents change so in-flight paginated reads restart
    /// instead of observing a mix of old and new entries.
    pub fn invalidate(&self, path: &str) -> usize {
        let mut entries = self.lock();
        let doomed: Vec<u64> = entries
            .iter()
            .filter(|(_, entry)| entry.path == path)
            .map(|(verifier, _)| *verifier)
            .collect();
        for verifier in &doomed {
            entries.remove(verifier);
        }
        drop(entries);

        if !doomed.is_empty() {
            debug!(path, removed = doomed.len(), "invalidated listings");
        }
        doomed.len()
    }

    /// Point-in-time list of cached listings, least recently used first.
    #[must_use]
    pub fn snapshot_entries(&self) -> Vec<VerifierSummary> {
        self.lock()
            .iter()
            .map(|(verifier, entry)| VerifierSummary {
                verifier: *verifier,
                path: entry.path.clone(),
                names: entry.listing.iter().map(|info| info.name.clone()).collect(),
            })
            .collect()
    }
}

impl fmt::Debug for VerifierCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.lock();
        f.debug_struct("VerifierCache")
            .field("len", &entries.len())
            .field("capacity", &entries.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    fn info(name: &str) -> FileInfo {
        FileInfo {
            name: name.to_owned(),
            size: 0,
            is_dir: false,
            modified: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn fingerprint_ignores_metadata_other_than_names() {
        let mut bigger = info("a");
        bigger.size = 4096;
        assert_eq!(fingerprint("/d", &[info("a")]), fingerprint("/d", &[bigger]));
    }

    #[test]
    fn fingerprint_separates_path_from_names() {
        assert_ne!(
            fingerprint("/da", &[info("b")]),
            fingerprint("/d", &[info("ab")])
        );
    }

    #[test]
    fn empty_listing_depends_on_path() {
        assert_ne!(fingerprint("/a", &[]), fingerprint("/b", &[]));
    }
}
