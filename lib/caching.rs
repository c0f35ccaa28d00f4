//! [`CachingHandler`]: a handler decorator providing stateful file handles and
//! cookie-verifiers on top of any base [`Handler`].

use std::num::NonZeroUsize;
use std::sync::Arc;

use tracing::instrument;

use crate::cache::handles::{FileHandle, HandleCache, HandleError};
use crate::cache::verifiers::VerifierCache;
use crate::config::CacheConfig;
use crate::fs::{FileInfo, FsStat, HandleTranslator, Handler, HandlerError, Store};
use crate::report::CacheReport;

/// Wraps a base handler with an LRU file handle cache and an LRU listing cache.
///
/// Handle and verifier operations are served from the caches; everything in [`Handler`] is
/// forwarded to the wrapped handler untouched.
pub struct CachingHandler<H> {
    inner: H,
    handles: HandleCache,
    verifiers: VerifierCache,
}

impl<H: Handler> CachingHandler<H> {
    /// Wrap `inner`, sizing both caches to `limit`.
    #[must_use]
    pub fn new(inner: H, limit: NonZeroUsize) -> Self {
        Self::with_verifier_limit(inner, limit, limit)
    }

    /// Wrap `inner` with independently sized caches. A smaller `verifier_limit` bounds how many
    /// directory listings are kept in flight.
    #[must_use]
    pub fn with_verifier_limit(inner: H, limit: NonZeroUsize, verifier_limit: NonZeroUsize) -> Self {
        Self {
            inner,
            handles: HandleCache::new(limit),
            verifiers: VerifierCache::new(verifier_limit),
        }
    }

    /// Wrap `inner` with the capacities from `config`.
    #[must_use]
    pub fn from_config(inner: H, config: &CacheConfig) -> Self {
        Self::with_verifier_limit(inner, config.handle_capacity(), config.verifier_capacity())
    }

    /// The wrapped base handler.
    #[must_use]
    pub fn inner(&self) -> &H {
        &self.inner
    }

    /// The file handle cache.
    #[must_use]
    pub fn handles(&self) -> &HandleCache {
        &self.handles
    }

    /// The listing cache.
    #[must_use]
    pub fn verifiers(&self) -> &VerifierCache {
        &self.verifiers
    }

    /// A point-in-time dump of both caches.
    #[must_use]
    pub fn report(&self) -> CacheReport {
        CacheReport::capture(&self.handles, &self.verifiers)
    }
}

impl<H: Handler> Handler for CachingHandler<H> {
    #[instrument(name = "CachingHandler::mount", skip(self))]
    fn mount(&self, export: &str) -> Result<Store, HandlerError> {
        self.inner.mount(export)
    }

    #[instrument(name = "CachingHandler::fs_stat", skip(self, store))]
    fn fs_stat(&self, store: &Store, path: &[String]) -> Result<FsStat, HandlerError> {
        self.inner.fs_stat(store, path)
    }
}

impl<H: Handler> HandleTranslator for CachingHandler<H> {
    fn to_handle(&self, store: &Store, path: &[String]) -> FileHandle {
        self.handles.mint(store, path)
    }

    fn from_handle(&self, fh: &[u8]) -> Result<(Store, Vec<String>), HandleError> {
        self.handles.resolve(fh)
    }

    fn rename_handle(
        &self,
        dir_fh: &[u8],
        old_name: &str,
        new_name: &str,
    ) -> Result<(), HandleError> {
        self.handles.rename_child(dir_fh, old_name, new_name)
    }

    fn rebind_handle(&self, fh: &[u8], store: Store, path: Vec<String>) -> Result<(), HandleError> {
        self.handles.rebind(fh, store, path)
    }

    fn handle_limit(&self) -> usize {
        self.handles.capacity()
    }

    fn verifier_for(&self, path: &str, listing: Vec<FileInfo>) -> u64 {
        self.verifiers.snapshot(path, listing)
    }

    fn data_for_verifier(&self, path: &str, verifier: u64) -> Option<Arc<[FileInfo]>> {
        self.verifiers.lookup(path, verifier)
    }

    fn invalidate_verifier(&self, path: &str) {
        self.verifiers.invalidate(path);
    }
}
