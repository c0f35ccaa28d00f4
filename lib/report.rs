//! Diagnostic dumps of cache contents.

use std::fmt;

use crate::cache::handles::{FileHandle, HandleCache};
use crate::cache::verifiers::{VerifierCache, VerifierSummary};

/// A point-in-time copy of both caches, least recently used entries first.
///
/// Each cache is copied under its own lock, so the two halves are individually consistent but
/// may have been taken a moment apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheReport {
    /// Live handles and the paths they resolve to.
    pub handles: Vec<(FileHandle, Vec<String>)>,
    /// Handle cache capacity.
    pub handle_limit: usize,
    /// Cached listings.
    pub verifiers: Vec<VerifierSummary>,
    /// Listing cache capacity.
    pub verifier_limit: usize,
}

impl CacheReport {
    /// Copy the current contents of `handles` and `verifiers`.
    #[must_use]
    pub fn capture(handles: &HandleCache, verifiers: &VerifierCache) -> Self {
        Self {
            handles: handles.snapshot(),
            handle_limit: handles.capacity(),
            verifiers: verifiers.snapshot_entries(),
            verifier_limit: verifiers.capacity(),
        }
    }
}

impl fmt::Display for CacheReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "handles: {}/{}", self.handles.len(), self.handle_limit)?;
        for (handle, path) in &self.handles {
            writeln!(f, "  id: {handle}; path: /{}", path.join("/"))?;
        }
        writeln!(f, "verifiers: {}/{}", self.verifiers.len(), self.verifier_limit)?;
        for summary in &self.verifiers {
            writeln!(
                f,
                "  id: {:#018x}; path: {}; contents: [{}]",
                summary.verifier,
                summary.path,
                summary.names.join(", ")
            )?;
        }
        Ok(())
    }
}
