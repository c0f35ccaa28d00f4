#![allow(dead_code, missing_docs, clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use nfs_handle_cache::fs::{Backend, FileInfo, FsStat, Handler, HandlerError, Store};

/// Build a path from string components.
pub fn path(components: &[&str]) -> Vec<String> {
    components.iter().map(|c| (*c).to_owned()).collect()
}

/// A plain file entry with the given name.
pub fn info(name: &str) -> FileInfo {
    FileInfo {
        name: name.to_owned(),
        size: 0,
        is_dir: false,
        modified: SystemTime::UNIX_EPOCH,
    }
}

/// A listing of plain files, in the given order.
pub fn listing(names: &[&str]) -> Vec<FileInfo> {
    names.iter().map(|n| info(n)).collect()
}

/// A store that knows nothing. The caches never call into it, so identity is all that matters.
pub struct NullBackend;

impl Backend for NullBackend {
    fn stat(&self, _path: &[String]) -> Result<FileInfo, HandlerError> {
        Err(HandlerError::NotFound)
    }

    fn read_dir(&self, _path: &[String]) -> Result<Vec<FileInfo>, HandlerError> {
        Err(HandlerError::NotFound)
    }
}

pub fn null_store() -> Store {
    Arc::new(NullBackend)
}

/// A base handler that records every call forwarded to it.
pub struct MockHandler {
    pub store: Store,
    pub stat: FsStat,
    pub mounts: Mutex<Vec<String>>,
    pub fs_stat_calls: AtomicUsize,
}

impl MockHandler {
    pub fn new() -> Self {
        Self {
            store: null_store(),
            stat: FsStat {
                total_bytes: 1 << 30,
                free_bytes: 1 << 20,
                available_bytes: 1 << 19,
                total_files: 100,
                free_files: 42,
            },
            mounts: Mutex::new(Vec::new()),
            fs_stat_calls: AtomicUsize::new(0),
        }
    }

    pub fn mounted(&self) -> Vec<String> {
        self.mounts.lock().unwrap().clone()
    }
}

impl Handler for MockHandler {
    fn mount(&self, export: &str) -> Result<Store, HandlerError> {
        self.mounts.lock().unwrap().push(export.to_owned());
        if export == "/missing" {
            return Err(HandlerError::NotFound);
        }
        Ok(Arc::clone(&self.store))
    }

    fn fs_stat(&self, _store: &Store, _path: &[String]) -> Result<FsStat, HandlerError> {
        self.fs_stat_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.stat)
    }
}
