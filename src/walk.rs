//! Breadth-first walk of an export, the way an NFS client would traverse it: every directory is
//! reached through a file handle and read page by page through a cookie-verifier.

use std::collections::VecDeque;

use nfs_handle_cache::cache::handles::FileHandle;
use nfs_handle_cache::fs::{Backend as _, HandleTranslator, Handler, HandlerError};
use tracing::{debug, info, warn};

/// Totals gathered during a walk.
#[derive(Debug, Default)]
pub struct WalkStats {
    pub directories: usize,
    pub entries: usize,
    pub pages: usize,
    pub stale_handles: usize,
    pub restarts: usize,
}

/// How many times a directory read restarts after losing its snapshot before giving up.
const MAX_RESTARTS: usize = 3;

pub fn walk<T: Handler + HandleTranslator>(
    handler: &T,
    export: &str,
    max_depth: usize,
    page_size: usize,
) -> Result<WalkStats, HandlerError> {
    let page_size = page_size.max(1);
    let store = handler.mount(export)?;
    let fs_stat = handler.fs_stat(&store, &[])?;
    info!(
        total_bytes = fs_stat.total_bytes,
        available_bytes = fs_stat.available_bytes,
        "mounted export"
    );

    let mut stats = WalkStats::default();
    let mut queue: VecDeque<(FileHandle, usize)> = VecDeque::new();
    queue.push_back((handler.to_handle(&store, &[]), 0));

    while let Some((fh, depth)) = queue.pop_front() {
        let (store, path) = match handler.from_handle(fh.as_bytes()) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(handle = %fh, "{e}; handle evicted before it was visited");
                stats.stale_handles += 1;
                continue;
            }
        };
        let dir_key = format!("/{}", path.join("/"));
        stats.directories += 1;

        let mut restarts = 0;
        'restart: loop {
            let verifier = handler.verifier_for(&dir_key, store.read_dir(&path)?);
            let mut cookie = 0;
            loop {
                let Some(snapshot) = handler.data_for_verifier(&dir_key, verifier) else {
                    stats.restarts += 1;
                    restarts += 1;
                    if restarts > MAX_RESTARTS {
                        warn!(path = %dir_key, "listing keeps getting evicted, skipping directory");
                        break 'restart;
                    }
                    debug!(path = %dir_key, verifier, "bad cookie, restarting listing");
                    continue 'restart;
                };

                let page = snapshot.iter().skip(cookie).take(page_size);
                stats.pages += 1;
                for entry in page {
                    stats.entries += 1;
                    if entry.is_dir && depth + 1 < max_depth {
                        let mut child = path.clone();
                        child.push(entry.name.clone());
                        queue.push_back((handler.to_handle(&store, &child), depth + 1));
                    }
                }

                cookie += page_size;
                if cookie >= snapshot.len() {
                    break 'restart;
                }
            }
        }
    }

    Ok(stats)
}
