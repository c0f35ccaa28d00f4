//! nfs-handle-cache shared library.
//!
//! Stateful file handles and directory cookie-verifiers for network filesystem servers whose
//! backing stores have no durable inode numbers.

/// Bounded LRU caches for handles and listings.
pub mod cache;
/// Handler decorator wiring the caches in front of a base handler.
pub mod caching;
pub mod config;
/// Handler capability sets and backing stores.
pub mod fs;
pub mod report;

pub use caching::CachingHandler;
