/// Least-recently-used ordering and eviction.
pub mod lru;
