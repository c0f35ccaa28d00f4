/// Cache eviction policies.
pub mod eviction;
/// Opaque file handle to `(store, path)` translation.
pub mod handles;
/// Directory listing snapshots keyed by cookie-verifier.
pub mod verifiers;
