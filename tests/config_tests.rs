#![allow(clippy::unwrap_used, missing_docs)]

use std::io::Write as _;

use nfs_handle_cache::config::{CacheConfig, ConfigError};

#[test]
fn defaults() {
    let config = CacheConfig::default();
    assert_eq!(config.handle_limit, 1024);
    assert_eq!(config.verifier_limit, None);
    assert_eq!(config.handle_capacity().get(), 1024);
    assert_eq!(config.verifier_capacity().get(), 1024);
}

#[test]
fn empty_file_is_default() {
    assert_eq!(CacheConfig::from_toml("").unwrap(), CacheConfig::default());
}

#[test]
fn parses_kebab_case_keys() {
    let config = CacheConfig::from_toml("handle-limit = 64\nverifier-limit = 8\n").unwrap();
    assert_eq!(config.handle_capacity().get(), 64);
    assert_eq!(config.verifier_capacity().get(), 8);
}

#[test]
fn verifier_limit_falls_back_to_handle_limit() {
    let config = CacheConfig::from_toml("handle-limit = 32").unwrap();
    assert_eq!(config.verifier_capacity().get(), 32);
}

#[test]
fn zero_limits_are_rejected() {
    let err = CacheConfig::from_toml("handle-limit = 0\nverifier-limit = 0").unwrap_err();
    match err {
        ConfigError::ValidationErrors(errors) => assert_eq!(errors.len(), 2, "{errors:?}"),
        other => panic!("expected validation errors, got {other:?}"),
    }
}

#[test]
fn unknown_fields_are_rejected() {
    let err = CacheConfig::from_toml("handle-limit = 4\nlimit = 9").unwrap_err();
    assert!(matches!(err, ConfigError::DeserializationError(_)), "{err:?}");
}

#[test]
fn load_reads_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "handle-limit = 16").unwrap();

    let config = CacheConfig::load(file.path()).unwrap();
    assert_eq!(config.handle_limit, 16);
    assert_eq!(CacheConfig::load_or_default(Some(file.path())).unwrap(), config);
}

#[test]
fn load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = CacheConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::IoError(_)), "{err:?}");
}

#[test]
fn load_or_default_without_path() {
    assert_eq!(CacheConfig::load_or_default(None).unwrap(), CacheConfig::default());
}
