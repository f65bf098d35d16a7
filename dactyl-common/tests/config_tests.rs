//! Unit tests for configuration and graceful degradation
//!
//! Tests that manipulate DACTYL_ROOT_FOLDER are marked with #[serial]
//! to prevent ENV variable races between parallel tests.

use dactyl_common::config::{
    ArchiveBackend, CompiledDefaults, RootFolderInitializer, RootFolderResolver, TomlConfig,
    ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();

    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert_eq!(defaults.bind_address, "127.0.0.1:5740");
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let resolved = RootFolderResolver::new().resolve();
    assert_eq!(resolved, CompiledDefaults::for_current_platform().root_folder);
}

#[test]
#[serial]
fn test_resolver_cli_beats_env() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/from-env");

    let resolved = RootFolderResolver::new()
        .with_cli_arg(Some(PathBuf::from("/tmp/from-cli")))
        .resolve();
    assert_eq!(resolved, PathBuf::from("/tmp/from-cli"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_resolver_env_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/from-env");

    let config = TomlConfig::parse("root_folder = \"/tmp/from-toml\"").unwrap();
    let resolved = RootFolderResolver::new().with_toml(&config).resolve();
    assert_eq!(resolved, PathBuf::from("/tmp/from-env"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_resolver_toml_beats_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let config = TomlConfig::parse("root_folder = \"/tmp/from-toml\"").unwrap();
    let resolved = RootFolderResolver::new().with_toml(&config).resolve();
    assert_eq!(resolved, PathBuf::from("/tmp/from-toml"));
}

#[test]
fn test_missing_config_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = TomlConfig::load_or_default(Some(&dir.path().join("absent.toml")));

    assert!(config.root_folder.is_none());
    assert_eq!(config.archive.backend, ArchiveBackend::Filesystem);
}

#[test]
fn test_malformed_config_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is [not toml").unwrap();

    let config = TomlConfig::load_or_default(Some(&path));
    assert!(config.root_folder.is_none());
}

#[test]
fn test_config_file_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[archive]\nbackend = \"memory\"\n").unwrap();

    let config = TomlConfig::load_or_default(Some(&path));
    assert_eq!(config.archive.backend, ArchiveBackend::Memory);
}

#[test]
fn test_initializer_creates_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("nested").join("root");

    let initializer = RootFolderInitializer::new(root.clone());
    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert_eq!(initializer.root_folder(), root.as_path());
}
