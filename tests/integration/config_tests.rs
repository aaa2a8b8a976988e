use clap::Parser;
use mdsync::cli::{Cli, Commands};
use mdsync::config::{Config, ConfigError, ENV_PREFIX};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::tempdir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_toml_file_overrides_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mdsync.toml");
    fs::write(
        &path,
        r#"
[scan]
dir = "posts"
workers = 3
exclude = ["drafts/"]

[database]
path = "blog.db"
"#,
    )
    .unwrap();

    let config: Config = Config::figment(Some(&path)).extract().unwrap();

    assert_eq!(config.scan.dir, PathBuf::from("posts"));
    assert_eq!(config.scan.workers, 3);
    assert_eq!(config.scan.exclude, vec!["drafts/"]);
    assert_eq!(config.database.path, PathBuf::from("blog.db"));
    // Untouched sections keep their defaults
    assert_eq!(config.batch.size, 50);
    assert!(!config.scan.skip_hidden);
    assert!(!config.scan.respect_gitignore);
}

#[test]
fn test_environment_overrides_file() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let dir = tempdir().unwrap();
    let path = dir.path().join("mdsync.toml");
    fs::write(&path, "[batch]\nsize = 10\ninterval_ms = 200\n").unwrap();

    let key = format!("{ENV_PREFIX}BATCH__SIZE");
    std::env::set_var(&key, "75");
    let result = Config::figment(Some(&path)).extract::<Config>();
    std::env::remove_var(&key);

    let config = result.unwrap();
    assert_eq!(config.batch.size, 75);
    assert_eq!(config.batch.interval_ms, 200);
}

#[test]
fn test_wrong_type_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mdsync.toml");
    fs::write(&path, "[scan]\nworkers = \"many\"\n").unwrap();

    assert!(matches!(
        Config::load(Some(&path)),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_zero_batch_size_in_file_is_rejected() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let dir = tempdir().unwrap();
    let path = dir.path().join("mdsync.toml");
    fs::write(&path, "[batch]\nsize = 0\n").unwrap();

    assert!(matches!(
        Config::load(Some(&path)),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn test_command_line_wins_over_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mdsync.toml");
    fs::write(
        &path,
        "[scan]\ndir = \"posts\"\nworkers = 2\nexclude = [\"a/\"]\n",
    )
    .unwrap();

    let cli = Cli::parse_from([
        "mdsync",
        "sync",
        "--dir",
        "other",
        "--workers",
        "6",
        "--batch-interval-ms",
        "5",
        "--exclude",
        "b/",
    ]);
    let Commands::Sync(args) = cli.command else {
        panic!("expected sync command");
    };

    let mut config: Config = Config::figment(Some(&path)).extract().unwrap();
    config.apply_sync_args(&args);
    let sync = config.sync_config();

    assert_eq!(sync.root, PathBuf::from("other"));
    assert_eq!(sync.workers, 6);
    assert_eq!(sync.batch.interval, Duration::from_millis(5));
    assert_eq!(sync.walker.exclude_patterns, vec!["a/", "b/"]);
}

#[test]
fn test_written_default_loads_back() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mdsync.toml");
    Config::write_default(&path, false).unwrap();

    let config: Config = Config::figment(Some(&path)).extract().unwrap();
    assert_eq!(config.scan, Config::default().scan);
    assert_eq!(config.database, Config::default().database);
}
