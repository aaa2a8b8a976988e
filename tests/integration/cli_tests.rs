use clap::Parser;
use mdsync::cli::Cli;
use mdsync::error::ExitCode;
use mdsync::run_app;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    let mut argv = vec!["mdsync", "-q"];
    argv.extend_from_slice(args);
    run_app(Cli::parse_from(argv))
}

fn s(path: &Path) -> &str {
    path.to_str().unwrap()
}

/// A workspace with a config file pointing at `articles/` and `mdsync.db`.
fn workspace() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let config = dir.path().join("mdsync.toml");
    fs::write(
        &config,
        format!(
            "[scan]\ndir = \"{}\"\nworkers = 2\n\n[database]\npath = \"{}\"\n",
            dir.path().join("articles").display(),
            dir.path().join("mdsync.db").display()
        ),
    )
    .unwrap();
    (dir, config)
}

#[test]
fn test_generate_sync_list_show() {
    let (dir, config) = workspace();
    let articles = dir.path().join("articles");

    let code = run(&["generate", "-n", "15", "-o", s(&articles)]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert_eq!(fs::read_dir(&articles).unwrap().count(), 15);

    let code = run(&["-c", s(&config), "sync", "--no-progress"]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(dir.path().join("mdsync.db").exists());

    let code = run(&["-c", s(&config), "list", "--page", "2", "-o", "json"]).unwrap();
    assert_eq!(code, ExitCode::Success);
    let code = run(&["-c", s(&config), "show", "7"]).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_sync_with_bad_file_is_partial_success() {
    let (dir, config) = workspace();
    let articles = dir.path().join("articles");
    run(&["generate", "-n", "3", "-o", s(&articles)]).unwrap();
    fs::write(articles.join("broken.md"), "nothing to see").unwrap();

    let code = run(&["-c", s(&config), "sync", "-o", "json"]).unwrap();
    assert_eq!(code, ExitCode::PartialSuccess);
}

#[test]
fn test_show_unknown_id_fails() {
    let (dir, config) = workspace();
    let articles = dir.path().join("articles");
    run(&["generate", "-n", "2", "-o", s(&articles)]).unwrap();
    run(&["-c", s(&config), "sync", "--no-progress"]).unwrap();

    let err = run(&["-c", s(&config), "show", "999"]).unwrap_err();
    assert!(err.to_string().contains("999"));
}

#[test]
fn test_list_without_database_fails() {
    let (dir, config) = workspace();
    let err = run(&["-c", s(&config), "list"]).unwrap_err();
    assert!(err.to_string().contains("does not exist"));
    assert!(!dir.path().join("mdsync.db").exists());
}

#[test]
fn test_sync_missing_directory_fails() {
    let (_dir, config) = workspace();
    assert!(run(&["-c", s(&config), "sync"]).is_err());
}

#[test]
fn test_missing_config_file_fails() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let err = run(&["-c", s(&missing), "sync"]).unwrap_err();
    assert!(format!("{err:#}").contains("not found"));
}

#[test]
fn test_init_config_refuses_to_overwrite() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("conf").join("mdsync.toml");

    assert_eq!(
        run(&["init-config", "-o", s(&path)]).unwrap(),
        ExitCode::Success
    );
    assert!(fs::read_to_string(&path).unwrap().contains("[batch]"));
    assert!(run(&["init-config", "-o", s(&path)]).is_err());
    assert!(run(&["init-config", "-o", s(&path), "--force"]).is_ok());
}

#[test]
fn test_generate_zero_fails() {
    let dir = tempdir().unwrap();
    assert!(run(&["generate", "-n", "0", "-o", s(dir.path())]).is_err());
}
