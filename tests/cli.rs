use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command isolated from any ambient config, credentials or summarizer
fn kbsync(dir: &Path) -> anyhow::Result<Command> {
    let config = dir.join("config.toml");
    std::fs::write(&config, "[summarizer]\ncommand = \"\"\n")?;

    let mut cmd = Command::cargo_bin("kbsync")?;
    cmd.current_dir(dir)
        .env_remove("KBSYNC_CONFIG")
        .env_remove("KBSYNC_ROOT")
        .env_remove("CONFLUENCE_BASE_URL")
        .env_remove("CONFLUENCE_USERNAME")
        .env_remove("CONFLUENCE_API_TOKEN")
        .arg("--config")
        .arg(&config)
        .arg("--root")
        .arg(dir.join("knowledge"));
    Ok(cmd)
}

fn write_manifest(dir: &Path, kb: &str, json: &str) -> anyhow::Result<()> {
    let kb_dir = dir.join("knowledge").join(kb);
    std::fs::create_dir_all(&kb_dir)?;
    std::fs::write(kb_dir.join("manifest.json"), json)?;
    Ok(())
}

const PLATFORM_MANIFEST: &str = r#"{
  "version": "1.0",
  "name": "platform",
  "kb_type": "remote",
  "sources": [
    {"type": "confluence", "pages": [{"id": "42", "title": "Deploy Guide", "summary": "Deploy pipeline and rollback steps"}]},
    {"type": "web", "urls": [{"url": "https://docs.example.com/ingress", "summary": "Ingress controllers and TLS"}]}
  ]
}"#;

#[test]
fn test_list_empty_root() -> anyhow::Result<()> {
    let dir = TempDir::new()?;

    kbsync(dir.path())?
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No knowledge bases"));
    Ok(())
}

#[test]
fn test_list_json_reports_counts() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    write_manifest(dir.path(), "platform", PLATFORM_MANIFEST)?;
    write_manifest(dir.path(), "broken", "{ not json")?;

    kbsync(dir.path())?
        .args(["list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"platform\""))
        .stdout(predicate::str::contains("\"type\": \"remote\""))
        .stdout(predicate::str::contains("\"pages\": 1"))
        .stdout(predicate::str::contains("broken").not());
    Ok(())
}

#[test]
fn test_show_prints_sources() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    write_manifest(dir.path(), "platform", PLATFORM_MANIFEST)?;

    kbsync(dir.path())?
        .args(["show", "platform"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deploy Guide"))
        .stdout(predicate::str::contains("https://docs.example.com/ingress"));
    Ok(())
}

#[test]
fn test_show_missing_kb_fails() -> anyhow::Result<()> {
    let dir = TempDir::new()?;

    kbsync(dir.path())?
        .args(["show", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No readable manifest"));
    Ok(())
}

#[test]
fn test_add_url_rejects_non_http_scheme() -> anyhow::Result<()> {
    let dir = TempDir::new()?;

    kbsync(dir.path())?
        .args(["add-url", "docs", "ftp://files.example.com/guide"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported URL scheme"));

    assert!(!dir.path().join("knowledge").join("docs").exists());
    Ok(())
}

#[test]
fn test_refresh_without_credentials_is_configuration_error() -> anyhow::Result<()> {
    let dir = TempDir::new()?;

    kbsync(dir.path())?
        .args(["refresh", "platform"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
    Ok(())
}

#[test]
fn test_refresh_requires_kb_or_all() -> anyhow::Result<()> {
    let dir = TempDir::new()?;

    kbsync(dir.path())?.arg("refresh").assert().failure();
    Ok(())
}
