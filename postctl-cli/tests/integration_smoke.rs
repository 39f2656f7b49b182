//! Smoke tests for subcommand wiring against a scratch site directory

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `postctl` pointed at an empty config and a scratch content directory
fn postctl(site: &TempDir) -> Command {
    let config_path = site.path().join("config.toml");
    if !config_path.exists() {
        std::fs::write(&config_path, "").unwrap();
    }

    let mut cmd = Command::cargo_bin("postctl").unwrap();
    cmd.env_remove("POSTCTL_CONTENT_DIR")
        .env_remove("POSTCTL_ASSETS_DIR")
        .env_remove("POSTCTL_ASSETS_URL")
        .env_remove("POSTCTL_PERMALINK_STYLE")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(&config_path)
        .arg("--content-dir")
        .arg(site.path().join("_posts"))
        .arg("--assets-dir")
        .arg(site.path().join("uploads"));
    cmd
}

fn post_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn test_help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("postctl").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("permalink"))
        .stdout(predicate::str::contains("upload"));
}

#[test]
fn test_create_help() {
    let mut cmd = Command::cargo_bin("postctl").unwrap();
    cmd.arg("create").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Post title"));
}

#[test]
fn test_list_empty_site() {
    let site = TempDir::new().unwrap();

    postctl(&site)
        .arg("list")
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_create_then_list_and_get() {
    let site = TempDir::new().unwrap();

    postctl(&site)
        .args(["create", "--title", "Hello, World!", "--body", "First post"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello-world.md"));

    let files = post_files(&site.path().join("_posts"));
    assert_eq!(files.len(), 1);
    let identifier = files[0].clone();
    assert!(identifier.ends_with("-hello-world.md"));

    postctl(&site)
        .args(["list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"title\": \"Hello, World!\""))
        .stdout(predicate::str::contains("\"permalink\""));

    postctl(&site)
        .args(["get", identifier.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("First post"));
}

#[test]
fn test_update_and_delete() {
    let site = TempDir::new().unwrap();

    postctl(&site)
        .args(["create", "--title", "Draft", "--body", "keep me"])
        .assert()
        .success();
    let identifier = post_files(&site.path().join("_posts")).remove(0);

    postctl(&site)
        .args(["update", identifier.as_str(), "--title", "Final"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated"));

    postctl(&site)
        .args(["get", identifier.as_str(), "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"title\": \"Final\""))
        .stdout(predicate::str::contains("keep me"));

    postctl(&site).args(["delete", identifier.as_str()]).assert().success();

    postctl(&site)
        .args(["get", identifier.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_blank_title_fails() {
    let site = TempDir::new().unwrap();

    postctl(&site)
        .args(["create", "--title", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid title"));

    assert!(post_files(&site.path().join("_posts")).is_empty());
}

#[test]
fn test_permalink_styles() {
    let site = TempDir::new().unwrap();
    let posts = site.path().join("_posts");
    std::fs::create_dir_all(&posts).unwrap();
    std::fs::write(
        posts.join("2024-01-15-hello-world.md"),
        "---\ntitle: Hello\ncategories: tech\n---\nBody",
    )
    .unwrap();

    postctl(&site)
        .args(["permalink", "2024-01-15-hello-world.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/tech/2024/01/15/hello-world/"));

    postctl(&site)
        .args(["permalink", "2024-01-15-hello-world.md", "--style", "simple_ext"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/tech/hello-world.html"));
}

#[test]
fn test_upload() {
    let site = TempDir::new().unwrap();
    let source = site.path().join("My Photo.PNG");
    std::fs::write(&source, b"not really a png").unwrap();

    postctl(&site)
        .arg("upload")
        .arg(&source)
        .args(["--output", "quiet"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("/images/uploads/"))
        .stdout(predicate::str::contains("-my-photo.png"));

    assert_eq!(post_files(&site.path().join("uploads")).len(), 1);
}
