//! Integration tests for the tabauth binary
//!
//! Each test points the binary at its own config directory.

use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::tempdir;

const TABAUTH_BINARY: &str = env!("CARGO_BIN_EXE_tabauth");

fn tabauth(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(TABAUTH_BINARY)
        .args(args)
        .env("TABAUTH_CONFIG_DIR", config_dir)
        .env_remove("JOURNAL_STREAM")
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to run tabauth")
}

fn write_config(config_dir: &Path) {
    std::fs::write(config_dir.join("config.toml"), "user_id = \"alice\"\n").unwrap();
}

#[test]
fn test_help_lists_commands() {
    let dir = tempdir().unwrap();
    let output = tabauth(dir.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["setup", "codes", "add", "scan", "list", "remove", "reorder"] {
        assert!(stdout.contains(command), "help should mention {}", command);
    }
}

#[test]
fn test_missing_config_exits_with_config_code() {
    let dir = tempdir().unwrap();
    let output = tabauth(dir.path(), &["codes"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load configuration file"));
}

#[test]
fn test_add_list_codes_remove() {
    let dir = tempdir().unwrap();
    write_config(dir.path());

    let output = tabauth(
        dir.path(),
        &["add", "--issuer", "GitHub", "--account", "alice", "--secret", "JBSWY3DPEHPK3PXP"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let output = tabauth(dir.path(), &["list", "--json"]);
    assert!(output.status.success());
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = listed.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["issuer"], "GitHub");
    assert!(entries[0].get("secret").is_none());
    let id = entries[0]["id"].as_str().unwrap().to_string();

    let output = tabauth(dir.path(), &["codes", "--filter", "git"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("GitHub"));
    assert!(stdout.chars().filter(char::is_ascii_digit).count() >= 6);

    let output = tabauth(dir.path(), &["remove", &id]);
    assert!(output.status.success());

    let output = tabauth(dir.path(), &["remove", &id]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_setup_stops_when_stdin_closes() {
    let dir = tempdir().unwrap();
    // No USER means the user id prompt has no default to fall back on
    let output = Command::new(TABAUTH_BINARY)
        .arg("setup")
        .env("TABAUTH_CONFIG_DIR", dir.path())
        .env_remove("USER")
        .env_remove("JOURNAL_STREAM")
        .stdin(Stdio::null())
        .output()
        .expect("Failed to run tabauth");

    assert!(!output.status.success());
    assert!(!dir.path().join("config.toml").exists());
}

#[test]
fn test_add_rejects_blank_secret() {
    let dir = tempdir().unwrap();
    write_config(dir.path());

    let output = tabauth(dir.path(), &["add", "--issuer", "GitHub", "--secret", "  "]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Please enter a secret"));
}

#[test]
fn test_scan_blank_image_reports_not_found() {
    let dir = tempdir().unwrap();
    write_config(dir.path());

    let image_path = dir.path().join("blank.png");
    image::RgbaImage::from_pixel(64, 64, image::Rgba([255, 255, 255, 255]))
        .save(&image_path)
        .unwrap();

    let output = tabauth(dir.path(), &["scan", image_path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("QR code not found"));
}
