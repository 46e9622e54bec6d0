//! End-to-end tests for the tally-secrets binary
//!
//! Each test runs the CLI against isolated key and secrets directories
//! via the TALLY_KEY_DIR / TALLY_SECRETS_DIR overrides.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A CLI invocation wired to isolated directories and a no-op editor
fn cmd(dirs: &TempDir) -> Command {
    let mut command = Command::cargo_bin("tally-secrets").unwrap();
    command
        .env("TALLY_KEY_DIR", dirs.path().join("keys"))
        .env("TALLY_SECRETS_DIR", dirs.path().join("secrets"))
        .env("VISUAL", "true")
        .env_remove("EDITOR");
    command
}

#[test]
fn keygen_creates_identity_and_prints_public_key() {
    let dirs = TempDir::new().unwrap();

    cmd(&dirs)
        .args(["keygen", "development"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Public key:"));

    assert!(dirs.path().join("keys").join("development.key").exists());
}

#[test]
fn keygen_declined_overwrite_fails() {
    let dirs = TempDir::new().unwrap();

    cmd(&dirs).args(["keygen", "development"]).assert().success();

    cmd(&dirs)
        .args(["keygen", "development"])
        .write_stdin("no\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Declined"));
}

#[test]
fn keygen_unknown_environment_fails() {
    let dirs = TempDir::new().unwrap();

    cmd(&dirs)
        .args(["keygen", "staging"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown environment"));
}

#[test]
fn show_key_reports_absence_and_presence() {
    let dirs = TempDir::new().unwrap();

    cmd(&dirs)
        .arg("show-key")
        .assert()
        .success()
        .stdout(predicate::str::contains("no identity"));

    cmd(&dirs).args(["keygen", "production"]).assert().success();

    cmd(&dirs)
        .arg("show-key")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("production")
                .and(predicate::str::contains("no identity at").count(2)),
        );
}

#[cfg(unix)]
#[test]
fn new_creates_encrypted_bundle() {
    let dirs = TempDir::new().unwrap();

    cmd(&dirs).args(["keygen", "development"]).assert().success();
    cmd(&dirs).args(["new", "development"]).assert().success();

    let encrypted = dirs
        .path()
        .join("secrets")
        .join("development.enc.json");
    assert!(encrypted.exists());

    // Template placeholders must not be readable in the ciphertext
    let raw = std::fs::read_to_string(&encrypted).unwrap();
    assert!(!raw.contains("replace-me"));
}

#[test]
fn new_without_identity_fails_with_guidance() {
    let dirs = TempDir::new().unwrap();

    cmd(&dirs)
        .args(["new", "development"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("keygen"));
}

#[cfg(unix)]
#[test]
fn noop_edit_skips_rewrite() {
    let dirs = TempDir::new().unwrap();

    cmd(&dirs).args(["keygen", "development"]).assert().success();
    cmd(&dirs).args(["new", "development"]).assert().success();

    let encrypted = dirs
        .path()
        .join("secrets")
        .join("development.enc.json");
    let before = std::fs::read_to_string(&encrypted).unwrap();

    cmd(&dirs)
        .args(["edit", "development"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes"));

    let after = std::fs::read_to_string(&encrypted).unwrap();
    assert_eq!(before, after);
}

#[cfg(unix)]
#[test]
fn failing_editor_aborts_edit() {
    let dirs = TempDir::new().unwrap();

    cmd(&dirs).args(["keygen", "development"]).assert().success();
    cmd(&dirs).args(["new", "development"]).assert().success();

    cmd(&dirs)
        .args(["edit", "development"])
        .env("VISUAL", "false")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Editor"));
}

#[test]
fn edit_missing_bundle_fails() {
    let dirs = TempDir::new().unwrap();

    cmd(&dirs).args(["keygen", "development"]).assert().success();

    cmd(&dirs)
        .args(["edit", "development"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("development.enc.json"));
}

#[test]
fn encrypt_decrypt_round_trip() {
    let dirs = TempDir::new().unwrap();
    let file = dirs.path().join("notes.txt");
    std::fs::write(&file, "ad hoc plaintext").unwrap();

    cmd(&dirs).args(["keygen", "development"]).assert().success();

    cmd(&dirs)
        .arg("encrypt")
        .arg(&file)
        .assert()
        .success();

    std::fs::remove_file(&file).unwrap();

    cmd(&dirs)
        .arg("decrypt")
        .arg(dirs.path().join("notes.txt.enc"))
        .assert()
        .success();

    assert_eq!(std::fs::read_to_string(&file).unwrap(), "ad hoc plaintext");
}

#[test]
fn decrypt_with_wrong_identity_fails() {
    let dirs = TempDir::new().unwrap();
    let file = dirs.path().join("notes.txt");
    std::fs::write(&file, "plaintext").unwrap();

    cmd(&dirs).args(["keygen", "development"]).assert().success();
    cmd(&dirs).arg("encrypt").arg(&file).assert().success();

    // A second machine with its own identity cannot read the file
    let other = TempDir::new().unwrap();
    cmd(&other).args(["keygen", "development"]).assert().success();

    cmd(&other)
        .arg("decrypt")
        .arg(dirs.path().join("notes.txt.enc"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("your public key"));
}

#[test]
fn encrypt_missing_file_fails() {
    let dirs = TempDir::new().unwrap();

    cmd(&dirs).args(["keygen", "development"]).assert().success();

    cmd(&dirs)
        .arg("encrypt")
        .arg(dirs.path().join("absent.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.txt"));
}
