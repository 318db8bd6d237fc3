use assert_cmd::Command;
use predicates::prelude::*;

fn quill() -> Command {
    let mut cmd = Command::cargo_bin("quill_cli").unwrap();
    for var in [
        "ADMIN_EMAIL",
        "ADMIN_PASSWORD",
        "ADMIN_NAME",
        "ADMIN_ROLE",
        "DATABASE_URL",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn version_prints_package_and_version() {
    quill()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "quill_cli {}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn seed_admin_rejects_short_password_before_connecting() {
    quill()
        .args([
            "seed-admin",
            "--email",
            "boss@example.com",
            "--password",
            "short",
            "--database-url",
            "postgres://127.0.0.1:1/unreachable",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains("密碼長度至少需要"));
}

#[test]
fn seed_admin_rejects_unknown_role() {
    quill()
        .args([
            "seed-admin",
            "--email",
            "boss@example.com",
            "--password",
            "long-enough-password",
            "--role",
            "owner",
            "--database-url",
            "postgres://127.0.0.1:1/unreachable",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains("unknown role"));
}

#[test]
fn seed_admin_rejects_invalid_email() {
    quill()
        .args([
            "seed-admin",
            "--email",
            "not-an-email",
            "--password",
            "long-enough-password",
            "--database-url",
            "postgres://127.0.0.1:1/unreachable",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains("invalid email"));
}

#[test]
fn seed_admin_requires_an_email() {
    quill()
        .args([
            "seed-admin",
            "--password",
            "long-enough-password",
            "--database-url",
            "postgres://127.0.0.1:1/unreachable",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--email"));
}
