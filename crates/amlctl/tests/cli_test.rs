//! Integration tests for the `amlctl` binary.
//!
//! Argument parsing, help output, completions, configuration and the
//! session gate, plus one list round trip against a mock backend.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// `amlctl` with config, data and keyring lookups confined to `home`.
fn amlctl(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("amlctl");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("XDG_DATA_HOME", home.join(".local/share"))
        .env("NO_COLOR", "1")
        .env_remove("AMLCTL_PROFILE")
        .env_remove("AMLCTL_OUTPUT")
        .env_remove("AMLCTL_INSECURE")
        .env_remove("AMLCTL_TIMEOUT")
        .env_remove("AMLCTL_EMAIL")
        .env_remove("AMLCTL_PASSWORD")
        .env_remove("AML_API_URL")
        .env_remove("AML_DFSA_API_URL")
        .env_remove("RUST_LOG");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn no_args_shows_usage() {
    let home = tempfile::tempdir().unwrap();
    let output = amlctl(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn help_lists_the_entity_commands() {
    let home = tempfile::tempdir().unwrap();
    amlctl(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("customers")
            .and(predicate::str::contains("alerts"))
            .and(predicate::str::contains("cases"))
            .and(predicate::str::contains("reports")),
    );
}

#[test]
fn version_flag() {
    let home = tempfile::tempdir().unwrap();
    amlctl(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("amlctl"));
}

#[test]
fn completions_for_zsh_and_bash() {
    let home = tempfile::tempdir().unwrap();
    amlctl(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
    amlctl(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn unknown_subcommand_fails() {
    let home = tempfile::tempdir().unwrap();
    let output = amlctl(home.path()).arg("wire-transfer").output().unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("wire-transfer"));
}

#[test]
fn malformed_where_clause_is_a_usage_error() {
    let home = tempfile::tempdir().unwrap();
    amlctl(home.path())
        .args(["customers", "list", "--where", "risk_level"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("key=value"));
}

#[test]
fn protected_command_without_session_asks_to_log_in() {
    let home = tempfile::tempdir().unwrap();
    amlctl(home.path())
        .args(["alerts", "list", "--api-url", "http://127.0.0.1:9/api"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Not signed in"));
}

#[test]
fn unknown_profile_lists_alternatives() {
    let home = tempfile::tempdir().unwrap();
    amlctl(home.path())
        .args(["--profile", "staging", "cases", "list"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("staging"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn config_set_then_show() {
    let home = tempfile::tempdir().unwrap();
    amlctl(home.path())
        .args(["config", "set", "api_url", "https://aml.bank.test/api/v1"])
        .assert()
        .success();
    amlctl(home.path())
        .args(["config", "set", "timeout", "45"])
        .assert()
        .success();

    amlctl(home.path())
        .args(["config", "show", "--output", "json"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("https://aml.bank.test/api/v1")
                .and(predicate::str::contains("45")),
        );
}

#[test]
fn config_set_rejects_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    amlctl(home.path())
        .args(["config", "set", "site", "default"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown config key"));
}

#[test]
fn config_use_missing_profile_fails() {
    let home = tempfile::tempdir().unwrap();
    amlctl(home.path())
        .args(["config", "use", "prod"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("prod"));
}

// ── Against a mock backend ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn transactions_list_refines_the_fetched_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/transactions/"))
        .and(query_param("search", "Acme"))
        .and(header("authorization", "Bearer stored-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"id": 41, "amount": "9900.00", "status": "flagged", "customer_name": "Acme Imports"},
                {"id": 42, "amount": 120, "status": "completed", "customer_name": "Acme Exports"}
            ],
            "count": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let credentials = home.path().join("credentials.json");
    std::fs::write(&credentials, r#"{"access_token": "stored-token"}"#).unwrap();

    let api_url = format!("{}/api", server.uri());
    let mut cmd = amlctl(home.path());
    cmd.env("AMLCTL_PROFILES__DEFAULT__CREDENTIALS_FILE", &credentials)
        .args([
            "transactions",
            "list",
            "--api-url",
            &api_url,
            "--search",
            "Acme",
            "--where",
            "status=flagged",
            "--output",
            "plain",
        ]);

    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "41");
}

#[tokio::test(flavor = "multi_thread")]
async fn login_persists_tokens_for_the_next_invocation() {
    let server = MockServer::start().await;
    let user = json!({"id": "U1", "email": "dana@bank.test", "first_name": "Dana", "last_name": "Reyes"});
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": "access-1",
            "refresh": "refresh-1",
            "user": user.clone()
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me/"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let credentials = home.path().join("credentials.json");
    let api_url = format!("{}/api", server.uri());

    let mut login = amlctl(home.path());
    login
        .env("AMLCTL_PROFILES__DEFAULT__CREDENTIALS_FILE", &credentials)
        .env("AMLCTL_PASSWORD", "correct horse")
        .args(["login", "--email", "dana@bank.test", "--api-url", &api_url]);
    let output = tokio::task::spawn_blocking(move || login.output().unwrap())
        .await
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("Signed in as Dana Reyes"));

    let stored: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&credentials).unwrap()).unwrap();
    assert_eq!(stored["refresh_token"], "refresh-1");

    let mut whoami = amlctl(home.path());
    whoami
        .env("AMLCTL_PROFILES__DEFAULT__CREDENTIALS_FILE", &credentials)
        .args(["whoami", "--api-url", &api_url, "--output", "plain"]);
    let output = tokio::task::spawn_blocking(move || whoami.output().unwrap())
        .await
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "dana@bank.test");
}
