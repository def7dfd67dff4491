//! Smoke tests for tonglian-demo-cli
//!
//! These tests verify basic functionality of the CLI without requiring
//! network access.

use std::path::Path;
use std::process::{Command, Output};

use serde_json::{json, Value};
use tempfile::TempDir;
use tonglian_lib::{GatewayConfig, ParameterSet};

const CONFIG: &str = r#"{
    "api_base_url": "https://gw.test/pay/api",
    "merchant_id": "M1",
    "app_id": "A1",
    "merchant_key": "k",
    "sign_type": "MD5"
}"#;

fn cli() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_tonglian-demo"));
    for var in [
        "TONGLIAN_API_BASE_URL",
        "TONGLIAN_MERCHANT_ID",
        "TONGLIAN_MERCHANT_KEY",
        "TONGLIAN_SIGN_TYPE",
    ] {
        command.env_remove(var);
    }
    command
}

fn write_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("tonglian.json");
    std::fs::write(&path, CONFIG).expect("Failed to write config");
    path
}

fn run(config: &Path, args: &[&str]) -> Output {
    cli()
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI can show help
#[test]
fn test_cli_help() {
    let output = cli().arg("--help").output().expect("Failed to execute command");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    for command in [
        "unified-order",
        "applet-url",
        "refund",
        "query-order",
        "query-refund",
        "download-bill",
        "query-balance",
        "sign",
        "verify",
    ] {
        assert!(stdout.contains(command), "Help should mention '{}'", command);
    }
}

/// Test that version is shown
#[test]
fn test_cli_version() {
    let output = cli().arg("--version").output().expect("Failed to execute command");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("tonglian-demo"));
}

/// Offline signing produces a signature the library accepts
#[test]
fn test_sign_json_output() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(&dir);

    let output = run(
        &config,
        &["--json", "sign", r#"{"mchNo":"M1","amount":100,"memo":""}"#],
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let signed: Value = serde_json::from_slice(&output.stdout).expect("JSON output");
    assert_eq!(signed["sign_type"], "MD5");
    assert_eq!(signed["canonical"], "amount=100&mchNo=M1&key=***");

    let signer = GatewayConfig::from_json(CONFIG).unwrap().build_signer().unwrap();
    let params = ParameterSet::from_value(json!({"mchNo": "M1", "amount": 100})).unwrap();
    assert_eq!(signed["sign"], signer.sign(&params).unwrap());
    assert_eq!(signed["params"]["sign"], signed["sign"]);
}

/// Verify accepts a sealed object and rejects a tampered one
#[test]
fn test_verify_round_trip() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(&dir);

    let signer = GatewayConfig::from_json(CONFIG).unwrap().build_signer().unwrap();
    let sealed = signer
        .seal(ParameterSet::from_value(json!({"mchNo": "M1", "state": 2})).unwrap())
        .unwrap()
        .into_value();

    let file = dir.path().join("signed.json");
    std::fs::write(&file, sealed.to_string()).unwrap();
    let output = run(&config, &["verify", &format!("@{}", file.display())]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("valid"));

    let mut tampered = sealed.clone();
    tampered["state"] = json!(3);
    let output = run(&config, &["--json", "verify", &tampered.to_string()]);
    assert!(!output.status.success());
    let verified: Value = serde_json::from_slice(&output.stdout).expect("JSON output");
    assert_eq!(verified["valid"], false);
}

/// Network commands fail cleanly without any configuration
#[test]
fn test_missing_configuration() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output = run(
        &dir.path().join("absent.json"),
        &["query-order", "--order-no", "O1"],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("TONGLIAN_API_BASE_URL") || stderr.contains("configuration"));
}

/// Local validation rejects bad input before any request is made
#[test]
fn test_bad_payment_method() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(&dir);

    let output = run(
        &config,
        &["unified-order", "--order-no", "O1", "--amount", "100", "--way", "BITCOIN"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("BITCOIN"));
}
