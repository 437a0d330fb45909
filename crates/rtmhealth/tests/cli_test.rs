//! Integration tests for the `rtmhealth` CLI binary.
//!
//! Argument parsing, help output, shell completions, and exit codes run
//! without a controller. The report tests drive the binary against a
//! wiremock controller and inspect the CSV it writes.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

const TENANT: &str = "t-100";
const TOKEN: &str = "test-token";

/// Build a [`Command`] for the `rtmhealth` binary with env isolation.
///
/// Clears all `RTMHEALTH_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn rtm_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("rtmhealth");
    cmd.env("HOME", "/tmp/rtmhealth-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/rtmhealth-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("RTMHEALTH_PROFILE")
        .env_remove("RTMHEALTH_CONTROLLER")
        .env_remove("RTMHEALTH_TOKEN")
        .env_remove("RTMHEALTH_SITE")
        .env_remove("RTMHEALTH_APP")
        .env_remove("RTMHEALTH_OUTPUT")
        .env_remove("RTMHEALTH_INSECURE")
        .env_remove("RTMHEALTH_TIMEOUT");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// A controller with one site (`HQ`) and one app (`rtp`) whose every flow
/// bucket returns `flows`.
async fn controller(flows: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2.1/api/profile"))
        .and(header("x-auth-token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tenant_id": TENANT })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/v4.7/api/tenants/{TENANT}/sites")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": "site-hq", "name": "HQ" },
                { "id": "site-br", "name": "Branch" }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/v2.3/api/tenants/{TENANT}/appdefs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": "app-rtp", "display_name": "rtp" },
                { "id": "app-sip", "display_name": "sip" }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/v3.6/api/tenants/{TENANT}/monitor/flows")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_status_code": 200,
            "flows": { "items": flows }
        })))
        .mount(&server)
        .await;

    server
}

fn lossy_flow() -> serde_json::Value {
    json!({
        "source_ip": "10.0.0.5",
        "source_port": 16384,
        "destination_ip": "192.0.2.10",
        "destination_port": 3478,
        "flow_start_time_ms": 1_718_445_600_000_i64,
        "flow_end_time_ms": 1_718_445_620_000_i64,
        "max_packet_loss_s2c": null,
        "max_packet_loss_c2s": 5.0,
        "media_type": "audio"
    })
}

fn report_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
        .collect()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = rtm_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    rtm_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("report")
            .and(predicate::str::contains("sites"))
            .and(predicate::str::contains("apps"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_report_help_lists_thresholds() {
    rtm_cmd().args(["report", "--help"]).assert().success().stdout(
        predicate::str::contains("--max-loss")
            .and(predicate::str::contains("--min-duration-ms"))
            .and(predicate::str::contains("--offset-hours")),
    );
}

#[test]
fn test_version_flag() {
    rtm_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rtmhealth"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_zsh() {
    rtm_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_bash() {
    rtm_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Usage errors ────────────────────────────────────────────────────

#[test]
fn test_report_without_site_is_usage_error() {
    let output = rtm_cmd().args(["report", "--token", TOKEN]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("No site given"));
}

#[test]
fn test_debug_level_out_of_range() {
    let output = rtm_cmd()
        .args(["--debug", "3", "report", "-s", "HQ"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_missing_token_is_auth_error() {
    let output = rtm_cmd()
        .args(["--controller", "http://127.0.0.1:9", "sites"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("No token configured"));
}

#[test]
fn test_unknown_profile_is_not_found() {
    let output = rtm_cmd()
        .args(["--profile", "nope", "--token", TOKEN, "sites"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_config_show_no_config() {
    rtm_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[defaults]"));
}

// ── Config file edits ───────────────────────────────────────────────

/// Write `contents` as the config file under an XDG config home at `root`.
fn write_config(root: &Path, contents: &str) -> PathBuf {
    let dir = root.join("rtmhealth");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

const PROD_CONFIG: &str = r#"default_profile = "prod"

[profiles.prod]
token = "prod-secret"
site = "HQ"
"#;

#[test]
fn test_config_set_refuses_malformed_file() {
    let home = tempfile::tempdir().unwrap();
    let broken = format!("{PROD_CONFIG}lookback_hours = \"four\"\n");
    let path = write_config(home.path(), &broken);

    let output = rtm_cmd()
        .env("XDG_CONFIG_HOME", home.path())
        .args(["--profile", "lab", "config", "set", "max_packet_loss", "2.5"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), broken);
}

#[test]
fn test_config_use_refuses_malformed_file() {
    let home = tempfile::tempdir().unwrap();
    let broken = "default_profile = [\n";
    let path = write_config(home.path(), broken);

    let output = rtm_cmd()
        .env("XDG_CONFIG_HOME", home.path())
        .args(["config", "use", "prod"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), broken);
}

#[test]
fn test_config_set_keeps_other_profiles() {
    let home = tempfile::tempdir().unwrap();
    let path = write_config(home.path(), PROD_CONFIG);

    rtm_cmd()
        .env("XDG_CONFIG_HOME", home.path())
        .args(["--profile", "lab", "config", "set", "max_packet_loss", "2.5"])
        .assert()
        .success();

    let saved = std::fs::read_to_string(&path).unwrap();
    assert!(saved.contains("[profiles.prod]"), "{saved}");
    assert!(saved.contains("prod-secret"), "{saved}");
    assert!(saved.contains("[profiles.lab]"), "{saved}");
    assert!(saved.contains("max_packet_loss = 2.5"), "{saved}");
}

// ── Against a mock controller ───────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_report_writes_csv() {
    let server = controller(json!([lossy_flow()])).await;
    let dir = tempfile::tempdir().unwrap();

    let output = rtm_cmd()
        .args(["--controller", &server.uri(), "--token", TOKEN, "-o", "plain"])
        .args(["report", "--site", "HQ", "--hours", "2", "--output-dir"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "report failed:\n{}",
        combined_output(&output)
    );

    let files = report_files(dir.path());
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("HQ.rtp.flowresults."), "unexpected name {name}");

    // Plain output is the report path.
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), files[0].display().to_string());

    let csv = std::fs::read_to_string(&files[0]).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert!(lines[0].starts_with("src_ip,src_port,dst_ip,dst_port,start_time"));
    // Same flow in each of the two buckets.
    assert_eq!(
        lines[1],
        "10.0.0.5,16384,192.0.2.10,3478,2024-06-15 10:00:00,2024-06-15 10:00:20,20.0,\
         audio,null,null,null,null,5.0,null,null,null,null,null"
    );
    assert_eq!(lines[1], lines[2]);
    assert!(csv.contains("Flow Records 2"));
    assert!(csv.contains("Flows w/ PL Greater than 3% C2S: 2"));
    assert!(csv.contains("Flows w/ PL Greater than 3% S2C: 0"));
    assert!(csv.contains("Minimum Call Duration Seconds: 10.0"));
    assert!(csv.contains("Total Query Time : "));

    let posts = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "POST")
        .count();
    assert_eq!(posts, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_report_json_summary() {
    let server = controller(json!([lossy_flow()])).await;
    let dir = tempfile::tempdir().unwrap();

    let output = rtm_cmd()
        .args(["-c", &server.uri(), "--token", TOKEN, "-o", "json"])
        .args(["report", "-s", "HQ", "--hours", "3", "--max-loss", "6"])
        .arg("--output-dir")
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["ids"]["site_id"], "site-hq");
    assert_eq!(summary["ids"]["app_id"], "app-rtp");
    assert_eq!(summary["summary"]["rows_written"], 0);
    assert_eq!(summary["summary"]["buckets_total"], 3);
    assert_eq!(summary["summary"]["counters"]["total_flows"], 3);
    assert_eq!(summary["summary"]["counters"]["c2s_within"], 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_report_unknown_site_writes_nothing() {
    let server = controller(json!([])).await;
    let dir = tempfile::tempdir().unwrap();

    let output = rtm_cmd()
        .args(["-c", &server.uri(), "--token", TOKEN])
        .args(["report", "-s", "hq", "--output-dir"])
        .arg(dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("Site 'hq' not found"));
    assert!(report_files(dir.path()).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_token_exits_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.1/api/profile"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .mount(&server)
        .await;

    let output = rtm_cmd()
        .args(["-c", &server.uri(), "--token", "wrong-token", "sites"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("Authentication failed"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sites_lists_names() {
    let server = controller(json!([])).await;

    rtm_cmd()
        .args(["-c", &server.uri(), "--token", TOKEN, "-o", "plain", "sites"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Branch\nHQ"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_apps_json() {
    let server = controller(json!([])).await;

    let output = rtm_cmd()
        .args(["-c", &server.uri(), "--token", TOKEN, "-o", "json", "apps"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let apps: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(apps[0]["name"], "rtp");
    assert_eq!(apps[0]["id"], "app-rtp");
    assert_eq!(apps[1]["name"], "sip");
}
