//! CLI tests: run the `tagmerge` binary as a host would.
//!
//! The binary is configured for the stdio transport and driven through its
//! stdin/stdout by a small synchronous fake host.

use serde_json::{json, Value};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn tagmerge_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_tagmerge"))
}

fn setup_test_env(extra: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let config_dir = tmp.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[host]
transport = "stdio"

[merge]
language = "zh"
page_size = 2
{}
"#,
        extra
    );

    let config_path = config_dir.join("tagmerge.toml");
    fs::write(&config_path, config_content).unwrap();
    (tmp, config_path)
}

fn catalog() -> Vec<Value> {
    vec![
        json!({"id": 1, "namespace": "other", "name": "Foo"}),
        json!({"id": 2, "namespace": "artist", "name": "foo"}),
        json!({"id": 3, "namespace": "", "name": "bar"}),
        json!({"id": 4, "namespace": "group", "name": "Bar"}),
        json!({"id": 5, "namespace": "other", "name": "baz"}),
    ]
}

/// Result of driving the binary to completion.
struct HostSession {
    requests: Vec<Value>,
    outcome: Option<Value>,
    success: bool,
    stderr: String,
}

/// Run `tagmerge` and answer its stdio requests from `records`.
///
/// `fail_merges` makes every `tags.merge` call return an error.
fn run_with_host(config_path: &Path, args: &[&str], records: &[Value], fail_merges: bool) -> HostSession {
    let mut child = Command::new(tagmerge_binary())
        .arg("--config")
        .arg(config_path)
        .arg("--progress")
        .arg("off")
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap_or_else(|e| panic!("Failed to run tagmerge binary: {}", e));

    let mut stdin = child.stdin.take().unwrap();
    let stdout = BufReader::new(child.stdout.take().unwrap());
    let mut requests = Vec::new();
    let mut outcome = None;

    for line in stdout.lines() {
        let line = line.unwrap();
        if line.trim().is_empty() {
            continue;
        }
        let message: Value = serde_json::from_str(&line).unwrap();
        let Some(method) = message["method"].as_str() else {
            outcome = Some(message);
            break;
        };

        let params = &message["params"];
        let response = match method {
            "tags.list" => {
                let offset = params["offset"].as_u64().unwrap() as usize;
                let limit = params["limit"].as_u64().unwrap() as usize;
                let items: Vec<Value> = records.iter().skip(offset).take(limit).cloned().collect();
                json!({"id": message["id"], "result": {
                    "total": records.len(),
                    "limit": limit,
                    "offset": offset,
                    "items": items,
                }})
            }
            "tags.merge" if fail_merges => json!({"id": message["id"], "error": {
                "code": "locked", "message": "library is read-only"
            }}),
            "tags.merge" => json!({"id": message["id"], "result": null}),
            other => panic!("unexpected method {}", other),
        };
        requests.push(message.clone());
        writeln!(stdin, "{}", response).unwrap();
        stdin.flush().unwrap();
    }
    drop(stdin);

    let output = child.wait_with_output().unwrap();
    HostSession {
        requests,
        outcome,
        success: output.status.success(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}

fn methods(session: &HostSession, method: &str) -> Vec<Value> {
    session
        .requests
        .iter()
        .filter(|r| r["method"] == method)
        .map(|r| r["params"].clone())
        .collect()
}

#[test]
fn test_plan_reports_without_merging() {
    let (_tmp, config_path) = setup_test_env("");

    let session = run_with_host(&config_path, &["plan"], &catalog(), false);

    assert!(session.success, "plan failed: {}", session.stderr);
    assert_eq!(
        session.outcome,
        Some(json!({"success": true, "total_tags": 5, "planned_merges": 2}))
    );
    assert!(methods(&session, "tags.merge").is_empty());

    let offsets: Vec<u64> = methods(&session, "tags.list")
        .iter()
        .map(|p| p["offset"].as_u64().unwrap())
        .collect();
    assert_eq!(offsets, vec![0, 2, 4]);
    assert!(methods(&session, "tags.list")
        .iter()
        .all(|p| p["language"] == "zh" && p["limit"] == 2));
}

#[test]
fn test_run_respects_dry_run_default() {
    let (_tmp, config_path) = setup_test_env("");

    let session = run_with_host(&config_path, &["run"], &catalog(), false);

    assert!(session.success);
    assert!(methods(&session, "tags.merge").is_empty());
}

#[test]
fn test_apply_with_cap_merges_lowest_source() {
    let (_tmp, config_path) = setup_test_env("");

    let session = run_with_host(
        &config_path,
        &["apply", "--max-merges", "1", "--keep-source"],
        &catalog(),
        false,
    );

    assert!(session.success, "apply failed: {}", session.stderr);
    assert_eq!(session.outcome.as_ref().unwrap()["applied_merges"], 1);
    assert_eq!(
        methods(&session, "tags.merge"),
        vec![json!({"source_id": 1, "target_id": 2, "delete_source": false})]
    );
}

#[test]
fn test_run_applies_when_configured() {
    let (_tmp, config_path) = setup_test_env("dry_run = false");

    let session = run_with_host(&config_path, &["run", "--language", "en"], &catalog(), false);

    assert!(session.success);
    let merges = methods(&session, "tags.merge");
    assert_eq!(merges.len(), 2);
    assert_eq!(merges[1]["source_id"], 3);
    assert_eq!(merges[1]["target_id"], 4);
    assert_eq!(merges[1]["delete_source"], true);
    assert!(methods(&session, "tags.list")
        .iter()
        .all(|p| p["language"] == "en"));
}

#[test]
fn test_merge_failure_reports_structured_error() {
    let (_tmp, config_path) = setup_test_env("");

    let session = run_with_host(&config_path, &["apply"], &catalog(), true);

    assert!(!session.success);
    let outcome = session.outcome.as_ref().unwrap();
    assert_eq!(outcome["success"], false);
    let message = outcome["message"].as_str().unwrap();
    assert!(message.contains("read-only"), "message: {}", message);
    assert_eq!(methods(&session, "tags.merge").len(), 1);
}

#[test]
fn test_export_writes_full_plan() {
    let (tmp, config_path) = setup_test_env("");
    let export_path = tmp.path().join("plan.json");

    let session = run_with_host(
        &config_path,
        &["plan", "--export", export_path.to_str().unwrap()],
        &catalog(),
        false,
    );

    assert!(session.success);
    let exported: Value = serde_json::from_str(&fs::read_to_string(&export_path).unwrap()).unwrap();
    assert_eq!(
        exported["merges"],
        json!([
            {"source_id": 1, "target_id": 2},
            {"source_id": 3, "target_id": 4}
        ])
    );
}

#[test]
fn test_export_failure_after_apply_reports_structured_error() {
    let (tmp, config_path) = setup_test_env("");
    let blocker = tmp.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();
    let export_path = blocker.join("plan.json");

    let session = run_with_host(
        &config_path,
        &["apply", "--export", export_path.to_str().unwrap()],
        &catalog(),
        false,
    );

    assert!(!session.success);
    assert_eq!(methods(&session, "tags.merge").len(), 2);
    let outcome = session.outcome.expect("no outcome line on stdout");
    assert_eq!(outcome["success"], false);
    let message = outcome["message"].as_str().unwrap();
    assert!(message.contains("export directory"), "message: {}", message);
}

#[test]
fn test_unreadable_config_reports_structured_error_in_json_mode() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("tagmerge.toml");
    fs::write(&config_path, "[merge\nlanguage = ").unwrap();

    let output = Command::new(tagmerge_binary())
        .arg("--config")
        .arg(&config_path)
        .args(["plan", "--format", "json", "--progress", "off"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let outcome: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(outcome["success"], false);
    assert!(outcome["message"].as_str().unwrap().contains("tagmerge.toml"));
}

#[test]
fn test_invalid_stdio_config_reports_structured_error() {
    let (_tmp, config_path) = setup_test_env("");
    let content = fs::read_to_string(&config_path).unwrap().replace("\"zh\"", "\"\"");
    fs::write(&config_path, content).unwrap();

    let session = run_with_host(&config_path, &["plan"], &catalog(), false);

    assert!(!session.success);
    assert!(session.requests.is_empty());
    let outcome = session.outcome.expect("no outcome line on stdout");
    assert_eq!(outcome["success"], false);
    assert!(outcome["message"].as_str().unwrap().contains("merge.language"));
}

#[test]
fn test_unreachable_http_host_fails() {
    let tmp = TempDir::new().unwrap();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config_path = tmp.path().join("tagmerge.toml");
    fs::write(
        &config_path,
        format!("[host]\nurl = \"http://{}\"\ntimeout_secs = 2\n", addr),
    )
    .unwrap();

    let output = Command::new(tagmerge_binary())
        .arg("--config")
        .arg(&config_path)
        .args(["plan", "--format", "json", "--progress", "off"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let outcome: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(outcome["success"], false);
    assert!(outcome["message"].as_str().unwrap().contains("offset 0"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("tagmerge.toml");
    fs::write(&config_path, "[merge]\nlanguage = \"\"\n").unwrap();

    let output = Command::new(tagmerge_binary())
        .arg("--config")
        .arg(&config_path)
        .arg("plan")
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("merge.language"));
}
