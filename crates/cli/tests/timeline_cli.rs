use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn make_home() -> tempfile::TempDir {
    tempfile::tempdir().expect("tempdir")
}

fn write_file(path: &Path, body: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, body).expect("write file");
}

fn create_session_fixture(root: &Path) -> PathBuf {
    let path = root.join("session.jsonl");
    let lines = [
        r#"{"role":"user","content":"<system-reminder>internal</system-reminder>Fix the failing test","timestamp":"2026-02-14T00:00:01Z"}"#,
        r#"{"role":"assistant","content":"Looking now","thinking":"Start with the test file","timestamp":"2026-02-14T00:00:02Z"}"#,
        r#"{"role":"tool_invocation","content":"","timestamp":"2026-02-14T00:00:03Z","tool_calls":[{"name":"Read","input":{"file_path":"/repo/src/lib.rs"}}]}"#,
        r#"{"role":"tool_result","content":"pub fn add() {}","timestamp":"2026-02-14T00:00:04Z"}"#,
        r#"{"role":"tool_invocation","content":"","timestamp":"2026-02-14T00:00:05Z","tool_calls":[{"name":"Bash","input":{"command":"cargo test"}}]}"#,
        r#"{"role":"tool_result","content":"Error: test failed","timestamp":"2026-02-14T00:00:07Z"}"#,
        r#"{"role":"system","content":"","metadata":{"subtype":"compact_boundary"},"timestamp":"2026-02-14T00:00:08Z"}"#,
        r#"{"role":"summary","content":"Fixed the failing test"}"#,
    ];
    write_file(&path, &lines.join("\n"));
    path
}

fn create_hooks_fixture(root: &Path) -> PathBuf {
    let path = root.join("hooks.json");
    write_file(
        &path,
        r#"[
  {"id": "h2", "timestamp": "2026-02-14T00:00:06Z", "event_name": "PostToolUse", "tool_name": "Bash", "label": "notify", "group": "ops"},
  {"id": "h1", "timestamp": "2026-02-14T00:00:03.500Z", "event_name": "PreToolUse", "tool_name": "Read", "label": "guard", "group": "ops"}
]"#,
    );
    path
}

fn run(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sessionlens"))
        .args(args)
        .env("HOME", home)
        .env_remove("RUST_LOG")
        .output()
        .expect("run sessionlens")
}

fn parse_json_output(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("json output")
}

#[test]
fn timeline_json_pairs_invocations_with_outcomes() {
    let home = make_home();
    let session = create_session_fixture(home.path());
    let output = run(
        home.path(),
        &["timeline", session.to_str().unwrap(), "--format", "json"],
    );
    let json = parse_json_output(&output);
    let items = json["items"].as_array().expect("items array");

    let kinds: Vec<&str> = items.iter().map(|i| i["type"].as_str().unwrap()).collect();
    assert_eq!(
        kinds,
        vec!["turn", "action", "turn", "action", "action", "action", "action"]
    );
    assert_eq!(items[0]["content"], "Fix the failing test");
    assert_eq!(items[1]["tool_name"], "thinking");

    let read = &items[3];
    assert_eq!(read["label"], "Read src/lib.rs");
    assert_eq!(read["status"], "success");
    assert_eq!(read["duration_ms"], 1000);

    let bash = &items[4];
    assert_eq!(bash["label"], "cargo test");
    assert_eq!(bash["status"], "error");
    assert_eq!(bash["duration_ms"], 2000);

    assert_eq!(items[5]["category"], "context");
    assert_eq!(items[6]["label"], "Fixed the failing test");

    assert_eq!(json["tally"]["builtin"], 2);
    assert_eq!(json["tally"]["context"], 1);
    assert_eq!(json["tally"]["mcp"], 0);
}

#[test]
fn timeline_splices_hooks_by_time() {
    let home = make_home();
    let session = create_session_fixture(home.path());
    let hooks = create_hooks_fixture(home.path());
    let output = run(
        home.path(),
        &[
            "timeline",
            session.to_str().unwrap(),
            "--hooks",
            hooks.to_str().unwrap(),
            "--format",
            "json",
        ],
    );
    let json = parse_json_output(&output);
    let labels: Vec<&str> = json["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|i| i["category"] == "hook")
        .map(|i| i["label"].as_str().unwrap())
        .collect();
    assert_eq!(
        labels,
        vec!["Hook: PreToolUse — guard", "Hook: PostToolUse — notify"]
    );
    assert_eq!(json["tally"]["hook"], 2);
}

#[test]
fn timeline_category_filter_keeps_turns() {
    let home = make_home();
    let session = create_session_fixture(home.path());
    let output = run(
        home.path(),
        &[
            "timeline",
            session.to_str().unwrap(),
            "--category",
            "context",
            "--format",
            "json",
        ],
    );
    let json = parse_json_output(&output);
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[2]["category"], "context");
    // tally still covers the whole timeline
    assert_eq!(json["tally"]["builtin"], 2);
}

#[test]
fn timeline_text_output_has_one_line_per_item() {
    let home = make_home();
    let session = create_session_fixture(home.path());
    let output = run(home.path(), &["timeline", session.to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 7);
    assert!(lines[0].starts_with("00:00:01 user"));
    assert!(lines[4].contains("error"));
    assert!(lines[4].contains("(2000 ms)"));
}

#[test]
fn timeline_reads_live_events() {
    let home = make_home();
    let path = home.path().join("live.jsonl");
    write_file(
        &path,
        &[
            r#"{"kind":"tool_invocation","tool_name":"Task","input":{"description":"outer"},"timestamp":10}"#,
            r#"{"kind":"tool_invocation","tool_name":"mcp__github__search","timestamp":11}"#,
            r#"{"kind":"tool_outcome","content":"3 results","timestamp":12}"#,
            r#"{"kind":"error","content":"stream interrupted"}"#,
            r#"{"kind":"progress","content":null,"metadata":{"subtype":"bash_progress","command":"ls -la"}}"#,
        ]
        .join("\n"),
    );
    let output = run(
        home.path(),
        &["timeline", path.to_str().unwrap(), "--live", "--format", "json"],
    );
    let json = parse_json_output(&output);
    let items = json["items"].as_array().unwrap();
    assert_eq!(items[0]["label"], "Task: outer");
    assert_eq!(items[0]["status"], "pending");
    assert_eq!(items[1]["label"], "github/search");
    assert_eq!(items[1]["category"], "mcp");
    assert_eq!(items[1]["output"], "3 results");
    assert_eq!(items[2]["category"], "error");
    assert_eq!(items[3]["category"], "builtin");
    assert_eq!(items[3]["label"], "$ ls -la");
}

#[test]
fn tally_text_lists_every_category() {
    let home = make_home();
    let session = create_session_fixture(home.path());
    let output = run(home.path(), &["tally", session.to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 14);
    assert!(stdout.contains("hook_progress"));
    assert!(stdout.lines().last().unwrap().ends_with(" 5"));
}

#[test]
fn threads_json_in_input_order() {
    let home = make_home();
    let path = home.path().join("threads.json");
    write_file(
        &path,
        r#"[
  {"id": "c", "parent_id": "b"},
  {"id": "a"},
  {"id": "b", "parent_id": "a"},
  {"id": "", "parent_id": "a"},
  {"id": "x", "parent_id": "y"},
  {"id": "y", "parent_id": "x"}
]"#,
    );
    let output = run(home.path(), &["threads", path.to_str().unwrap(), "--format", "json"]);
    let json = parse_json_output(&output);
    let nodes = json.as_array().unwrap();
    let summary: Vec<(&str, u64)> = nodes
        .iter()
        .map(|n| (n["id"].as_str().unwrap(), n["indent_level"].as_u64().unwrap()))
        .collect();
    assert_eq!(summary[..3], [("c", 2), ("a", 0), ("b", 1)]);
    assert_eq!(nodes.len(), 5);
    assert!(summary[3].1 + summary[4].1 <= 2);
}

#[test]
fn config_file_limits_apply() {
    let home = make_home();
    let session = create_session_fixture(home.path());
    write_file(
        &home
            .path()
            .join(".config")
            .join("sessionlens")
            .join("sessionlens.toml"),
        "[timeline]\nturn_clip_chars = 10\n\n[output]\nformat = \"json\"\n",
    );
    let output = run(home.path(), &["timeline", session.to_str().unwrap()]);
    let json = parse_json_output(&output);
    assert_eq!(json["items"][0]["content"], "Fix the...");
}

#[test]
fn missing_explicit_config_fails() {
    let home = make_home();
    let session = create_session_fixture(home.path());
    let output = run(
        home.path(),
        &[
            "--config",
            home.path().join("nope.toml").to_str().unwrap(),
            "timeline",
            session.to_str().unwrap(),
        ],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: Config file not found"));
}

#[test]
fn malformed_session_reports_line() {
    let home = make_home();
    let path = home.path().join("broken.jsonl");
    write_file(&path, "{\"role\":\"user\",\"content\":\"ok\"}\n{not json}\n");
    let output = run(home.path(), &["timeline", path.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 2"), "stderr: {stderr}");
}

#[test]
fn inspect_reports_shape_and_language() {
    let home = make_home();
    let path = home.path().join("patch.diff");
    write_file(
        &path,
        "diff --git a/src/lib.rs b/src/lib.rs\n--- a/src/lib.rs\n+++ b/src/lib.rs\n@@ -1 +1 @@\n-old\n+new\n",
    );
    let output = run(home.path(), &["inspect", path.to_str().unwrap(), "--format", "json"]);
    let json = parse_json_output(&output);
    assert_eq!(json["shape"], "diff");
    assert_eq!(json["language"], "diff");
    assert_eq!(json["lines"], 6);
}
