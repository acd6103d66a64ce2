//! End-to-end tests for the `rf` binary.
//!
//! Each test writes a schema and a JSON document into a temporary directory
//! and runs the binary against them with an isolated config location.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use serde_json::Value;
use tempfile::TempDir;

const SCHEMA: &str = r#"
name = "User"

[fields]
Name = "string"
Score = "integer"
Birthday = "datetime"
Tags = { list = "string" }
Status = { enum = ["Offline", "Online", "Away"] }
Team = { optional = { record = { Name = "string" } } }
"#;

const USERS: &str = r#"[
    {"Name": "Hubert", "Score": 50, "Birthday": "1972-02-01", "Tags": ["spy"], "Status": "Online", "Team": null},
    {"Name": "Noel", "Score": 3, "Birthday": "2001-09-30", "Tags": [], "Status": "Away", "Team": {"Name": "OSS"}},
    {"Name": "Larmina", "Score": 10, "Birthday": "1980-06-15", "Tags": ["spy", "pilot"], "Status": "Offline"}
]"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("schema.toml"), SCHEMA).unwrap();
        fs::write(dir.path().join("users.json"), USERS).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn command(&self) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_rf"));
        command
            .env("RF_CONFIG", self.path("config.toml"))
            .env_remove("RUST_LOG")
            .arg("--no-color");
        command
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command().args(args).output().unwrap()
    }

    fn filter(&self, extra: &[&str]) -> Output {
        let schema = self.path("schema.toml");
        let input = self.path("users.json");
        let mut args = vec!["filter", "--schema", path_str(&schema)];
        args.extend_from_slice(extra);
        args.push(path_str(&input));
        self.run(&args)
    }
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn names(output: &Output) -> Vec<String> {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let records: Value = serde_json::from_slice(&output.stdout).unwrap();
    records
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["Name"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// filter
// ============================================================================

#[test]
fn test_filter_prints_matching_records() {
    let fixture = Fixture::new();
    let output = fixture.filter(&["--query", "Score gt 5 and \"spy\" in Tags"]);
    assert_eq!(names(&output), ["Hubert", "Larmina"]);
}

#[test]
fn test_filter_without_query_prints_everything() {
    let fixture = Fixture::new();
    assert_eq!(names(&fixture.filter(&[])), ["Hubert", "Noel", "Larmina"]);
}

#[test]
fn test_filter_preserves_record_contents() {
    let fixture = Fixture::new();
    let output = fixture.filter(&["-e", "Team.Name eq \"OSS\""]);
    let records: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records[0]["Status"], "Away");
    assert_eq!(records[0]["Team"]["Name"], "OSS");
}

#[test]
fn test_filter_orders_and_pages() {
    let fixture = Fixture::new();
    assert_eq!(
        names(&fixture.filter(&["--order-by", "Score"])),
        ["Noel", "Larmina", "Hubert"]
    );
    assert_eq!(
        names(&fixture.filter(&[
            "--order-by",
            "Birthday",
            "--descending",
            "--page",
            "1",
            "--page-size",
            "2"
        ])),
        ["Noel", "Larmina"]
    );
    assert_eq!(
        names(&fixture.filter(&["--order-by", "Name", "--page", "2", "--page-size", "2"])),
        ["Noel"]
    );
}

#[test]
fn test_filter_reads_stdin() {
    let fixture = Fixture::new();
    let schema = fixture.path("schema.toml");
    let mut child = fixture
        .command()
        .args(["filter", "-s", path_str(&schema), "-e", "Status eq \"Away\""])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(USERS.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert_eq!(names(&output), ["Noel"]);
}

#[test]
fn test_filter_uses_config_date_formats() {
    let fixture = Fixture::new();
    // Record dates are read with the same formats.
    fs::write(
        fixture.path("config.toml"),
        "date_formats = [\"%d/%m/%Y\", \"%Y-%m-%d\"]\n",
    )
    .unwrap();
    let output = fixture.filter(&["-e", "Birthday lt \"01/01/1975\""]);
    assert_eq!(names(&output), ["Hubert"]);

    fs::write(fixture.path("config.toml"), "date_formats = [\"%d/%m/%Y\"]\n").unwrap();
    let output = fixture.filter(&["-e", "Birthday lt \"01/01/1975\""]);
    assert!(names(&output).is_empty());
}

#[test]
fn test_filter_uses_config_offset_for_record_dates() {
    let fixture = Fixture::new();
    fs::write(fixture.path("config.toml"), "default_offset = \"+02:00\"\n").unwrap();
    let output = fixture.filter(&["-e", "Birthday eq \"2001-09-30\""]);
    assert_eq!(names(&output), ["Noel"]);
}

#[test]
fn test_filter_json_envelope() {
    let fixture = Fixture::new();
    let output = fixture.filter(&[
        "--json",
        "-e",
        "Score gt 5",
        "--order-by",
        "Score",
        "--page-size",
        "1",
    ]);
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["query"], "Score gt 5");
    assert_eq!(report["total"], 3);
    assert_eq!(report["matched"], 2);
    assert_eq!(report["returned"], 1);
    assert_eq!(report["records"][0]["Name"], "Larmina");
    assert!(output.stderr.is_empty());
}

#[test]
fn test_filter_summary_and_quiet() {
    let fixture = Fixture::new();
    let output = fixture.filter(&["-e", "Score gt 5"]);
    assert_eq!(names(&output), ["Hubert", "Larmina"]);
    assert_eq!(
        String::from_utf8_lossy(&output.stderr).trim(),
        "2 of 3 records matched"
    );

    let output = fixture.filter(&["--quiet", "-e", "Score gt 5"]);
    assert_eq!(names(&output), ["Hubert", "Larmina"]);
    assert!(output.stderr.is_empty());
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_invalid_query_exits_with_filter_error() {
    let fixture = Fixture::new();
    let output = fixture.filter(&["-e", "Scor gt 5"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("Error: filter error:"), "stderr: {stderr}");
    assert!(stderr.contains("Score"), "stderr: {stderr}");
}

#[test]
fn test_json_error_output() {
    let fixture = Fixture::new();
    let output = fixture.filter(&["--json", "-e", "(Score gt 5"]);
    assert_eq!(output.status.code(), Some(1));
    let error: Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(error["error"]["code"], "FILTER_ERROR");
}

#[test]
fn test_missing_input_exits_with_io_error() {
    let fixture = Fixture::new();
    let schema = fixture.path("schema.toml");
    let missing = fixture.path("missing.json");
    let output = fixture.run(&["filter", "-s", path_str(&schema), path_str(&missing)]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_bad_schema_exits_with_config_error() {
    let fixture = Fixture::new();
    fs::write(fixture.path("schema.toml"), "[fields]\nName = \"text\"\n").unwrap();
    let output = fixture.filter(&[]);
    assert_eq!(output.status.code(), Some(5));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown type `text`"));
}

#[test]
fn test_malformed_input_exits_with_json_error() {
    let fixture = Fixture::new();
    fs::write(fixture.path("users.json"), "[{\"Name\": ").unwrap();
    let output = fixture.filter(&[]);
    assert_eq!(output.status.code(), Some(1));
}

// ============================================================================
// check / config
// ============================================================================

#[test]
fn test_check_prints_condition() {
    let fixture = Fixture::new();
    let schema = fixture.path("schema.toml");
    let output = fixture.run(&["check", "-s", path_str(&schema), "5 lt score"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Valid query for User"), "stdout: {stdout}");
    assert!(stdout.contains("Score gt 5"), "stdout: {stdout}");
}

#[test]
fn test_check_json_output() {
    let fixture = Fixture::new();
    let schema = fixture.path("schema.toml");
    let output = fixture.run(&["--json", "check", "-s", path_str(&schema), "  "]);
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["unrestricted"], true);
    assert_eq!(report["record_type"], "User");
}

#[test]
fn test_config_path_honors_env() {
    let fixture = Fixture::new();
    let output = fixture.run(&["config", "path"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        path_str(&fixture.path("config.toml"))
    );
}

#[test]
fn test_config_show_reports_defaults() {
    let fixture = Fixture::new();
    let output = fixture.run(&["--json", "config", "show"]);
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["exists"], false);
    assert_eq!(report["config"]["max_query_length"], 4096);
    assert_eq!(report["config"]["max_depth"], 64);
}
