use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TestDir {
    root: PathBuf,
}

impl TestDir {
    fn new(prefix: &str) -> Self {
        let root = unique_temp_dir(prefix);
        fs::create_dir_all(&root).expect("create test dir");
        Self { root }
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.root.join(name);
        fs::write(&path, contents).expect("write test file");
        path
    }

    fn ragsim(&self, args: &[&str]) -> Output {
        Command::new(ragsim_bin())
            .current_dir(&self.root)
            .env_remove("RAGSIM_CONFIG")
            .env_remove("RAGSIM_POLICY")
            .env_remove("RAGSIM_JOBS")
            .args(args)
            .output()
            .expect("run ragsim")
    }

    fn ragsim_json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.ragsim(args);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        assert!(
            output.status.success(),
            "ragsim {} failed\nstdout:\n{stdout}\nstderr:\n{stderr}",
            args.join(" ")
        );
        serde_json::from_slice(&output.stdout).expect("parse ragsim json output")
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn ragsim_bin() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_ragsim") {
        return PathBuf::from(path);
    }

    let current_exe = std::env::current_exe().expect("resolve current test binary path");
    let target_dir = current_exe
        .parent()
        .and_then(|path| path.parent())
        .expect("derive cargo target dir from test binary path");
    let bin_name = if cfg!(windows) { "ragsim.exe" } else { "ragsim" };
    let fallback = target_dir.join(bin_name);

    if fallback.is_file() {
        fallback
    } else {
        panic!(
            "CARGO_BIN_EXE_ragsim is not set and fallback binary not found at {}",
            fallback.display()
        );
    }
}

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_nanos();
    let pid = std::process::id();
    std::env::temp_dir().join(format!("ragsim-{prefix}-{pid}-{nanos}"))
}

#[test]
fn demo_json_reports_the_documented_deadlock() {
    let dir = TestDir::new("demo-json");
    let json = dir.ragsim_json(&["demo", "--format", "json"]);

    let nodes: Vec<&str> = json["nodes"]
        .as_array()
        .expect("nodes array")
        .iter()
        .map(|node| node["id"].as_str().expect("node id"))
        .collect();
    assert_eq!(nodes, vec!["P1", "R1", "P2"]);

    let edges: Vec<(String, String, String)> = json["edges"]
        .as_array()
        .expect("edges array")
        .iter()
        .map(|edge| {
            (
                edge["from"].as_str().expect("from").to_string(),
                edge["to"].as_str().expect("to").to_string(),
                edge["kind"].as_str().expect("kind").to_string(),
            )
        })
        .collect();
    assert_eq!(
        edges,
        vec![
            ("R1".to_string(), "P1".to_string(), "allocation".to_string()),
            ("R1".to_string(), "P2".to_string(), "allocation".to_string()),
            ("P1".to_string(), "R1".to_string(), "request".to_string()),
        ]
    );
    assert_eq!(json["deadlock"], serde_json::json!(true));
    assert_eq!(json["cycle_path"], serde_json::json!("P1 → R1 → P1"));
    assert_eq!(json["allocations"], serde_json::json!([["R1", "P1"], ["R1", "P2"]]));
    assert_eq!(json["requests"], serde_json::json!([["P1", "R1"]]));
}

#[test]
fn demo_text_prints_messages_and_status() {
    let dir = TestDir::new("demo-text");
    let output = dir.ragsim(&["demo"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    assert!(stdout.starts_with("Added process: P1\nAdded resource: R1\nAllocated R1 → P1\n"));
    assert!(stdout.contains("Requested P1 → R1\n"));
    assert!(stdout.ends_with("⚠️ DEADLOCK DETECTED! Cycle: P1 → R1 → P1\n"));
}

#[test]
fn run_executes_manual_scenario() {
    let dir = TestDir::new("run-manual");
    let scenario = dir.write(
        "crossed.toml",
        r#"
policy = "manual"
steps = [
  { action = "add_process" },
  { action = "add_process" },
  { action = "add_resource" },
  { action = "add_resource" },
  { action = "allocate", resource = "R1", process = "P1" },
  { action = "allocate", resource = "R2", process = "P2" },
  { action = "request", process = "P1", resource = "R2" },
  { action = "request", process = "P2", resource = "R1" },
]
"#,
    );
    let json = dir.ragsim_json(&[
        "run",
        scenario.to_str().expect("utf-8 path"),
        "--format",
        "json",
    ]);
    assert_eq!(json["name"], serde_json::json!("crossed"));
    assert_eq!(json["policy"], serde_json::json!("manual"));
    assert_eq!(json["cycle_path"], serde_json::json!("P1 → R2 → P2 → R1 → P1"));
    let cycle = json["cycle"].as_array().expect("cycle array");
    assert_eq!(cycle.len(), 4);
    assert_eq!(cycle[0]["node"], serde_json::json!("P1"));
    assert_eq!(cycle[0]["edge"], serde_json::json!("request"));
}

#[test]
fn run_reports_unknown_node_and_fails() {
    let dir = TestDir::new("run-unknown");
    let scenario = dir.write(
        "broken.json",
        r#"{"policy": "manual", "steps": [{"action": "add_process"}, {"action": "request", "process": "P1", "resource": "R4"}]}"#,
    );
    let output = dir.ragsim(&["run", scenario.to_str().expect("utf-8 path")]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    assert!(stderr.contains("unknown node R4"), "stderr was:\n{stderr}");
}

#[test]
fn config_file_selects_default_policy() {
    let dir = TestDir::new("run-config");
    dir.write("ragsim.toml", "[simulator]\npolicy = \"manual\"\n");
    let scenario = dir.write(
        "plain.yaml",
        "steps:\n  - action: add_process\n  - action: add_resource\n",
    );
    let path = scenario.to_str().expect("utf-8 path");

    let json = dir.ragsim_json(&["run", path, "--format", "json"]);
    assert_eq!(json["policy"], serde_json::json!("manual"));
    assert_eq!(json["edges"], serde_json::json!([]));

    let json = dir.ragsim_json(&["--policy", "storytelling", "run", path, "--format", "json"]);
    assert_eq!(json["policy"], serde_json::json!("storytelling"));
    assert_eq!(json["allocations"], serde_json::json!([["R1", "P1"]]));
}

#[test]
fn dot_output_carries_edge_styles() {
    let dir = TestDir::new("demo-dot");
    let output = dir.ragsim(&["demo", "--format", "dot"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    assert!(stdout.contains("\"P1\" -> \"R1\" [color=red, style=dashed];"));
    assert!(stdout.contains("\"R1\" -> \"P2\" [color=black, style=solid];"));
}
