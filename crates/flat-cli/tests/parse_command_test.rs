use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

fn cargo_bin() -> PathBuf {
    if let Ok(path) = env::var("CARGO_BIN_EXE_flat") {
        return PathBuf::from(path);
    }

    let target_dir = env::var("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| repo_root().join("target"));
    let executable_name = format!("flat{}", std::env::consts::EXE_SUFFIX);
    let fallback = target_dir.join("debug").join(executable_name);

    if fallback.exists() {
        return fallback;
    }

    panic!(
        "CARGO_BIN_EXE_flat is not set and fallback binary was not found at {}",
        fallback.display()
    );
}

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn testdata(name: &str) -> String {
    repo_root()
        .join("testdata")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn run_flat(args: &[&str]) -> Output {
    Command::new(cargo_bin())
        .args(args)
        .output()
        .expect("run flat")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "expected success; stdout: {}; stderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn parse_command_outputs_json_to_stdout() {
    let output = run_flat(&[
        "parse",
        &testdata("receipt.edi"),
        "--schema",
        &testdata("receipt.json"),
        "--pretty",
    ]);
    assert_success(&output);

    let stdout = String::from_utf8(output.stdout).expect("stdout should be UTF-8");
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout).expect("stdout should contain valid JSON");
    assert_eq!(parsed["Header"]["PRHFCY"], "9999");
    assert_eq!(parsed["Lines"][0]["POPLIN"], 1);
    assert_eq!(parsed["Lines"][0]["LotNumber"][0]["YTEXTE"], "Commentaire 1");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1 file(s) found"));
}

#[test]
fn parse_command_text_format() {
    let output = run_flat(&[
        "parse",
        &testdata("receipt.edi"),
        "--schema",
        &testdata("receipt.yaml"),
        "--format",
        "text",
        "--separator",
        " | ",
    ]);
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        "Header: ChampEnTete1=E | PRHFCY=9999 | RCPDAT=2024-06-10 00:00:00"
    );
    assert_eq!(lines[3], "LotNumber: ChampLot1=N | YTEXTE=Commentaire 2");
}

#[test]
fn parse_directory_silently_writes_output_file() {
    let dir = TempDir::new().expect("temp dir");
    let inputs = dir.path().join("inputs");
    fs::create_dir(&inputs).expect("inputs dir");
    for name in ["receipt.edi", "missing_header.edi"] {
        fs::copy(testdata(name), inputs.join(name)).expect("copy fixture");
    }
    let out_file = dir.path().join("out.json");

    let output = run_flat(&[
        "parse",
        inputs.to_string_lossy().as_ref(),
        "--schema",
        &testdata("receipt.json"),
        "--silent",
        "--output",
        out_file.to_string_lossy().as_ref(),
    ]);
    assert_success(&output);
    assert!(String::from_utf8_lossy(&output.stderr).contains("2 file(s) found"));

    let written = fs::read_to_string(&out_file).expect("output file");
    let parsed: serde_json::Value = serde_json::from_str(&written).expect("valid JSON");
    let files = parsed.as_array().expect("a list of files");
    assert_eq!(files.len(), 2);
    assert!(files[0]["file"].as_str().unwrap().ends_with("missing_header.edi"));
    assert_eq!(
        files[0]["content"]["error"],
        "Missing required segments: Header"
    );
    assert_eq!(files[1]["content"]["Header"]["PRHFCY"], "9999");
}

#[test]
fn decode_failure_returns_error_exit_code() {
    let output = run_flat(&[
        "parse",
        &testdata("missing_header.edi"),
        "--schema",
        &testdata("receipt.json"),
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("ERROR:") && stderr.contains("Missing required segments: Header"),
        "stderr: {stderr}"
    );
}

#[test]
fn missing_schema_returns_error_exit_code() {
    let output = run_flat(&[
        "parse",
        &testdata("receipt.edi"),
        "--schema",
        &testdata("does-not-exist.json"),
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERROR:"));
}

#[test]
fn describe_command_prints_structure() {
    let output = run_flat(&["describe", "--schema", &testdata("receipt.json"), "--structure"]);
    assert_success(&output);

    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should contain valid JSON");
    assert_eq!(
        parsed["Lines"],
        serde_json::json!(["ChampArt1", "POHNUM", "POPLIN"])
    );
}

#[test]
fn describe_command_prints_description() {
    let output = run_flat(&["describe", "--schema", &testdata("receipt.yaml")]);
    assert_success(&output);

    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should contain valid JSON");
    assert_eq!(parsed["name"], "receipt");
    assert_eq!(parsed["fill"], " ");
    assert_eq!(parsed["segments"][1]["elements"][2]["ttype"], "int");
    assert_eq!(parsed["segments"][2]["parent"], "Lines");
}
