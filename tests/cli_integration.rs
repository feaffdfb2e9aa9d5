//! Integration tests that drive the compiled `hyres` binary.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

const DATA: &str = include_str!("fixtures/data.noun");

fn hyres() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_hyres"));
    // Keep the model settings of the developer's shell out of the tests.
    cmd.env_remove("RUST_LOG")
        .env_remove("OLLAMA_HOST")
        .env_remove("OLLAMA_MODEL");
    cmd
}

fn run(args: &[&str]) -> Output {
    hyres().args(args).output().expect("failed to run hyres")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write_fixture(dir: &TempDir) -> String {
    let path = dir.path().join("data.noun");
    std::fs::write(&path, DATA).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn convert_writes_json_file() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir);
    let output_path = dir.path().join("noun.json");

    // Act
    let output = run(&["convert", &input, output_path.to_str().unwrap()]);

    // Assert
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty(), "data goes to the file only");
    assert!(stderr(&output).contains("Converted 8 synsets (1 integrity warnings)"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output_path).unwrap()).unwrap();
    let entries = json.as_object().unwrap();
    assert_eq!(entries.len(), 8);
    assert_eq!(entries["00000005-n"]["words"][1]["word"], "computer mouse");
    assert_eq!(entries["00000005-n"]["holonyms"][0]["type"], "part");
}

#[test]
fn convert_streams_stdin_to_stdout() {
    let mut child = hyres()
        .arg("convert")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(DATA.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json.as_object().unwrap().len(), 8);
}

#[test]
fn convert_fails_on_malformed_line() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.noun");
    std::fs::write(&path, "00000001 03 n 01 entity 0 002 ~ 00000002 n 0000 | g\n").unwrap();

    let output = run(&["convert", path.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("line 1"), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty());
}

#[test]
fn missing_input_file_is_internal_error() {
    let output = run(&["convert", "/nonexistent/data.noun"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).starts_with("Error: "));
}

#[test]
fn check_lists_dangling_relations() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir);

    let output = run(&["check", &input]);

    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "00000007-n -> 00000099-n (hyponym): target synset is missing\n"
    );
}

#[test]
fn candidates_accepts_raw_and_json_graphs() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir);
    let json_path = dir.path().join("noun.json");
    assert!(run(&["convert", &input, json_path.to_str().unwrap()]).status.success());

    for graph in [input.as_str(), json_path.to_str().unwrap()] {
        let output = run(&["candidates", graph]);
        assert!(output.status.success());
        assert_eq!(stdout(&output), "00000005-n\n");
    }

    let sampled = run(&["candidates", &input, "--sample", "3", "--seed", "1"]);
    assert_eq!(stdout(&sampled), "00000005-n\n");
}

#[test]
fn context_prints_json_bundle_and_prompt() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir);

    let output = run(&["context", &input, "00000005-n"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let bundle: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(bundle[0]["id"], "00000005-n");
    assert_eq!(bundle.as_array().unwrap().len(), 8);

    let prompt = run(&["context", &input, "00000005-n", "--prompt"]);
    assert!(stdout(&prompt).starts_with("## Data for 00000005-n\n"));
    assert!(stdout(&prompt).contains("00000005-n has a part holonym relation to 00000007-n."));
}

#[test]
fn context_for_unknown_id_exits_with_user_error() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir);

    let output = run(&["context", &input, "99999999-n"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("synset not found: 99999999-n"));
}

#[test]
fn resolve_against_unreachable_server_is_internal_error() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir);
    assert!(Path::new(&input).exists());

    let output = hyres()
        .args(["resolve", &input, "00000005-n", "--host", "not a url"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Invalid URL"), "stderr: {}", stderr(&output));
}
