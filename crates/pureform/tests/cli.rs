//! CLI tests: run the `pureform` binary against small source files.

use assert_cmd::Command;
use tempfile::TempDir;

/// A command isolated from the user's config files.
fn pureform(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pureform").unwrap();
    cmd.env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .env_remove("RUST_LOG")
        .arg("--root")
        .arg(dir.path());
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn test_classify_prints_descriptor() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "add.js", "function add(a, b) { return a + b; }");

    let output = pureform(&dir).arg("classify").arg(&file).output().unwrap();
    assert!(output.status.success());
    assert_eq!(
        stdout_json(&output),
        serde_json::json!({
            "kind": "ordinary_function",
            "parameters": ["a", "b"],
            "body": " return a + b; ",
        })
    );
}

#[test]
fn test_classify_reads_stdin() {
    let dir = TempDir::new().unwrap();
    let output = pureform(&dir)
        .arg("classify")
        .write_stdin("function id(x) {\n  return x;\n}\n")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["parameters"], serde_json::json!(["x"]));
}

#[test]
fn test_unsupported_kinds_exit_with_two() {
    let dir = TempDir::new().unwrap();
    for (source, message) in [
        ("(a, b) => a + b", "context-bound lambda is not supported"),
        ("async function f() { return 1; }", "async function is not supported"),
        ("function* g() { yield 1; }", "generator function is not supported"),
    ] {
        let output = pureform(&dir)
            .args(["classify", "-"])
            .write_stdin(source)
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(2), "{}", source);
        assert!(output.stdout.is_empty());
        assert!(
            String::from_utf8_lossy(&output.stderr).contains(message),
            "{}",
            source
        );
    }
}

#[test]
fn test_rebuild_prints_reconstructed_source() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "mul.js", "function mul(a, b) { return a * b; }");

    let output = pureform(&dir).arg("rebuild").arg(&file).output().unwrap();
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "function anonymous(a,b\n) {\n return a * b; \n}\n"
    );
}

#[test]
fn test_call_invokes_reconstruction() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "add.js", "function add(a, b) { return a + b; }");

    let output = pureform(&dir)
        .arg("call")
        .arg(&file)
        .args(["2", "3"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output).as_f64(), Some(5.0));

    let output = pureform(&dir)
        .arg("call")
        .arg(&file)
        .args(["\"a\"", "\"b\""])
        .output()
        .unwrap();
    assert_eq!(stdout_json(&output), serde_json::json!("ab"));
}

#[test]
fn test_call_rejects_invalid_json_argument() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "id.js", "function id(x) { return x; }");

    let output = pureform(&dir)
        .arg("call")
        .arg(&file)
        .arg("{not json")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("not valid JSON"));
}

#[test]
fn test_call_reports_runtime_errors() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "boom.js", "function boom() { throw \"boom\"; }");

    let output = pureform(&dir).arg("call").arg(&file).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("boom"));
}

#[test]
fn test_call_rejects_circular_result() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "loop.js", "function loop() { var o = {}; o.self = o; return o; }");

    let output = pureform(&dir).arg("call").arg(&file).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("circular structure"));
}

#[test]
fn test_unknown_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "add.py", "def add(a, b): return a + b");

    let output = pureform(&dir).arg("classify").arg(&file).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no reader for .py files"));
}

#[test]
fn test_syntax_extraction_flag() {
    let dir = TempDir::new().unwrap();
    // The body pattern runs to the last closing brace in the text.
    let file = write(&dir, "id.js", "function id(a) { return a; } // }");

    let output = pureform(&dir).arg("classify").arg(&file).output().unwrap();
    assert_eq!(
        stdout_json(&output)["body"],
        serde_json::json!(" return a; } // ")
    );

    let output = pureform(&dir)
        .args(["classify", "--extraction", "syntax"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["body"], serde_json::json!(" return a; "));
}

#[test]
fn test_project_config_selects_extraction() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join(".pureform").join("config.toml");
    std::fs::create_dir_all(config.parent().unwrap()).unwrap();
    std::fs::write(&config, "[classify]\nextraction = \"syntax\"\n").unwrap();
    let file = write(&dir, "bad.js", "function bad(a) { return a +; }");

    // Syntax extraction rejects what pattern extraction would pass through.
    let output = pureform(&dir).arg("classify").arg(&file).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("malformed"));
}
