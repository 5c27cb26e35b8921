use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Binary isolated from the user's configuration, `.env` and API keys
fn codepad(dir: &TempDir) -> Command {
    codepad_with_config(dir, &dir.path().join("missing.toml"))
}

fn codepad_with_config(dir: &TempDir, config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("codepad").unwrap();
    cmd.current_dir(dir.path())
        .arg("--config")
        .arg(config)
        .env_remove("OPENROUTER_API_KEY")
        .env_remove("DEEPSEEK_API_KEY")
        .env_remove("GEMINI_API_KEY")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn check_reports_long_python_line() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("long.py"), "a".repeat(85)).unwrap();

    codepad(&dir)
        .args(["check", "long.py"])
        .assert()
        .success()
        .stdout(predicate::str::contains("line too long (85 > 79 characters)"));
}

#[test]
fn check_reports_mismatched_html() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("page.html"), "<div><span></div>").unwrap();

    codepad(&dir)
        .args(["check", "page.html"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mismatched closing tag </div>"));
}

#[test]
fn check_clean_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("notes.txt"), "anything  at all").unwrap();

    codepad(&dir)
        .args(["check", "notes.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues found"));
}

#[test]
fn format_unknown_language_is_identity() {
    let dir = TempDir::new().unwrap();
    let content = "  keep   this\n\tas is\n";
    fs::write(dir.path().join("data.xyz"), content).unwrap();

    codepad(&dir)
        .args(["format", "data.xyz"])
        .assert()
        .success()
        .stdout(content);
}

#[test]
fn format_css_indents_rules() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("site.css"), "body {\ncolor: red;\n}\n").unwrap();

    codepad(&dir)
        .args(["format", "site.css"])
        .assert()
        .success()
        .stdout("body {\n    color: red;\n}\n");
}

#[test]
fn format_write_updates_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.js");
    fs::write(&path, "function f() {\nreturn 1;\n}\n").unwrap();

    codepad(&dir).args(["format", "--write", "app.js"]).assert().success();
    assert_eq!(
        fs::read_to_string(path).unwrap(),
        "function f() {\n    return 1;\n}\n"
    );
}

#[test]
fn chat_without_api_key_fails() {
    let dir = TempDir::new().unwrap();

    codepad(&dir)
        .args(["chat", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing API credential"));
}

#[test]
fn status_reports_missing_key_and_unreachable_endpoints() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("codepad.toml");
    fs::write(&config, "[providers.openrouter]\nbase_url = \"http://127.0.0.1:1/api/v1\"\n").unwrap();

    codepad_with_config(&dir, &config)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("openrouter"))
        .stdout(predicate::str::contains("OPENROUTER_API_KEY"))
        .stdout(predicate::str::contains("✗ http://127.0.0.1:1/api/v1/chat/completions"));
}

#[test]
fn missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();

    codepad(&dir)
        .args(["check", "nope.py"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.py"));
}
