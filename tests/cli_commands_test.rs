// Integration tests for CLI commands
// Run with: cargo test --test cli_commands_test

use std::io::Write;
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn pairchat(config_dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_pairchat"));
    cmd.env("PAIRCHAT_CONFIG_DIR", config_dir.path())
        .env("PAIRCHAT_ENV", "test")
        .env_remove("PAIRCHAT_SERVER_URL")
        .env_remove("PAIRCHAT_UID")
        .env_remove("PAIRCHAT_LOG_FILE");
    cmd
}

/// `config` prints the effective configuration
#[test]
fn test_config_command_prints_file_and_env() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("config.json"),
        r#"{"server_url": "ws://file.example/ws", "uid": "from-file"}"#,
    )
    .unwrap();

    let output = pairchat(&temp_dir)
        .arg("config")
        .env("PAIRCHAT_SERVER_URL", "ws://env.example/ws")
        .output()
        .expect("Failed to execute config command");

    assert!(output.status.success(), "Command should succeed");
    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["server_url"], "ws://env.example/ws");
    assert_eq!(config["uid"], "from-file");
    assert!(
        temp_dir.path().join("pairchat.log").exists(),
        "Log file should be created in the config dir"
    );
}

/// Run `start --headless` against an unreachable relay, feeding `input`.
fn run_headless(mut cmd: Command, input: &[u8]) -> std::process::Output {
    let mut child = cmd
        .args(["start", "--headless", "--url", "ws://127.0.0.1:1/ws"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to start headless client");

    child.stdin.take().unwrap().write_all(input).unwrap();
    child.wait_with_output().unwrap()
}

/// `start --headless` quits on `/quit` even when the relay is unreachable
#[test]
fn test_headless_quit_with_unreachable_relay() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_headless(pairchat(&temp_dir), b"/quit\n");

    assert!(output.status.success(), "Headless run should exit cleanly");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("-- connecting"), "got: {stdout}");
    assert!(!stdout.contains('\x1b'), "No terminal escapes in transcript");
}

/// Outside test mode a generated participant id is saved for the next run
#[test]
fn test_generated_uid_persisted_outside_test_mode() {
    let temp_dir = TempDir::new().unwrap();
    let mut cmd = pairchat(&temp_dir);
    cmd.env("PAIRCHAT_ENV", "production");

    let output = run_headless(cmd, b"/quit\n");
    assert!(output.status.success());

    let saved = std::fs::read_to_string(temp_dir.path().join("config.json"))
        .expect("config.json should be written");
    let config: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert!(config["uid"].as_str().is_some_and(|uid| !uid.is_empty()));
}

/// Test mode leaves the config directory without a config file
#[test]
fn test_generated_uid_not_persisted_in_test_mode() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_headless(pairchat(&temp_dir), b"/quit\n");
    assert!(output.status.success());
    assert!(!temp_dir.path().join("config.json").exists());
}

/// Unsupported URL schemes are rejected before connecting
#[test]
fn test_start_rejects_bad_scheme() {
    let temp_dir = TempDir::new().unwrap();

    let output = pairchat(&temp_dir)
        .args(["start", "--headless", "--url", "ftp://example.com/ws"])
        .stdin(Stdio::null())
        .output()
        .expect("Failed to execute start command");

    assert!(!output.status.success(), "Bad scheme should fail");
}
