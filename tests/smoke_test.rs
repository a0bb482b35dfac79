/// Smoke tests to verify the binary runs without panicking
use std::process::Command;

fn routemap(args: &[&str]) -> std::process::Output {
    Command::new("cargo")
        .args(["run", "--quiet", "--"])
        .args(args)
        .output()
        .expect("Failed to execute cargo run")
}

#[test]
fn binary_shows_help() {
    let output = routemap(&["--help"]);

    assert!(
        output.status.success(),
        "Binary failed to run --help: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("routemap"), "Help output should mention routemap");
    assert!(stdout.contains("--routes"), "Help output should list --routes");
}

#[test]
fn binary_shows_version() {
    let output = routemap(&["--version"]);

    assert!(
        output.status.success(),
        "Binary failed to run --version: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("0.1.0"));
}

#[test]
fn invalid_flag_fails_gracefully() {
    let output = routemap(&["--no-such-flag"]);

    assert!(!output.status.success(), "Invalid flag should return error status");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        !stderr.contains("panicked at"),
        "Invalid flag should not cause panic"
    );
}

#[test]
fn zero_interval_is_rejected() {
    let output = routemap(&["--interval", "0"]);

    assert!(!output.status.success(), "Zero interval should be rejected");
    assert!(!String::from_utf8_lossy(&output.stderr).contains("panicked at"));
}

#[test]
fn invalid_config_fails_startup() {
    let dir = std::env::temp_dir().join(format!("routemap-smoke-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.toml");
    std::fs::write(&path, "[map]\nborder = 7\n").unwrap();

    let output = routemap(&["--config", path.to_str().unwrap(), "--print"]);
    let _ = std::fs::remove_dir_all(&dir);

    assert!(!output.status.success(), "Invalid config should fail startup");
    assert!(!String::from_utf8_lossy(&output.stderr).contains("panicked at"));
}
