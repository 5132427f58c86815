#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::{Command, Output};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "gemwire-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn gemwire(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gemwire"))
        .env_remove("GEMWIRE_DEVICE")
        .env_remove("GEMWIRE_PROFILE")
        .env_remove("GEMWIRE_LAYOUT_DIR")
        .args(["--log-level", "error"])
        .args(args)
        .output()
        .expect("gemwire should run")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim()).expect("stdout should be json")
}

#[test]
fn version_prints_package_version() {
    let output = gemwire(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("gemwire {}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn extended_version_lists_builtin_profiles() {
    let output = gemwire(&["--format", "json", "version", "--extended"]);
    assert!(output.status.success());
    let payload = stdout_json(&output);
    assert_eq!(payload["name"], "gemwire");
    assert_eq!(payload["profiles"], serde_json::json!(["legacy", "current"]));
}

#[test]
fn teeth_encode_sets_length_marker_and_msbs() {
    let output = gemwire(&["--format", "pretty", "teeth", "encode", "8102"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "2801020000");

    let output = gemwire(&["--format", "json", "teeth", "decode", "2801020000"]);
    assert!(output.status.success());
    let payload = stdout_json(&output);
    assert_eq!(payload["output"], "8102");
    assert_eq!(payload["output_len"], 2);
}

#[test]
fn teeth_decode_rejects_ragged_input_with_60() {
    let output = gemwire(&["teeth", "decode", "28010200"]);
    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("multiple of 5"));
}

#[test]
fn profile_show_prints_command_table() {
    let output = gemwire(&["--format", "json", "--profile", "legacy", "profile", "show"]);
    assert!(output.status.success());
    let payload = stdout_json(&output);
    assert_eq!(payload["name"], "legacy");
    assert_eq!(payload["commands"]["commands"]["read_settings"], 8);
    assert_eq!(payload["settings_transfer"]["mode"], "chunked");
    assert_eq!(payload["settings_transfer"]["chunk_size"], 10);
}

#[test]
fn missing_profile_file_is_reported() {
    let output = gemwire(&["--profile", "/nonexistent/gemini.json", "profile", "show"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("/nonexistent/gemini.json"));
}

#[test]
fn layout_list_includes_builtins() {
    let output = gemwire(&["--format", "json", "layout", "list"]);
    assert!(output.status.success());
    let payload = stdout_json(&output);
    let layouts = payload.as_array().expect("layout list should be an array");
    assert!(layouts
        .iter()
        .any(|l| l["name"] == "gem_settings" && l["packed_size"] == 80));
    assert!(layouts
        .iter()
        .any(|l| l["name"] == "gem_monitor_update" && l["packed_size"] == 66));
}

#[test]
fn settings_dry_run_merges_file_over_defaults() {
    let dir = unique_temp_dir("dry-run");
    let changes = dir.join("changes.json");
    std::fs::write(&changes, r#"{"led_brightness": 12, "castor_knob_max": 1.5}"#)
        .expect("changes should be writable");

    let output = gemwire(&[
        "--format",
        "json",
        "settings",
        "set",
        "--dry-run",
        "--file",
        changes.to_str().expect("temp path should be utf-8"),
    ]);
    assert!(output.status.success());
    let payload = stdout_json(&output);
    assert_eq!(payload["led_brightness"], 12);
    assert_eq!(payload["castor_knob_max"], 1.5);
    assert_eq!(payload["pulse_width_bitmask"], 4095);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn settings_dry_run_rejects_unknown_fields() {
    let dir = unique_temp_dir("unknown-field");
    let changes = dir.join("changes.json");
    std::fs::write(&changes, r#"{"warp_drive": true}"#).expect("changes should be writable");

    let output = gemwire(&[
        "settings",
        "set",
        "--dry-run",
        "--file",
        changes.to_str().expect("temp path should be utf-8"),
    ]);
    assert_eq!(output.status.code(), Some(60));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn device_commands_without_device_are_usage_errors() {
    for args in [&["info"][..], &["settings", "get"], &["mode", "normal"], &["reset"]] {
        let output = gemwire(args);
        assert_eq!(output.status.code(), Some(64), "args {args:?}");
    }
}

#[test]
fn missing_device_node_is_a_transport_error() {
    let output = gemwire(&["--device", "/nonexistent/midiC9D9", "info"]);
    assert_eq!(output.status.code(), Some(3));
}
