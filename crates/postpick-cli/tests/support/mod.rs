use assert_cmd::Command;
use serde_json::json;
use std::fs;
use std::net::TcpListener;
use std::path::{Path, PathBuf};

pub fn new_command_with_temp_home() -> (Command, tempfile::TempDir) {
    let temp_home = tempfile::tempdir().expect("temp home");
    let binary = assert_cmd::cargo::cargo_bin!("postpick");
    let mut command = Command::new(binary);
    command.env("HOME", temp_home.path());
    command.env("XDG_CONFIG_HOME", temp_home.path().join(".config"));
    command.env_remove("RUST_LOG");
    (command, temp_home)
}

pub fn config_dir(home: &Path) -> PathBuf {
    home.join(".config").join("postpick")
}

pub fn write_config(home: &Path, contents: &str) {
    let dir = config_dir(home);
    fs::create_dir_all(&dir).expect("create config dir");
    fs::write(dir.join("config.toml"), contents).expect("write config");
}

/// An endpoint on a port that was just released, so requests fail fast.
pub fn closed_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind free port");
    let port = listener.local_addr().expect("free port addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}/posts")
}

pub fn write_saved_selection(home: &Path, id: i64, title: &str) {
    let dir = config_dir(home);
    fs::create_dir_all(&dir).expect("create config dir");
    let value = json!({ "id": id, "title": title, "body": "saved body" }).to_string();
    let store = json!({
        "version": 1,
        "entries": {
            "selectedData": {
                "value": value,
                "updated_at": "2026-10-19T08:00:00Z"
            }
        }
    });
    fs::write(dir.join("store.json"), store.to_string()).expect("write store");
}

pub fn assert_timestamp_log_names(entries: &[std::fs::DirEntry]) {
    assert!(!entries.is_empty(), "expected at least one diagnostics log");

    for entry in entries {
        let name = entry
            .file_name()
            .into_string()
            .expect("diagnostics filename utf8");
        let stem = name
            .strip_suffix(".log")
            .expect("diagnostics filename .log suffix");
        assert!(
            !stem.is_empty() && stem.chars().all(|character| character.is_ascii_digit()),
            "diagnostics filename must be <timestamp>.log, got: {name}"
        );
    }
}
