#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::Path;
use std::thread;

pub fn new_command_with_temp_home() -> (Command, tempfile::TempDir) {
    let temp_home = tempfile::tempdir().expect("temp home");
    let binary = assert_cmd::cargo::cargo_bin!("snack-import");
    let mut command = Command::new(binary);
    command.env("HOME", temp_home.path());
    command.env("XDG_CONFIG_HOME", temp_home.path().join(".config"));
    command.env_remove("IMPORT_SERVER_URL");
    command.env_remove("RUST_LOG");
    (command, temp_home)
}

pub fn write_config(home: &Path, body: &str) {
    let config_dir = home.join(".config").join("snack-import");
    fs::create_dir_all(&config_dir).expect("create config dir");
    fs::write(config_dir.join("config.toml"), body).expect("write config");
}

/// Answers a single HTTP request and hands back the request line it saw.
pub fn serve_once(status_line: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
    let address = listener.local_addr().expect("stub address");

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
        let mut request_line = String::new();
        reader.read_line(&mut request_line).expect("read request line");

        loop {
            let mut header = String::new();
            reader.read_line(&mut header).expect("read header");
            if header == "\r\n" || header.is_empty() {
                break;
            }
        }

        let mut stream = stream;
        write!(
            stream,
            "HTTP/1.1 {status_line}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .expect("write response");
        stream.flush().expect("flush response");
        request_line
    });

    (format!("http://{address}"), handle)
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
            .unwrap_or_else(|| panic!("diagnostics file should end with .log: {name}"));
        assert!(
            !stem.is_empty() && stem.chars().all(|character| character.is_ascii_digit()),
            "diagnostics filename must be <timestamp>.log, got: {name}"
        );
    }
}
