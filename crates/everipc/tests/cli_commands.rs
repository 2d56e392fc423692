#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::{Command, Output};

use everipc::wire::{ItemFlags, QueryRequest, RequestFlags, ResultListBuilder, SortOrder};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "everipc-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn everipc(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_everipc"))
        .arg("--log-level")
        .arg("error")
        .args(args)
        .output()
        .expect("everipc should run")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn layout_reports_structure_sizes() {
    let output = everipc(&["--format", "json", "layout"]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    let sizes: Vec<(String, u64)> = json["structures"]
        .as_array()
        .expect("structures should be an array")
        .iter()
        .map(|s| {
            (
                s["name"].as_str().unwrap().to_string(),
                s["size"].as_u64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        sizes,
        vec![
            ("QUERY2".to_string(), 28),
            ("LIST2".to_string(), 20),
            ("ITEM2".to_string(), 8)
        ]
    );

    let flags = json["request_flags"].as_array().unwrap();
    assert_eq!(flags.len(), 11);
    assert_eq!(flags[9]["name"], "RUN_COUNT");
    assert_eq!(flags[9]["value"], "0x00001000");
}

#[test]
fn encode_then_inspect_request() {
    let dir = unique_temp_dir("encode");
    let path = dir.join("query.bin");

    let output = everipc(&[
        "--format",
        "json",
        "encode",
        "foo",
        "--reply-target",
        "100",
        "--reply-message",
        "2",
        "--request",
        "NAME|SIZE",
        "--sort",
        "1",
        "--out",
        path.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_json(&output)["size"], 36);

    let bytes = std::fs::read(&path).expect("encoded file should exist");
    assert_eq!(bytes.len(), 36);
    let request = QueryRequest::decode(&bytes).unwrap();
    assert_eq!(request.search_string, "foo");
    assert_eq!(request.request_flags, RequestFlags::NAME | RequestFlags::SIZE);

    let output = everipc(&["--format", "json", "inspect-request", path.to_str().unwrap()]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["reply_target_id"], 100);
    assert_eq!(json["max_results"], serde_json::Value::Null);
    assert_eq!(json["request_flags"], "0x00000011");
    assert_eq!(json["sort_name"], "NAME_ASCENDING");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decode_prints_requested_fields() {
    let dir = unique_temp_dir("decode");
    let path = dir.join("reply.bin");
    let reply = ResultListBuilder::new(
        RequestFlags::NAME | RequestFlags::PATH,
        SortOrder::NAME_ASCENDING,
    )
    .totitems(5)
    .push(ItemFlags::empty(), &["a.txt", r"C:\docs"])
    .push(ItemFlags::FOLDER, &["src", r"C:\work"])
    .build()
    .unwrap();
    std::fs::write(&path, &reply).unwrap();

    let output = everipc(&["--format", "json", "decode", path.to_str().unwrap()]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["totitems"], 5);
    assert_eq!(json["numitems"], 2);
    assert_eq!(json["items"][0]["fields"][0]["value"], "a.txt");
    assert_eq!(json["items"][1]["kind"], "folder");

    let output = everipc(&[
        "--format",
        "raw",
        "decode",
        path.to_str().unwrap(),
        "--field",
        "path",
    ]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "C:\\docs\nC:\\work\n");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decode_truncated_reply_is_data_invalid() {
    let dir = unique_temp_dir("truncated");
    let path = dir.join("short.bin");
    std::fs::write(&path, [0u8; 12]).unwrap();

    let output = everipc(&["decode", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("truncated buffer"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn flags_reports_unknown_bits_without_failing() {
    let output = everipc(&["--format", "json", "flags", "NAME|0x200"]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["value"], "0x00000201");
    assert_eq!(json["unknown"], "0x00000200");
    assert!(json["diagnostic"].as_str().unwrap().contains("undocumented"));
}

#[test]
fn encode_rejects_unknown_request_flag() {
    let output = everipc(&["encode", "foo", "--request", "NAME|COLOR"]);
    assert_eq!(output.status.code(), Some(64));
}
