use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use assert_cmd::Command;
use tempfile::TempDir;

const SAMPLE: &str = r#"{ "b" : 2, "a" : 1 }"#;
const SAMPLE_HASH: &str = "43258cff783fe7036d8a43033f830adfc60ec037382473548ac742b888292777";

fn drift() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("drift"));
    cmd.env_remove("DRIFT_LOG")
        .env_remove("DRIFT_MAX_DEPTH")
        .env_remove("DRIFT_BYTES_ENCODING");
    cmd
}

fn write_file(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let p = dir.path().join(name);
    fs::write(&p, body).unwrap();
    p
}

#[test]
fn normalize_reads_stdin() {
    drift()
        .arg("normalize")
        .write_stdin(SAMPLE)
        .assert()
        .success()
        .stdout("{\"a\":1,\"b\":2}\n");
}

#[test]
fn hash_reads_input_file() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "in.json", SAMPLE);

    drift()
        .args(["hash", "--input", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(format!("{SAMPLE_HASH}\n"));
}

#[test]
fn normalize_and_hash_prints_both() {
    let out = drift()
        .arg("normalize-and-hash")
        .write_stdin(SAMPLE)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["normalized_json"], "{\"a\":1,\"b\":2}");
    assert_eq!(v["deterministic_hash"], SAMPLE_HASH);
}

#[test]
fn struct_bytes_roundtrip_through_decode() {
    let dir = TempDir::new().unwrap();
    let input = r#"{"s":"t","n":[1,null,{"k":true}]}"#;

    for encoding in ["hex", "base64"] {
        let out = drift()
            .args(["struct-bytes", "--encoding", encoding])
            .write_stdin(input)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let bytes_file = write_file(&dir, encoding, &String::from_utf8(out).unwrap());

        drift()
            .args(["struct-decode", "--encoding", encoding, "--input", bytes_file.to_str().unwrap()])
            .assert()
            .success()
            .stdout("{\"n\":[1,null,{\"k\":true}],\"s\":\"t\"}\n");
    }
}

#[test]
fn struct_bytes_encoding_from_env() {
    drift()
        .arg("struct-bytes")
        .env("DRIFT_BYTES_ENCODING", "base64")
        .write_stdin(r#"{"a":true}"#)
        .assert()
        .success()
        .stdout("CgcKAWESAiAB\n");

    drift()
        .args(["struct-bytes", "--encoding", "hex"])
        .env("DRIFT_BYTES_ENCODING", "base64")
        .write_stdin(r#"{"a":true}"#)
        .assert()
        .success()
        .stdout("0a070a016112022001\n");
}

#[test]
fn deep_struct_bytes_decode_or_fail_up_front() {
    let dir = TempDir::new().unwrap();
    let nested = |depth: usize| format!("{}null{}", r#"{"k":"#.repeat(depth), "}".repeat(depth));

    let out = drift()
        .arg("struct-bytes")
        .write_stdin(nested(32))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let bytes_file = write_file(&dir, "deep.hex", &String::from_utf8(out).unwrap());
    drift()
        .args(["struct-decode", "--input", bytes_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(format!("{}\n", nested(32)));

    drift()
        .arg("struct-bytes")
        .write_stdin(nested(60))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("ERROR: type error"));
}

#[test]
fn struct_field_count_counts_top_level() {
    drift()
        .arg("struct-field-count")
        .write_stdin(r#"{"a":1,"b":{"x":1,"y":2},"c":[1,2,3]}"#)
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn export_payload_applies_merges() {
    let dir = TempDir::new().unwrap();
    let merges = write_file(&dir, "merges.json", r#"{"body":{"encoding":1,"decoded_type":1}}"#);

    let out = drift()
        .args(["export-payload", "--merges", merges.to_str().unwrap()])
        .write_stdin(r#"{"body":"eyJrIjoidiJ9","status":200}"#)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["normalized_json"], r#"{"body":"eyJrIjoidiJ9","status":200}"#);
    assert_eq!(v["decoded_json"], r#"{"body":{"k":"v"},"status":200}"#);
    assert_eq!(v["decoded_value_hash"].as_str().unwrap().len(), 64);
    assert!(v["decoded_schema_json"].as_str().unwrap().contains(r#""encoding":1"#));
    assert!(!v["protobuf_struct_bytes"].as_str().unwrap().is_empty());
}

#[test]
fn parse_errors_exit_nonzero() {
    drift()
        .arg("normalize")
        .write_stdin("{invalid")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("ERROR: parse error"));
}

#[test]
fn non_object_struct_is_a_type_error() {
    drift()
        .arg("struct-bytes")
        .write_stdin("[1,2,3]")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ERROR: type error"));
}

#[test]
fn max_depth_from_env() {
    drift()
        .arg("normalize")
        .env("DRIFT_MAX_DEPTH", "2")
        .write_stdin("[[[1]]]")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nesting"));

    drift()
        .arg("normalize")
        .env("DRIFT_MAX_DEPTH", "2")
        .write_stdin("[[1]]")
        .assert()
        .success()
        .stdout("[[1]]\n");
}

#[test]
fn invalid_utf8_is_an_encoding_error() {
    drift()
        .arg("hash")
        .write_stdin(vec![b'"', 0xff, b'"'])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ERROR: encoding error"));
}
