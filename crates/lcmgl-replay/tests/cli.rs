#![cfg(not(target_arch = "wasm32"))]

use std::fs::File;
use std::path::Path;

use lcmgl_protocol::{CmdWriter, PrimitiveMode};
use lcmgl_render::Envelope;
use lcmgl_replay::CaptureWriter;
use tempfile::tempdir;

fn write_capture(path: &Path, include_bad: bool) {
    let mut square = CmdWriter::new();
    square.push_matrix();
    square.translated(0.5, 0.5, 0.0);
    square.begin(PrimitiveMode::Quads);
    square.vertex2d(0.0, 0.0);
    square.vertex2d(1.0, 0.0);
    square.vertex2d(1.0, 1.0);
    square.vertex2d(0.0, 1.0);
    square.end();
    square.pop_matrix();

    let mut unbalanced = CmdWriter::new();
    unbalanced.push_attrib(1);

    let mut w = CaptureWriter::new(File::create(path).unwrap()).unwrap();
    w.write(&Envelope {
        channel: "map".into(),
        scene: 1,
        sequence: 0,
        data: square.finish(),
    })
    .unwrap();
    if include_bad {
        w.write(&Envelope {
            channel: "debug".into(),
            scene: 1,
            sequence: 1,
            data: unbalanced.finish(),
        })
        .unwrap();
    }
    w.finish().unwrap();
}

#[test]
fn text_report_summarizes_buffers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scene.lglc");
    write_capture(&path, true);

    let output = assert_cmd::cargo::cargo_bin_cmd!("lcmgl-replay")
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .clone();
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("map scene=1 seq=0 bytes=110: ok commands=9 max_depth=2"), "{stdout}");
    assert!(
        stdout.contains("debug scene=1 seq=1 bytes=6: error unbalanced_stack at 6"),
        "{stdout}"
    );
    assert!(stdout.contains("1 ok, 1 failed, 0 skipped, 9 commands"), "{stdout}");
}

#[test]
fn strict_mode_fails_on_bad_buffer() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scene.lglc");
    write_capture(&path, true);

    assert_cmd::cargo::cargo_bin_cmd!("lcmgl-replay")
        .arg(&path)
        .arg("--strict")
        .assert()
        .failure();

    assert_cmd::cargo::cargo_bin_cmd!("lcmgl-replay")
        .arg(&path)
        .args(["--strict", "--channel", "map"])
        .assert()
        .success();
}

#[test]
fn json_report_with_dump() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scene.lglc");
    write_capture(&path, false);

    let output = assert_cmd::cargo::cargo_bin_cmd!("lcmgl-replay")
        .arg(&path)
        .args(["--json", "--dump"])
        .assert()
        .success()
        .get_output()
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["ok"], 1);
    assert_eq!(report["failed"], 0);
    let calls = report["buffers"][0]["calls"].as_array().unwrap();
    assert_eq!(calls.len(), 9);
    assert_eq!(calls[2], "begin Quads");
    assert!(report["buffers"][0].get("error").is_none());
}

#[test]
fn depth_limit_flag_is_applied() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scene.lglc");
    write_capture(&path, false);

    let output = assert_cmd::cargo::cargo_bin_cmd!("lcmgl-replay")
        .arg(&path)
        .args(["--max-stack-depth", "1", "--json"])
        .assert()
        .success()
        .get_output()
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["buffers"][0]["error"]["kind"], "stack_overflow");
    assert_eq!(report["buffers"][0]["error"]["offset"], 28);
}

#[test]
fn rejects_non_capture_input() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("junk.bin");
    std::fs::write(&path, b"not a capture").unwrap();

    assert_cmd::cargo::cargo_bin_cmd!("lcmgl-replay")
        .arg(&path)
        .assert()
        .failure();
}
