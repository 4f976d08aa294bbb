use std::fs;
use std::process::Command;

use serde_json::Value;

const HEADER: &str = "사업장명,인허가일자,폐업일자,좌표정보x(epsg5174),좌표정보y(epsg5174)";

#[test]
fn proximity_prints_run_totals() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let input = dir.path().join("in");
    fs::create_dir(&input).expect("create input");
    fs::write(
        input.join("cafe.csv"),
        format!("{HEADER}\nA,2016-01-01,,0,0\nB,2016-01-01,,10,0\nC,2016-01-01,,1000,0\n"),
    )
    .expect("write table");
    let out = dir.path().join("out");

    let output = Command::new(env!("CARGO_BIN_EXE_prox"))
        .args(["--log-level", "error", "proximity", "--horizon", "2019-12-31", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .output()
        .expect("run prox proximity");
    assert!(output.status.success());

    let totals: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(totals["tables"], 1);
    assert_eq!(totals["complete"], 1);
    assert!(out.join("cafe.csv").is_file());
    assert!(out.join("proximity_report.json").is_file());
}

#[test]
fn missing_input_root_fails() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let status = Command::new(env!("CARGO_BIN_EXE_prox"))
        .args(["--log-level", "off", "proximity", "--input"])
        .arg(dir.path().join("absent"))
        .arg("--out")
        .arg(dir.path().join("out"))
        .status()
        .expect("run prox proximity");
    assert!(!status.success());
}
