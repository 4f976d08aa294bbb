use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use prox_core::{ColumnSchema, Table};
use prox_engine::ProximityEngine;
use prox_pipe::{
    enrich_table, load_frames, run_proximity, CancelToken, PipelineConfig, RunReport, TableState,
    PROXIMITY_REPORT,
};

const HEADER: &str = "사업장명,인허가일자,폐업일자,좌표정보x(epsg5174),좌표정보y(epsg5174),영업상태명";

fn write_fixture(dir: &Path) {
    let cafe = format!(
        "\u{feff}{HEADER}\n\
         a,2016-01-01,,0,0,영업/정상\n\
         b,2016-01-01,,10,0,영업/정상\n\
         c,2016-01-01,,1000,0,영업/정상\n\
         d,2016-13-45,,5,5,영업/정상\n\
         e,2016-01-01,,,,영업/정상\n"
    );
    fs::write(dir.join("seoul_gangnam_cafe.csv"), cafe).expect("write cafe");
    fs::write(
        dir.join("seoul_gangnam_bakery.csv"),
        "사업장명,인허가일자,폐업일자\nx,2016-01-01,\n",
    )
    .expect("write bakery");
    fs::write(
        dir.join("seoul_gangnam_pub.csv"),
        format!("{HEADER}\np,2016-01-01,garbled,1,1,폐업\nq,2016-01-01,2017-06-30,4,5,폐업\n"),
    )
    .expect("write pub");
    fs::write(dir.join("README.txt"), "not a table").expect("write readme");
}

fn config(input: &Path, output: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::new(input, output);
    config.concurrency = 2;
    config
}

#[test]
fn tables_are_enriched_independently() {
    let input = tempfile::tempdir().expect("tmp dir");
    let output = tempfile::tempdir().expect("tmp dir");
    write_fixture(input.path());

    let report = run_proximity(
        &config(input.path(), output.path()),
        input.path(),
        output.path(),
        &CancelToken::new(),
    )
    .expect("run");

    let files: Vec<&str> = report.tables.iter().map(|table| table.file.as_str()).collect();
    assert_eq!(
        files,
        vec!["seoul_gangnam_bakery.csv", "seoul_gangnam_cafe.csv", "seoul_gangnam_pub.csv"]
    );
    let states: Vec<TableState> = report.tables.iter().map(|table| table.status.state).collect();
    assert_eq!(states, vec![TableState::Skipped, TableState::Partial, TableState::Complete]);
    assert_eq!(report.totals.skipped, 1);
    assert_eq!(report.totals.succeeded(), 2);
    assert_eq!(
        report.tables[0].status.error.as_ref().map(|err| err.code()),
        Some("missing_required_column")
    );

    let cafe = &report.tables[1];
    assert_eq!(cafe.industry, "cafe");
    assert_eq!(cafe.metrics.rows, 5);
    assert_eq!(cafe.metrics.accepted, 3);
    assert_eq!(cafe.metrics.flagged.get("malformed_permit_date"), Some(&1));
    assert_eq!(cafe.metrics.flagged.get("invalid_coordinate"), Some(&1));
    assert_eq!(report.tables[2].metrics.closure_defaulted, 1);
    assert!(!output.path().join("seoul_gangnam_bakery.csv").exists());
    assert!(output.path().join(PROXIMITY_REPORT).exists());

    let table = Table::read_csv(&output.path().join("seoul_gangnam_cafe.csv")).expect("read output");
    let column = |name: &str| -> Vec<String> {
        let col = table.column_index(name).expect("column present");
        table.rows.iter().map(|row| row[col].clone()).collect()
    };
    assert_eq!(table.headers[0], "사업장명");
    assert_eq!(column("avg_nearest_distance"), vec!["10", "10", "990", "", ""]);
    assert_eq!(column("adjacent_count"), vec!["1", "1", "0", "", ""]);
    assert_eq!(
        column("proximity_flag"),
        vec!["", "", "", "malformed_permit_date", "invalid_coordinate"]
    );
    assert_eq!(column("operating_period")[0], "2016-01-01~2019-12-31");
    assert_eq!(column("operating_period")[3], "");
    assert_eq!(column("operating_period")[4], "2016-01-01~2019-12-31");
}

#[test]
fn rerun_reproduces_outputs() {
    let input = tempfile::tempdir().expect("tmp dir");
    let output = tempfile::tempdir().expect("tmp dir");
    write_fixture(input.path());
    let config = config(input.path(), output.path());

    run_proximity(&config, input.path(), output.path(), &CancelToken::new()).expect("first run");
    let first_table = fs::read(output.path().join("seoul_gangnam_cafe.csv")).expect("read table");
    let first_report = fs::read(output.path().join(PROXIMITY_REPORT)).expect("read report");

    // Feeding the enriched output back in overwrites the derived columns in place.
    let again = tempfile::tempdir().expect("tmp dir");
    run_proximity(&config, output.path(), again.path(), &CancelToken::new()).expect("rerun");
    run_proximity(&config, input.path(), output.path(), &CancelToken::new()).expect("second run");
    let second_table = fs::read(output.path().join("seoul_gangnam_cafe.csv")).expect("read table");
    assert_eq!(first_table, second_table);
    assert_eq!(
        fs::read(again.path().join("seoul_gangnam_cafe.csv")).expect("read rerun"),
        first_table
    );

    let mut first: RunReport = serde_json::from_slice(&first_report).expect("parse first");
    let mut second = RunReport::load(&output.path().join(PROXIMITY_REPORT)).expect("load second");
    assert_eq!(second.totals, first.totals);
    first.provenance.created_at.clear();
    second.provenance.created_at.clear();
    assert_eq!(first, second);
    assert_eq!(first.config_hash, config.config_hash().expect("hash"));
}

#[test]
fn cancelled_run_starts_no_table() {
    let input = tempfile::tempdir().expect("tmp dir");
    let output = tempfile::tempdir().expect("tmp dir");
    write_fixture(input.path());
    let cancel = CancelToken::new();
    cancel.cancel();

    let report = run_proximity(&config(input.path(), output.path()), input.path(), output.path(), &cancel)
        .expect("run");
    assert_eq!(report.totals.cancelled, 3);
    assert!(!output.path().join("seoul_gangnam_cafe.csv").exists());
}

#[test]
fn overlong_line_keeps_its_row_and_competitors() {
    let input = tempfile::tempdir().expect("tmp dir");
    let output = tempfile::tempdir().expect("tmp dir");
    fs::write(
        input.path().join("seoul_cafe.csv"),
        format!(
            "{HEADER}\n\
             a,2016-01-01,,0,0,영업/정상\n\
             b,2016-01-01,,10,0,영업/정상,trailing\n\
             c,2016-01-01,,1000,0,영업/정상\n"
        ),
    )
    .expect("write table");

    let report = run_proximity(
        &config(input.path(), output.path()),
        input.path(),
        output.path(),
        &CancelToken::new(),
    )
    .expect("run");
    let cafe = &report.tables[0];
    assert_eq!(cafe.status.state, TableState::Partial);
    assert_eq!(cafe.metrics.rows, 3);
    assert_eq!(cafe.metrics.malformed_lines, 1);
    assert_eq!(cafe.metrics.flagged_total(), 0);
    assert_eq!(report.totals.partial, 1);

    let table = Table::read_csv(&output.path().join("seoul_cafe.csv")).expect("read output");
    let names: Vec<&str> = table.rows.iter().map(|row| row[0].as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    let col = table.column_index("avg_nearest_distance").expect("distance column");
    let distances: Vec<&str> = table.rows.iter().map(|row| row[col].as_str()).collect();
    assert_eq!(distances, vec!["10", "10", "990"]);
    assert!(!table.headers.iter().any(|header| header == "trailing"));
}

#[test]
fn cancellation_between_phases_leaves_table_untouched() {
    let data = format!("{HEADER}\na,2016-01-01,,0,0,영업/정상\nb,2016-01-01,,10,0,영업/정상\n");
    let mut table = Table::from_reader(data.as_bytes()).expect("parse");
    let before = table.clone();
    let engine = ProximityEngine::new(NaiveDate::from_ymd_opt(2019, 12, 31).expect("horizon"));
    let cancel = CancelToken::new();
    cancel.cancel();

    let metrics = enrich_table(&mut table, &ColumnSchema::default(), &engine, &cancel).expect("enrich");
    assert!(metrics.is_none());
    assert_eq!(table.headers, before.headers);
    assert_eq!(table.rows, before.rows);

    let live = enrich_table(&mut table, &ColumnSchema::default(), &engine, &CancelToken::new())
        .expect("enrich")
        .expect("not cancelled");
    assert_eq!(live.accepted, 2);
    assert!(table.column_index("adjacent_count").is_some());
}

#[test]
fn reports_read_only_tables_the_last_run_wrote() {
    let input = tempfile::tempdir().expect("tmp dir");
    let output = tempfile::tempdir().expect("tmp dir");
    write_fixture(input.path());
    let config = config(input.path(), output.path());
    let report = run_proximity(&config, input.path(), output.path(), &CancelToken::new()).expect("run");
    let written: Vec<&str> = report.written_files().into_iter().collect();
    assert_eq!(written, vec!["seoul_gangnam_cafe.csv", "seoul_gangnam_pub.csv"]);

    fs::copy(
        output.path().join("seoul_gangnam_cafe.csv"),
        output.path().join("seoul_stale_bar.csv"),
    )
    .expect("copy stale table");
    let frames = load_frames(output.path(), &config.columns, 1).expect("frames");
    let industries: Vec<&str> = frames.iter().map(|frame| frame.industry.as_str()).collect();
    assert_eq!(industries, vec!["cafe", "pub"]);

    fs::remove_file(output.path().join(PROXIMITY_REPORT)).expect("remove report");
    let frames = load_frames(output.path(), &config.columns, 1).expect("frames");
    assert_eq!(frames.len(), 3);
}

#[test]
fn unreadable_input_root_is_fatal() {
    let output = tempfile::tempdir().expect("tmp dir");
    let missing = output.path().join("missing");
    let err = run_proximity(&config(&missing, output.path()), &missing, output.path(), &CancelToken::new())
        .expect_err("missing input");
    assert_eq!(err.code(), "config_input_root");

    let input = tempfile::tempdir().expect("tmp dir");
    let mut bad = config(input.path(), output.path());
    bad.horizon = "2019/12/31".to_string();
    let err = run_proximity(&bad, input.path(), output.path(), &CancelToken::new()).expect_err("bad horizon");
    assert_eq!(err.code(), "config_horizon");
}
