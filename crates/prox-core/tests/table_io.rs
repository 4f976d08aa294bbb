use prox_core::errors::MISSING_REQUIRED_COLUMN;
use prox_core::{extract_records, ColumnSchema, Location, Table};

const SAMPLE: &str = "\u{feff}사업장명,인허가일자,폐업일자,좌표정보x(epsg5174),좌표정보y(epsg5174),survival_label
alpha,2016-01-04,,203512.5,444120.25,True
beta,2016-03-10,2017-05-01,,444000,False
gamma,2016/03/10,,203000,444000,
";

#[test]
fn csv_roundtrip_preserves_cells_and_order() {
    let table = Table::from_reader(SAMPLE.as_bytes()).expect("parse");
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("nested").join("seoul_cafe.csv");
    table.write_csv(&path).expect("write");
    assert!(!dir.path().join("nested").join("seoul_cafe.csv.partial").exists());

    let reread = Table::read_csv(&path).expect("reread");
    assert_eq!(reread.headers, table.headers);
    assert_eq!(reread.rows, table.rows);
    assert_eq!(reread.headers[0], "사업장명");
}

#[test]
fn records_follow_the_column_schema() {
    let table = Table::from_reader(SAMPLE.as_bytes()).expect("parse");
    let records = extract_records(&table, &ColumnSchema::default()).expect("records");
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].id, "alpha");
    assert_eq!(records[0].location, Some(Location::new(203512.5, 444120.25)));
    assert_eq!(records[0].survival_label, Some(true));
    assert_eq!(records[1].location, None);
    assert_eq!(records[1].closure_date, "2017-05-01");
    assert_eq!(records[2].permit_date, "2016/03/10");
    assert_eq!(records[2].survival_label, None);
    assert_eq!(records[2].row, 2);
}

#[test]
fn missing_columns_are_reported_together() {
    let table = Table::from_reader("사업장명,인허가일자\na,2016-01-01\n".as_bytes()).expect("parse");
    let err = extract_records(&table, &ColumnSchema::default()).unwrap_err();
    assert_eq!(err.code(), MISSING_REQUIRED_COLUMN);
    let missing = &err.info().context["missing"];
    assert!(missing.contains("폐업일자"));
    assert!(missing.contains("좌표정보y(epsg5174)"));
}
