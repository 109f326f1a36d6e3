use factsheet_check::{check_documents, CheckOptions, MismatchKind};
use factsheet_xlsx::minimal::{write_fixture_xlsx, FixtureSheet, FixtureStyle};
use pretty_assertions::assert_eq;

fn fixture_sheets(label: &str) -> Vec<FixtureSheet> {
    let mut summary = FixtureSheet::new("Summary");
    summary.text(1, 1, "summary");
    let mut chinese = FixtureSheet::new("Table c");
    chinese.text(1, 1, "chinese version");

    let mut table = FixtureSheet::new("Table e");
    table
        .text(1, 1, "Fact sheet")
        .text(3, 1, "Population")
        .text(5, 2, label)
        .number(5, 3, 1.0)
        .text(8, 1, "end");

    vec![summary, chinese, table]
}

fn write_doc(dir: &std::path::Path, area: &str, label: &str) -> std::path::PathBuf {
    let styles = vec![FixtureStyle::filled("FFCCFFCC")];
    let bytes = write_fixture_xlsx(&fixture_sheets(label), &styles).unwrap();
    let path = dir.join(format!("{area}.xlsx"));
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn matching_documents_yield_a_clean_report() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![
        write_doc(dir.path(), "A01", "Male"),
        write_doc(dir.path(), "A02", "Male"),
    ];

    let report = check_documents(&paths, &CheckOptions::default()).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.reference, "A01");
    assert_eq!(report.documents.len(), 2);
}

#[test]
fn drifted_documents_are_reported_against_the_first() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![
        write_doc(dir.path(), "A01", "Male"),
        write_doc(dir.path(), "A02", "Persons"),
    ];

    let report = check_documents(&paths, &CheckOptions::default()).unwrap();
    assert!(!report.is_clean());

    let drifted = &report.documents[1];
    assert_eq!(drifted.area, "A02");
    assert_eq!(drifted.mismatches.len(), 1);
    assert_eq!(drifted.mismatches[0].cell, "B5");
    assert_eq!(drifted.mismatches[0].kind, MismatchKind::Differs);
}

#[test]
fn convention_violations_are_per_document() {
    let dir = tempfile::tempdir().unwrap();

    // Two sheets instead of three, and a last sheet not ending in "e".
    let mut only = FixtureSheet::new("Summary");
    only.text(1, 1, "summary");
    let mut table = FixtureSheet::new("Table 2");
    table.text(3, 1, "Population").text(4, 1, "end");
    let bytes = write_fixture_xlsx(&[only, table], &[]).unwrap();
    let path = dir.path().join("B99.xlsx");
    std::fs::write(&path, bytes).unwrap();

    let report = check_documents(&[path], &CheckOptions::default()).unwrap();
    assert_eq!(report.documents[0].convention_issues.len(), 2);
    assert!(!report.is_clean());
}

#[test]
fn json_serialization_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![write_doc(dir.path(), "A01", "Male")];
    let report = check_documents(&paths, &CheckOptions::default()).unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["reference"], "A01");
    assert!(json["documents"][0]["convention_issues"]
        .as_array()
        .unwrap()
        .is_empty());
}
