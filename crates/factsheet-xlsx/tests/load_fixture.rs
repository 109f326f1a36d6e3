use factsheet_model::{CellValue, Color};
use factsheet_xlsx::minimal::{write_fixture_xlsx, FixtureSheet, FixtureStyle};
use pretty_assertions::assert_eq;

const GREEN: &str = "FFCCFFCC";

fn two_sheet_fixture() -> Vec<u8> {
    let styles = vec![
        FixtureStyle::filled(GREEN),                       // 0: marker
        FixtureStyle::bold_filled("FFEEEEEE"),             // 1: bold label
        FixtureStyle {
            border_top: true,
            number_format: Some("#,##0 (x)".to_string()),
            ..FixtureStyle::default()
        },                                                 // 2: ruled + custom format
    ];

    let mut notes = FixtureSheet::new("Notes");
    notes.text(1, 1, "ignore me");

    let mut table = FixtureSheet::new("Table e");
    table
        .text(1, 1, "Area profile")
        .styled_text(2, 1, "Table 1", 0)
        .styled_text(3, 1, "Male", 1)
        .text(4, 1, "footnote")
        .styled_number(4, 3, 42.5, 2)
        .styled_blank(5, 1, 0)
        .text(6, 5, "wide");

    write_fixture_xlsx(&[notes, table], &styles).unwrap()
}

#[test]
fn selects_the_last_sheet_by_position() {
    let bytes = two_sheet_fixture();
    let workbook = factsheet_xlsx::load_from_bytes(&bytes).unwrap();

    assert_eq!(workbook.sheet_names, vec!["Notes", "Table e"]);
    assert_eq!(workbook.grid.name(), "Table e");
    // Content of the first sheet must not leak in.
    assert_eq!(workbook.grid.value(1, 1).as_text(), Some("Area profile"));
}

#[test]
fn grid_is_rectangular_and_padded() {
    let bytes = two_sheet_fixture();
    let grid = factsheet_xlsx::load_from_bytes(&bytes).unwrap().grid;

    assert_eq!(grid.n_rows(), 6);
    assert_eq!(grid.n_cols(), 5);
    for row in 1..=6 {
        assert!(grid.cell(row, 5).is_some());
    }
    assert!(grid.value(3, 5).is_empty());
}

#[test]
fn styles_resolve_per_cell() {
    let bytes = two_sheet_fixture();
    let grid = factsheet_xlsx::load_from_bytes(&bytes).unwrap().grid;

    let marker = grid.style(2, 1);
    assert_eq!(marker.fill, Some(Color::new_argb(0xFFCCFFCC)));
    assert!(!marker.bold);

    let label = grid.style(3, 1);
    assert!(label.bold);
    assert_eq!(label.fill, Some(Color::new_argb(0xFFEEEEEE)));

    let data = grid.style(4, 3);
    assert!(data.border_top);
    assert!(!data.border_bottom);
    assert_eq!(data.number_format.as_deref(), Some("#,##0 (x)"));

    // Plain cells resolve to the default style.
    assert_eq!(grid.style(1, 1).fill, None);
}

#[test]
fn valueless_cells_keep_their_formatting() {
    let bytes = two_sheet_fixture();
    let grid = factsheet_xlsx::load_from_bytes(&bytes).unwrap().grid;

    assert!(!grid.has_value(5, 1));
    assert_eq!(grid.fill(5, 1), Some(Color::new_argb(0xFFCCFFCC)));
}

#[test]
fn values_come_through_typed() {
    let bytes = two_sheet_fixture();
    let grid = factsheet_xlsx::load_from_bytes(&bytes).unwrap().grid;

    assert_eq!(grid.value(4, 3), &CellValue::Number(42.5));
    assert_eq!(grid.value(4, 1).as_text(), Some("footnote"));
}

#[test]
fn load_from_path_derives_the_area_code() {
    let bytes = two_sheet_fixture();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Z34.xlsx");
    std::fs::write(&path, &bytes).unwrap();

    let doc = factsheet_xlsx::load_from_path(&path).unwrap();
    assert_eq!(doc.area.as_str(), "Z34");
    assert_eq!(doc.grid.name(), "Table e");
}

#[test]
fn inline_strings_bools_and_errors_are_typed() {
    // Hand-assembled package exercising the cell types the fixture writer
    // does not emit.
    let mut buffer = std::io::Cursor::new(Vec::new());
    {
        use std::io::Write as _;
        let mut zip = zip::ZipWriter::new(&mut buffer);
        let options = zip::write::SimpleFileOptions::default();

        zip.start_file("xl/workbook.xml", options).unwrap();
        zip.write_all(
            br#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
  xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets><sheet name="Only e" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#,
        )
        .unwrap();

        zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
        zip.write_all(
            br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#,
        )
        .unwrap();

        zip.start_file("xl/worksheets/sheet1.xml", options).unwrap();
        zip.write_all(
            br#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="1">
      <c r="A1" t="inlineStr"><is><t>Inline label</t></is></c>
      <c r="B1" t="b"><v>1</v></c>
      <c r="C1" t="e"><v>#DIV/0!</v></c>
      <c r="D1"><f>SUM(A1:A2)</f><v>7.5</v></c>
    </row>
  </sheetData>
</worksheet>"#,
        )
        .unwrap();

        zip.finish().unwrap();
    }

    let grid = factsheet_xlsx::load_from_bytes(&buffer.into_inner()).unwrap().grid;
    assert_eq!(grid.value(1, 1).as_text(), Some("Inline label"));
    assert_eq!(grid.value(1, 2), &CellValue::Bool(true));
    assert_eq!(grid.value(1, 3).as_text(), Some("#DIV/0!"));
    assert_eq!(grid.value(1, 4), &CellValue::Number(7.5));
}

#[test]
fn workbook_without_sheets_is_rejected() {
    let mut buffer = std::io::Cursor::new(Vec::new());
    {
        use std::io::Write as _;
        let mut zip = zip::ZipWriter::new(&mut buffer);
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("xl/workbook.xml", options).unwrap();
        zip.write_all(br#"<workbook><sheets/></workbook>"#).unwrap();
        zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
        zip.write_all(br#"<Relationships/>"#).unwrap();
        zip.finish().unwrap();
    }

    let err = factsheet_xlsx::load_from_bytes(&buffer.into_inner()).unwrap_err();
    assert!(matches!(err, factsheet_xlsx::ReadError::NoSheets));
}
