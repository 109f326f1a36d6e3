//! Cross-document consistency checking.
//!
//! Fact sheets for different areas are published from one template, so their
//! textual structure — the *skeleton* — should match cell for cell. This
//! crate extracts skeletons, checks per-document conventions (sheet count and
//! naming) and reports where documents drift from a reference, excluding a
//! small set of cells that are known to vary.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use factsheet_model::{CellCoord, SheetGrid};
use serde::Serialize;

/// `(coordinate, trimmed text)` pairs of the non-numeric cells that make up a
/// document's fixed structure.
pub type Skeleton = BTreeMap<CellCoord, String>;

/// Tunables of the published document family.
#[derive(Clone, Debug)]
pub struct CheckOptions {
    /// Skeleton extraction starts at this row; everything above is the
    /// per-area title block.
    pub start_row: u32,
    /// Documents must carry exactly this many sheets.
    pub expected_sheet_count: usize,
    /// The last sheet (the one that is extracted) must end with this suffix.
    pub last_sheet_suffix: String,
    /// Cells excluded from comparison outright (known-variable footnotes).
    pub exception_cells: BTreeSet<CellCoord>,
    /// Text of the cell that closes the known-variable section.
    pub sentinel_text: String,
    /// First row of the known-variable section.
    pub variable_region_start_row: u32,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            start_row: 3,
            expected_sheet_count: 3,
            last_sheet_suffix: "e".to_string(),
            exception_cells: BTreeSet::from([CellCoord::new(198, 2)]), // B198
            sentinel_text: "Proportion of population of Chinese ethnicity (%)".to_string(),
            variable_region_start_row: 7,
        }
    }
}

/// A violated document convention.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConventionIssue {
    SheetCount { found: usize, expected: usize },
    LastSheetName { name: String, expected_suffix: String },
}

impl fmt::Display for ConventionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConventionIssue::SheetCount { found, expected } => {
                write!(f, "expected {expected} sheets, found {found}")
            }
            ConventionIssue::LastSheetName {
                name,
                expected_suffix,
            } => write!(
                f,
                "last sheet {name:?} does not end with {expected_suffix:?}"
            ),
        }
    }
}

/// How one cell differs between a candidate document and the reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    Differs,
    OnlyInCandidate,
    OnlyInReference,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CellMismatch {
    /// A1 coordinate of the cell.
    pub cell: String,
    pub kind: MismatchKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<String>,
}

impl fmt::Display for CellMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MismatchKind::Differs => write!(
                f,
                "cell {}: {:?} vs {:?}",
                self.cell,
                self.candidate.as_deref().unwrap_or(""),
                self.reference.as_deref().unwrap_or("")
            ),
            MismatchKind::OnlyInCandidate => write!(
                f,
                "cell {} only in candidate: {:?}",
                self.cell,
                self.candidate.as_deref().unwrap_or("")
            ),
            MismatchKind::OnlyInReference => write!(
                f,
                "cell {} only in reference: {:?}",
                self.cell,
                self.reference.as_deref().unwrap_or("")
            ),
        }
    }
}

/// Check the sheet-level conventions of one document.
pub fn check_conventions(sheet_names: &[String], options: &CheckOptions) -> Vec<ConventionIssue> {
    let mut issues = Vec::new();
    if sheet_names.len() != options.expected_sheet_count {
        issues.push(ConventionIssue::SheetCount {
            found: sheet_names.len(),
            expected: options.expected_sheet_count,
        });
    }
    if let Some(last) = sheet_names.last() {
        if !last.ends_with(&options.last_sheet_suffix) {
            issues.push(ConventionIssue::LastSheetName {
                name: last.clone(),
                expected_suffix: options.last_sheet_suffix.clone(),
            });
        }
    }
    issues
}

/// Extract the textual skeleton of a grid.
///
/// Text cells at or after `start_row` qualify when they contain at least one
/// alphabetic character (pure punctuation or digit runs are formatting
/// artifacts, not structure).
pub fn skeleton(grid: &SheetGrid, start_row: u32) -> Skeleton {
    let mut out = Skeleton::new();
    for (coord, cell) in grid.iter_cells() {
        if coord.row < start_row {
            continue;
        }
        let Some(text) = cell.value.as_text() else {
            continue;
        };
        if !text.chars().any(char::is_alphabetic) {
            continue;
        }
        out.insert(coord, text.trim().to_string());
    }
    out
}

/// The row holding `sentinel_text`, if the skeleton contains it.
fn sentinel_row(skeleton: &Skeleton, sentinel_text: &str) -> Option<u32> {
    skeleton
        .iter()
        .find(|(_, text)| text.as_str() == sentinel_text)
        .map(|(coord, _)| coord.row)
}

/// Compare a candidate skeleton against the reference.
///
/// Cells inside the known-variable section — rows from
/// `variable_region_start_row` through each document's own sentinel row — are
/// expected to differ between areas and are suppressed, as are the explicit
/// exception cells. A document without the sentinel gets no suppression: every
/// difference is reported.
pub fn compare_with_reference(
    reference: &Skeleton,
    candidate: &Skeleton,
    options: &CheckOptions,
) -> Vec<CellMismatch> {
    let ref_sentinel = sentinel_row(reference, &options.sentinel_text);
    let cand_sentinel = sentinel_row(candidate, &options.sentinel_text);

    let in_variable_region = |row: u32, sentinel: Option<u32>| -> bool {
        sentinel.is_some_and(|s| row >= options.variable_region_start_row && row <= s)
    };

    let mut coords: BTreeSet<&CellCoord> = reference.keys().collect();
    coords.extend(candidate.keys());

    let mut mismatches = Vec::new();
    for coord in coords {
        if options.exception_cells.contains(coord) {
            continue;
        }
        let reference_text = reference.get(coord);
        let candidate_text = candidate.get(coord);

        let (kind, suppressed) = match (reference_text, candidate_text) {
            (Some(r), Some(c)) if r == c => continue,
            (Some(_), Some(_)) => (
                MismatchKind::Differs,
                in_variable_region(coord.row, cand_sentinel),
            ),
            (None, Some(_)) => (
                MismatchKind::OnlyInCandidate,
                in_variable_region(coord.row, cand_sentinel),
            ),
            (Some(_), None) => (
                MismatchKind::OnlyInReference,
                in_variable_region(coord.row, ref_sentinel),
            ),
            (None, None) => continue,
        };
        if suppressed {
            continue;
        }

        mismatches.push(CellMismatch {
            cell: coord.to_a1(),
            kind,
            reference: reference_text.cloned(),
            candidate: candidate_text.cloned(),
        });
    }
    mismatches
}

/// Findings for one checked document.
#[derive(Clone, Debug, Serialize)]
pub struct DocumentReport {
    pub area: String,
    pub convention_issues: Vec<ConventionIssue>,
    pub mismatches: Vec<CellMismatch>,
}

impl DocumentReport {
    pub fn is_clean(&self) -> bool {
        self.convention_issues.is_empty() && self.mismatches.is_empty()
    }
}

/// Findings across a run of documents.
#[derive(Clone, Debug, Serialize)]
pub struct CheckReport {
    /// Area code of the document every other one is compared against.
    pub reference: String,
    pub documents: Vec<DocumentReport>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.documents.iter().all(DocumentReport::is_clean)
    }
}

/// Load every document and compare each against the first.
pub fn check_documents(paths: &[PathBuf], options: &CheckOptions) -> Result<CheckReport> {
    let mut documents = Vec::new();
    let mut reference: Option<(String, Skeleton)> = None;

    for path in paths {
        let doc = factsheet_xlsx::load_from_path(path)
            .with_context(|| format!("load document {}", path.display()))?;
        let convention_issues = check_conventions(&doc.sheet_names, options);
        let own = skeleton(&doc.grid, options.start_row);

        let mismatches = match &reference {
            Some((_, ref_skeleton)) => compare_with_reference(ref_skeleton, &own, options),
            None => {
                reference = Some((doc.area.to_string(), own));
                Vec::new()
            }
        };

        documents.push(DocumentReport {
            area: doc.area.to_string(),
            convention_issues,
            mismatches,
        });
    }

    let reference = reference.map(|(area, _)| area).unwrap_or_default();
    Ok(CheckReport {
        reference,
        documents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use factsheet_model::GridBuilder;
    use pretty_assertions::assert_eq;

    fn opts() -> CheckOptions {
        CheckOptions::default()
    }

    fn skel(pairs: &[(u32, u32, &str)]) -> Skeleton {
        pairs
            .iter()
            .map(|(r, c, t)| (CellCoord::new(*r, *c), t.to_string()))
            .collect()
    }

    #[test]
    fn conventions_flag_sheet_count_and_naming() {
        let names = vec!["a".to_string(), "b e".to_string()];
        let issues = check_conventions(&names, &opts());
        assert_eq!(
            issues,
            vec![ConventionIssue::SheetCount {
                found: 2,
                expected: 3
            }]
        );

        let names = vec!["a".to_string(), "b".to_string(), "c2".to_string()];
        let issues = check_conventions(&names, &opts());
        assert_eq!(
            issues,
            vec![ConventionIssue::LastSheetName {
                name: "c2".to_string(),
                expected_suffix: "e".to_string(),
            }]
        );
    }

    #[test]
    fn skeleton_starts_at_the_start_row_and_needs_letters() {
        let mut b = GridBuilder::new("s");
        b.set(1, 1, "title, excluded by row");
        b.set(3, 1, "  Population  ");
        b.set(4, 1, "(1)"); // no letters: not structure
        b.set(4, 2, 12.0); // numeric: not structure
        b.set(5, 2, "Male");
        let grid = b.finish();

        let s = skeleton(&grid, 3);
        assert_eq!(
            s,
            skel(&[(3, 1, "Population"), (5, 2, "Male")])
        );
    }

    #[test]
    fn identical_skeletons_produce_no_mismatches() {
        let a = skel(&[(3, 1, "Population"), (5, 2, "Male")]);
        assert_eq!(compare_with_reference(&a, &a.clone(), &opts()), vec![]);
    }

    #[test]
    fn differing_and_missing_cells_are_reported() {
        let reference = skel(&[(3, 1, "Population"), (5, 2, "Male"), (6, 2, "Female")]);
        let candidate = skel(&[(3, 1, "Population"), (5, 2, "Persons"), (9, 1, "Extra")]);

        let mismatches = compare_with_reference(&reference, &candidate, &opts());
        assert_eq!(
            mismatches,
            vec![
                CellMismatch {
                    cell: "B5".to_string(),
                    kind: MismatchKind::Differs,
                    reference: Some("Male".to_string()),
                    candidate: Some("Persons".to_string()),
                },
                CellMismatch {
                    cell: "B6".to_string(),
                    kind: MismatchKind::OnlyInReference,
                    reference: Some("Female".to_string()),
                    candidate: None,
                },
                CellMismatch {
                    cell: "A9".to_string(),
                    kind: MismatchKind::OnlyInCandidate,
                    reference: None,
                    candidate: Some("Extra".to_string()),
                },
            ]
        );
    }

    #[test]
    fn exception_cells_are_ignored() {
        let reference = skel(&[(198, 2, "Footnote about boats")]);
        let candidate = skel(&[(198, 2, "Footnote about planes")]);
        assert_eq!(
            compare_with_reference(&reference, &candidate, &opts()),
            vec![]
        );
    }

    #[test]
    fn variable_region_is_suppressed_up_to_the_sentinel() {
        let sentinel = opts().sentinel_text;
        let reference = skel(&[
            (3, 1, "Population"),
            (8, 1, "Ethnic item A"),
            (10, 1, &sentinel),
            (12, 1, "Households"),
        ]);
        let candidate = skel(&[
            (3, 1, "Population"),
            (8, 1, "Ethnic item B"),
            (9, 1, "Ethnic item C"),
            (10, 1, &sentinel),
            (12, 1, "Homes"),
        ]);

        let mismatches = compare_with_reference(&reference, &candidate, &opts());
        // Rows 8-9 sit between the region start (7) and the sentinel (10):
        // expected to vary. Row 12 is after the sentinel and must be reported.
        assert_eq!(
            mismatches,
            vec![CellMismatch {
                cell: "A12".to_string(),
                kind: MismatchKind::Differs,
                reference: Some("Households".to_string()),
                candidate: Some("Homes".to_string()),
            }]
        );
    }

    #[test]
    fn missing_sentinel_disables_suppression() {
        let reference = skel(&[(8, 1, "Ethnic item A")]);
        let candidate = skel(&[(8, 1, "Ethnic item B")]);

        let mismatches = compare_with_reference(&reference, &candidate, &opts());
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].cell, "A8");
    }
}
