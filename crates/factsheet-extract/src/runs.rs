use std::collections::BTreeSet;

use factsheet_model::{Color, SheetGrid};

use crate::ExtractError;

/// A contiguous same-colored vertical run in one column.
///
/// Both `start` and `end` are the *terminating* rows — the nearest rows whose
/// cells break the anchor's fill — so the run's content is exactly the rows in
/// `start + 1 .. end`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ColorRun {
    pub start: u32,
    pub end: u32,
}

impl ColorRun {
    /// The rows inside the run, boundaries excluded.
    pub fn rows(&self) -> impl Iterator<Item = u32> {
        self.start + 1..self.end
    }
}

/// A marker-colored section boundary block.
///
/// The range is `(start, end]`: `start` is the nearest non-marker row below
/// the block, `end` the block's last row, so the block's content is the rows
/// in `start + 1 ..= end`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MarkerBlock {
    pub start: u32,
    pub end: u32,
}

impl MarkerBlock {
    /// The rows inside the block.
    pub fn rows(&self) -> impl Iterator<Item = u32> {
        self.start + 1..=self.end
    }
}

/// True when the cell holds a value *and* shares `fill`.
///
/// Valueless cells still carry formatting, but their color must never count as
/// a match; boundary decisions only trust cells with content.
pub(crate) fn same_fill(grid: &SheetGrid, row: u32, col: u32, fill: Option<Color>) -> bool {
    grid.has_value(row, col) && grid.fill(row, col) == fill
}

/// True when the cell holds a value *and* differs from `fill`.
pub(crate) fn diff_fill(grid: &SheetGrid, row: u32, col: u32, fill: Option<Color>) -> bool {
    grid.has_value(row, col) && grid.fill(row, col) != fill
}

/// Locate the boundaries of the color run containing `anchor_row` in `col`.
///
/// Scanning upward, the run begins immediately after the nearest row with a
/// value and a different fill; scanning downward, it ends immediately before
/// the nearest row that does not positively share the anchor's fill. A run
/// with no boundary in either direction means the layout is not the one this
/// algorithm understands, and fails rather than defaulting to the grid edge.
///
/// Boundaries depend on fill color only. The weight-restricted variant used
/// for row labels keeps the same boundaries and applies its bold filter when
/// collecting the run's member cells.
pub fn find_run(grid: &SheetGrid, col: u32, anchor_row: u32) -> Result<ColorRun, ExtractError> {
    let anchor_fill = grid.fill(anchor_row, col);

    let start = (1..anchor_row)
        .rev()
        .find(|&r| diff_fill(grid, r, col, anchor_fill))
        .ok_or(ExtractError::RunStartNotFound {
            row: anchor_row,
            col,
        })?;

    let end = (anchor_row + 1..=grid.n_rows())
        .find(|&r| !same_fill(grid, r, col, anchor_fill))
        .ok_or(ExtractError::RunEndNotFound {
            row: anchor_row,
            col,
        })?;

    Ok(ColorRun { start, end })
}

/// Locate the marker-colored label block nearest above `target_row` in `col`.
///
/// Marker rows can appear both as a table header and, separately, as a footer
/// annotation sitting directly above a later data block. When the candidate
/// set ends at `target_row - 1` the trailing block is such a footer: it is
/// cropped away (everything from the nearest non-candidate row upward stays)
/// so only the true header block remains.
pub fn find_marker_block(
    grid: &SheetGrid,
    col: u32,
    target_row: u32,
    marker: Color,
) -> Result<MarkerBlock, ExtractError> {
    let not_found = ExtractError::MarkerBlockNotFound {
        row: target_row,
        col,
    };

    let mut candidates: BTreeSet<u32> = (1..target_row)
        .filter(|&r| same_fill(grid, r, col, Some(marker)))
        .collect();

    if target_row >= 2 && candidates.contains(&(target_row - 1)) {
        // Footer: drop the trailing candidate block. The observed convention
        // has exactly one footer block here; a candidate set that empties out
        // after the crop is reported, not guessed at.
        let cut = (1..target_row - 1)
            .rev()
            .find(|r| !candidates.contains(r))
            .ok_or(not_found.clone())?;
        candidates.retain(|&r| r < cut);
    }

    let end = candidates.iter().next_back().copied().ok_or(not_found.clone())?;
    let start = (1..end)
        .rev()
        .find(|r| !candidates.contains(r))
        .ok_or(not_found)?;

    Ok(MarkerBlock { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;
    use factsheet_model::{CellStyle, GridBuilder};
    use pretty_assertions::assert_eq;

    const BLUE: Color = Color::new_argb(0xFF0000FF);
    const GREEN: Color = Color::new_argb(0xFFCCFFCC);

    fn filled(color: Color) -> CellStyle {
        CellStyle {
            fill: Some(color),
            ..CellStyle::default()
        }
    }

    /// Column 1: title (no fill), three blue rows, then an unfilled footer.
    fn run_grid() -> factsheet_model::SheetGrid {
        let mut b = GridBuilder::new("s");
        b.set(1, 1, "Title");
        b.set_styled(2, 1, "a", filled(BLUE));
        b.set_styled(3, 1, "b", filled(BLUE));
        b.set_styled(4, 1, "c", filled(BLUE));
        b.set(5, 1, "tail");
        b.reserve(6, 2);
        b.finish()
    }

    #[test]
    fn run_boundaries_are_exclusive() {
        let grid = run_grid();
        let run = find_run(&grid, 1, 3).unwrap();
        assert_eq!(run, ColorRun { start: 1, end: 5 });
        assert_eq!(run.rows().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn valueless_cells_do_not_terminate_the_upward_scan() {
        let mut b = GridBuilder::new("s");
        b.set(1, 1, "Title");
        // Row 2 is blank but carries the same fill as the run; row 3 is blank
        // with no fill at all. Neither may act as a boundary.
        b.set_styled(2, 1, factsheet_model::CellValue::Empty, filled(BLUE));
        b.set_styled(4, 1, "a", filled(BLUE));
        b.set_styled(5, 1, "b", filled(BLUE));
        b.set(6, 1, "tail");
        b.reserve(7, 1);
        let grid = b.finish();

        let run = find_run(&grid, 1, 4).unwrap();
        assert_eq!(run, ColorRun { start: 1, end: 6 });
    }

    #[test]
    fn valueless_cells_terminate_the_downward_scan() {
        let mut b = GridBuilder::new("s");
        b.set(1, 1, "Title");
        b.set_styled(2, 1, "a", filled(BLUE));
        // Row 3 has the run's fill but no value: the run ends there.
        b.set_styled(3, 1, factsheet_model::CellValue::Empty, filled(BLUE));
        b.set_styled(4, 1, "b", filled(BLUE));
        b.set(5, 1, "tail");
        let grid = b.finish();

        let run = find_run(&grid, 1, 2).unwrap();
        assert_eq!(run, ColorRun { start: 1, end: 3 });
    }

    #[test]
    fn missing_boundaries_fail_loudly() {
        let mut b = GridBuilder::new("s");
        b.set_styled(1, 1, "a", filled(BLUE));
        b.set_styled(2, 1, "b", filled(BLUE));
        b.set_styled(3, 1, "c", filled(BLUE));
        let grid = b.finish();

        assert_eq!(
            find_run(&grid, 1, 2),
            Err(ExtractError::RunStartNotFound { row: 2, col: 1 })
        );

        let mut b = GridBuilder::new("s");
        b.set(1, 1, "Title");
        b.set_styled(2, 1, "a", filled(BLUE));
        b.set_styled(3, 1, "b", filled(BLUE));
        let grid = b.finish();

        assert_eq!(
            find_run(&grid, 1, 2),
            Err(ExtractError::RunEndNotFound { row: 2, col: 1 })
        );
    }

    #[test]
    fn marker_block_is_start_exclusive_end_inclusive() {
        let mut b = GridBuilder::new("s");
        b.set(1, 1, "Title");
        b.set_styled(2, 1, "Table", filled(GREEN));
        b.set_styled(3, 1, "header", filled(GREEN));
        b.set(4, 1, "row label");
        b.set(5, 3, 1.0);
        let grid = b.finish();

        let block = find_marker_block(&grid, 1, 5, GREEN).unwrap();
        assert_eq!(block, MarkerBlock { start: 1, end: 3 });
        assert_eq!(block.rows().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn footer_directly_above_target_is_cropped() {
        let mut b = GridBuilder::new("s");
        b.set(1, 1, "Title");
        b.set_styled(2, 1, "Table", filled(GREEN));
        b.set(3, 1, "first block");
        b.set_styled(4, 1, "footnote", filled(GREEN));
        // Target row 5 sits directly below the green footnote: the block at
        // row 4 must not be mistaken for the header at row 2.
        b.set(5, 3, 2.0);
        let grid = b.finish();

        let block = find_marker_block(&grid, 1, 5, GREEN).unwrap();
        assert_eq!(block, MarkerBlock { start: 1, end: 2 });
    }

    #[test]
    fn missing_marker_block_fails_loudly() {
        let mut b = GridBuilder::new("s");
        b.set(1, 1, "Title");
        b.set(2, 1, "no markers here");
        let grid = b.finish();

        assert_eq!(
            find_marker_block(&grid, 1, 2, GREEN),
            Err(ExtractError::MarkerBlockNotFound { row: 2, col: 1 })
        );
    }

    #[test]
    fn footer_with_no_header_above_fails_loudly() {
        let mut b = GridBuilder::new("s");
        b.set_styled(1, 1, "footnote", filled(GREEN));
        b.set(2, 3, 2.0);
        let grid = b.finish();

        // Row 1 is a footer candidate with nothing below it to crop against.
        assert_eq!(
            find_marker_block(&grid, 1, 2, GREEN),
            Err(ExtractError::MarkerBlockNotFound { row: 2, col: 1 })
        );
    }
}
