use factsheet_model::{AreaCode, LabelRecord, SheetGrid};

use crate::{ExtractError, ExtractOptions, LabelResolver};

/// Scan `grid` in row-major order and emit one labeled record per numeric
/// cell.
///
/// Two structural invariants are enforced before any label is computed:
/// numeric data may never appear in the grid's final row, and only the
/// permitted data columns may hold numbers. Either violation aborts the whole
/// document — skipping the cell would silently drop or mislabel statistics.
///
/// Output order is deterministic: extracting the same grid twice yields the
/// identical sequence.
pub fn extract_records(
    grid: &SheetGrid,
    area: &AreaCode,
    options: &ExtractOptions,
) -> Result<Vec<LabelRecord>, ExtractError> {
    let resolver = LabelResolver::new(grid, options);
    let last_row = grid.n_rows();
    let mut records = Vec::new();

    for (coord, cell) in grid.iter_cells() {
        let Some(value) = cell.value.as_number() else {
            continue;
        };
        if coord.row == last_row {
            return Err(ExtractError::NumericInLastRow { coord });
        }
        if !options.data_columns.contains(&coord.col) {
            return Err(ExtractError::ForbiddenColumn { coord });
        }

        let labels = resolver.resolve(coord.row, coord.col)?;
        records.push(LabelRecord {
            area: area.as_str().to_string(),
            table: labels.table,
            row: labels.row,
            column: labels.column,
            value,
        });
    }

    Ok(records)
}
