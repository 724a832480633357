//! Overlaying fill records onto extracted grids.
//!
//! Record keys are matched against grid column keys. Keys a grid does not
//! have are ignored without error, and grids with no rows or no columns are
//! returned untouched.

use tracing::debug;

use crate::model::{FillRecord, TableGrid};
use crate::options::FillMode;

fn overwrite_row(columns: &[String], row: &mut [String], record: &FillRecord) {
    for (column, cell) in columns.iter().zip(row.iter_mut()) {
        if let Some(value) = record.get(column) {
            cell.clone_from(value);
        }
    }
}

fn shares_column(grid: &TableGrid, record: &FillRecord) -> bool {
    record.keys().any(|key| grid.column_index(key).is_some())
}

fn fill_positional<'a>(
    mut grid: TableGrid,
    records: impl Iterator<Item = &'a FillRecord>,
) -> TableGrid {
    for (index, record) in records.enumerate() {
        if let Some(row) = grid.data.get_mut(index) {
            overwrite_row(&grid.columns, row, record);
        } else {
            let row = grid.row_from_record(record);
            grid.data.push(row);
        }
    }
    grid
}

fn fill_by_name(mut grid: TableGrid, records: &[FillRecord], key_column: &str) -> TableGrid {
    let Some(key_index) = grid.column_index(key_column) else {
        debug!(key_column, "grid has no key column; leaving it unchanged");
        return grid;
    };

    for record in records {
        if !shares_column(&grid, record) {
            continue;
        }

        let target = record
            .get(key_column)
            .and_then(|key| grid.data.iter().position(|row| row.get(key_index) == Some(key)));

        match target {
            Some(index) => overwrite_row(&grid.columns, &mut grid.data[index], record),
            None => {
                let row = grid.row_from_record(record);
                grid.data.push(row);
            }
        }
    }
    grid
}

/// Applies `records` to a single grid.
#[must_use]
pub fn fill_grid(grid: TableGrid, records: &[FillRecord], mode: &FillMode) -> TableGrid {
    if grid.is_empty() || records.is_empty() {
        return grid;
    }

    let rows_before = grid.row_count();
    let filled = match mode {
        FillMode::Positional => fill_positional(grid, records.iter()),
        FillMode::KeyIntersect => {
            let applicable = records
                .iter()
                .filter(|record| shares_column(&grid, record))
                .collect::<Vec<_>>();
            fill_positional(grid, applicable.into_iter())
        }
        FillMode::ByName { key_column } => fill_by_name(grid, records, key_column),
    };

    debug!(
        rows_before,
        rows_after = filled.row_count(),
        records = records.len(),
        "filled table grid"
    );
    filled
}

/// Applies the same record list to every grid.
#[must_use]
pub fn fill_tables(
    grids: Vec<TableGrid>,
    records: &[FillRecord],
    mode: &FillMode,
) -> Vec<TableGrid> {
    grids
        .into_iter()
        .map(|grid| fill_grid(grid, records, mode))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{fill_grid, fill_tables};
    use crate::model::{FillRecord, TableGrid};
    use crate::options::FillMode;

    fn record(pairs: &[(&str, &str)]) -> FillRecord {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    fn people() -> TableGrid {
        TableGrid::from_parts(
            vec!["Name".to_string(), "Age".to_string()],
            vec![vec!["Alice".to_string(), String::new()]],
        )
    }

    fn rows(grid: &TableGrid) -> Vec<Vec<&str>> {
        grid.data
            .iter()
            .map(|row| row.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn positional_fill_updates_then_appends() {
        let records = vec![
            record(&[("Name", "Alice"), ("Age", "30")]),
            record(&[("Name", "Bob"), ("Age", "25")]),
        ];
        let filled = fill_grid(people(), &records, &FillMode::Positional);
        assert_eq!(rows(&filled), vec![vec!["Alice", "30"], vec!["Bob", "25"]]);
    }

    #[test]
    fn empty_record_list_is_a_no_op() {
        assert_eq!(fill_grid(people(), &[], &FillMode::Positional), people());
    }

    #[test]
    fn appends_one_row_per_record_beyond_existing_rows() {
        let records = (0..5)
            .map(|index| {
                let age = index.to_string();
                record(&[("Age", age.as_str())])
            })
            .collect::<Vec<_>>();
        let filled = fill_grid(people(), &records, &FillMode::Positional);
        let existing = people().row_count();
        assert_eq!(filled.row_count() - existing, records.len() - existing);
        assert_eq!(filled.data[0], vec!["Alice", "0"]);
        assert_eq!(filled.data[4], vec!["", "4"]);
    }

    #[test]
    fn positional_fill_ignores_unknown_keys() {
        let records = vec![record(&[("Salary", "100")])];
        let filled = fill_grid(people(), &records, &FillMode::Positional);
        assert_eq!(filled, people());
    }

    #[test]
    fn empty_grid_passes_through() {
        let records = vec![record(&[("Col_0", "x")])];
        assert_eq!(
            fill_grid(TableGrid::default(), &records, &FillMode::Positional),
            TableGrid::default()
        );
    }

    // Positional mode applies record i to row i of every grid, even when
    // the record's keys belong to another grid.
    #[test]
    fn positional_fill_spans_grids_by_index() {
        let scores = TableGrid::from_parts(
            vec!["Subject".to_string(), "Score".to_string()],
            vec![vec!["Math".to_string(), String::new()]],
        );
        let records = vec![
            record(&[("Name", "Alice"), ("Age", "30")]),
            record(&[("Subject", "Art"), ("Score", "B")]),
        ];

        let filled = fill_tables(
            vec![people(), scores.clone()],
            &records,
            &FillMode::Positional,
        );
        assert_eq!(rows(&filled[0]), vec![vec!["Alice", "30"], vec!["", ""]]);
        assert_eq!(rows(&filled[1]), vec![vec!["Math", ""], vec!["Art", "B"]]);

        let filled = fill_tables(vec![people(), scores], &records, &FillMode::KeyIntersect);
        assert_eq!(rows(&filled[0]), vec![vec!["Alice", "30"]]);
        assert_eq!(rows(&filled[1]), vec![vec!["Art", "B"]]);
    }

    #[test]
    fn by_name_matches_rows_on_key_column() {
        let grid = TableGrid::from_parts(
            vec!["Name".to_string(), "Age".to_string()],
            vec![
                vec!["Bob".to_string(), String::new()],
                vec!["Alice".to_string(), String::new()],
            ],
        );
        let records = vec![
            record(&[("Name", "Alice"), ("Age", "30")]),
            record(&[("Name", "Carol"), ("Age", "41")]),
            record(&[("Age", "7")]),
            record(&[("Salary", "100")]),
        ];
        let mode = FillMode::ByName {
            key_column: "Name".to_string(),
        };

        let filled = fill_grid(grid, &records, &mode);
        assert_eq!(
            rows(&filled),
            vec![
                vec!["Bob", ""],
                vec!["Alice", "30"],
                vec!["Carol", "41"],
                vec!["", "7"],
            ]
        );
    }

    #[test]
    fn by_name_tolerates_short_rows() {
        let mode = FillMode::ByName {
            key_column: "Age".to_string(),
        };
        let records = vec![record(&[("Name", "Bob"), ("Age", "25")])];

        let parsed: TableGrid =
            serde_json::from_str(r#"{"columns":["Name","Age"],"data":[["Alice"]]}"#)
                .expect("grid should parse");
        let filled = fill_grid(parsed, &records, &mode);
        assert_eq!(rows(&filled), vec![vec!["Alice", ""], vec!["Bob", "25"]]);

        let ragged = TableGrid {
            columns: vec!["Name".to_string(), "Age".to_string()],
            data: vec![vec!["Alice".to_string()]],
        };
        let filled = fill_grid(ragged, &records, &mode);
        assert_eq!(rows(&filled), vec![vec!["Alice"], vec!["Bob", "25"]]);
    }

    #[test]
    fn by_name_without_key_column_leaves_grid_unchanged() {
        let mode = FillMode::ByName {
            key_column: "Id".to_string(),
        };
        let records = vec![record(&[("Name", "Zed")])];
        assert_eq!(fill_grid(people(), &records, &mode), people());
    }
}
