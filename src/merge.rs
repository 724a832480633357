use crate::model::ExtractedTable;
use crate::options::CsvOptions;

/// All tables flattened into one positional schema:
/// `page, table_id, col_1..col_n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedOutput {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub table_count: usize,
    pub row_count: usize,
}

pub(crate) fn merge_tables(tables: &[ExtractedTable]) -> MergedOutput {
    let width = tables
        .iter()
        .map(|table| table.grid.column_count())
        .max()
        .unwrap_or(0);

    let mut headers = vec!["page".to_string(), "table_id".to_string()];
    headers.extend((1..=width).map(|index| format!("col_{index}")));

    let mut rows = Vec::new();
    for table in tables {
        for data_row in &table.grid.data {
            let mut row = Vec::with_capacity(width + 2);
            row.push(table.page.to_string());
            row.push(table.table_id.to_string());
            row.extend(data_row.iter().cloned());
            row.resize(width + 2, String::new());
            rows.push(row);
        }
    }

    MergedOutput {
        headers,
        row_count: rows.len(),
        table_count: tables.len(),
        rows,
    }
}

pub(crate) fn apply_output_column_filters(
    merged: MergedOutput,
    options: &CsvOptions,
) -> MergedOutput {
    if !options.no_page && !options.no_table {
        return merged;
    }

    let keep_indices = merged
        .headers
        .iter()
        .enumerate()
        .filter_map(|(index, header)| {
            if options.no_page && header == "page" {
                return None;
            }
            if options.no_table && header == "table_id" {
                return None;
            }
            Some(index)
        })
        .collect::<Vec<_>>();

    let headers = keep_indices
        .iter()
        .map(|&index| merged.headers[index].clone())
        .collect::<Vec<_>>();
    let rows = merged
        .rows
        .iter()
        .map(|row| {
            keep_indices
                .iter()
                .filter_map(|&index| row.get(index).cloned())
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    MergedOutput {
        headers,
        rows,
        row_count: merged.row_count,
        table_count: merged.table_count,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{apply_output_column_filters, merge_tables};
    use crate::model::{ExtractedTable, TableGrid, TableOrigin};
    use crate::options::CsvOptions;

    fn table(page: u32, table_id: usize, rows: &[&[&str]]) -> ExtractedTable {
        ExtractedTable {
            page,
            table_id,
            origin: TableOrigin::Detected,
            confidence: 1.0,
            grid: TableGrid::from_rows(
                rows.iter()
                    .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
                    .collect(),
            ),
        }
    }

    #[test]
    fn merges_and_pads_rows_to_global_schema() {
        let tables = vec![table(1, 1, &[&["a", "b"]]), table(2, 2, &[&["c"]])];

        let merged = merge_tables(&tables);
        assert_eq!(merged.headers, vec!["page", "table_id", "col_1", "col_2"]);
        assert_eq!(merged.rows[1], vec!["2", "2", "c", ""]);
        assert_eq!(merged.table_count, 2);
    }

    #[test]
    fn drops_page_and_table_columns() {
        let merged = merge_tables(&[table(1, 1, &[&["x"]])]);
        let options = CsvOptions {
            no_page: true,
            no_table: true,
            ..CsvOptions::default()
        };

        let filtered = apply_output_column_filters(merged, &options);
        assert_eq!(filtered.headers, vec!["col_1"]);
        assert_eq!(filtered.rows[0], vec!["x"]);
    }
}
