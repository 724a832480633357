use std::collections::HashSet;

use crate::model::TableGrid;
use crate::options::HeaderMode;
use crate::warning::{ExtractWarning, WarningCode};

const HEADER_CONFIDENCE_THRESHOLD: f32 = 0.55;

fn is_numeric(value: &str) -> bool {
    let trimmed = value.trim().replace(',', "");
    !trimmed.is_empty() && trimmed.parse::<f64>().is_ok()
}

fn non_numeric_ratio(cells: &[String]) -> f32 {
    let filled = cells
        .iter()
        .filter(|cell| !cell.trim().is_empty())
        .collect::<Vec<_>>();
    if filled.is_empty() {
        return 0.0;
    }

    let non_numeric = filled.iter().filter(|cell| !is_numeric(cell)).count();
    non_numeric as f32 / filled.len() as f32
}

pub(crate) fn infer_has_header(rows: &[Vec<String>]) -> (bool, f32) {
    if rows.is_empty() {
        return (false, 0.0);
    }

    let first = non_numeric_ratio(&rows[0]);
    let second = rows.get(1).map_or(0.0, |row| non_numeric_ratio(row));

    let confidence = (first * 0.6 + (1.0 - second) * 0.4).clamp(0.0, 1.0);
    let has_header = first >= 0.6 && second <= 0.7;
    (has_header, confidence)
}

/// Turns the first row into column names. Blank or repeated names fall back
/// to the positional key of their column, suffixed when a real header
/// already took it.
pub(crate) fn promote_header(mut grid: TableGrid) -> TableGrid {
    if grid.data.is_empty() {
        return grid;
    }

    let header = grid.data.remove(0);
    let mut seen = HashSet::new();
    grid.columns = header
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let name = name.trim().to_string();
            if !name.is_empty() && seen.insert(name.clone()) {
                return name;
            }

            let base = TableGrid::column_key(index);
            let mut key = base.clone();
            let mut suffix = 1;
            while !seen.insert(key.clone()) {
                suffix += 1;
                key = format!("{base}_{suffix}");
            }
            key
        })
        .collect();
    grid
}

pub(crate) fn apply_header_mode(
    grid: TableGrid,
    mode: HeaderMode,
    warnings: &mut Vec<ExtractWarning>,
    page: u32,
    table_id: usize,
) -> TableGrid {
    if grid.is_empty() {
        return grid;
    }

    match mode {
        HeaderMode::HasHeader => promote_header(grid),
        HeaderMode::NoHeader => grid,
        HeaderMode::AutoDetect => {
            let (has_header, confidence) = infer_has_header(&grid.data);
            if has_header && confidence >= HEADER_CONFIDENCE_THRESHOLD {
                return promote_header(grid);
            }

            if confidence < HEADER_CONFIDENCE_THRESHOLD {
                warnings.push(
                    ExtractWarning::new(
                        WarningCode::HeaderInferenceLowConfidence,
                        "header inference confidence is low; keeping the first row as data",
                    )
                    .with_page(page)
                    .with_table_id(table_id)
                    .with_confidence(confidence),
                );
            }

            grid
        }
    }
}
