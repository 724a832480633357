//! Table grid reconstruction from OCR fragments.
//!
//! A grid is built in three steps: fragments whose centroid falls inside the
//! region are kept and moved into region-local coordinates, they are grouped
//! into rows by vertical centroid, and each row is ordered left to right to
//! give positional `Col_i` keys.

use tracing::debug;

use crate::model::{TableGrid, TableRegion, TextFragment};
use crate::options::{GridOptions, RowStrategy};

/// Fragments of `fragments` inside `region`, translated so the region's
/// top-left corner is the origin. Detector order is preserved.
pub(crate) fn region_members(
    region: &TableRegion,
    fragments: &[TextFragment],
    min_confidence: f32,
) -> Vec<TextFragment> {
    fragments
        .iter()
        .filter(|fragment| fragment.confidence >= min_confidence)
        .filter(|fragment| region.contains(fragment.centroid()))
        .map(|fragment| TextFragment {
            text: fragment.text.clone(),
            quad: fragment.quad.translated(region.x1, region.y1),
            confidence: fragment.confidence,
        })
        .collect()
}

/// Greedy row grouping. A fragment opens a new row when its vertical
/// centroid is more than `threshold` away from the first fragment of the
/// current row.
pub(crate) fn cluster_rows(
    mut members: Vec<TextFragment>,
    threshold: f32,
    strategy: RowStrategy,
) -> Vec<Vec<TextFragment>> {
    if strategy == RowStrategy::SortedByY {
        members.sort_by(|a, b| a.centroid().1.total_cmp(&b.centroid().1));
    }

    let mut rows = Vec::new();
    let mut current: Vec<TextFragment> = Vec::new();
    let mut anchor = 0.0_f32;

    for fragment in members {
        let center_y = fragment.centroid().1;
        if current.is_empty() {
            anchor = center_y;
        } else if (center_y - anchor).abs() > threshold {
            rows.push(std::mem::take(&mut current));
            anchor = center_y;
        }
        current.push(fragment);
    }

    if !current.is_empty() {
        rows.push(current);
    }

    rows
}

pub(crate) fn assign_columns(rows: Vec<Vec<TextFragment>>) -> TableGrid {
    let cells = rows
        .into_iter()
        .map(|mut row| {
            row.sort_by(|a, b| a.quad.left().total_cmp(&b.quad.left()));
            row.into_iter()
                .map(|fragment| fragment.text)
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    TableGrid::from_rows(cells)
}

/// Reconstructs the grid for one region. The region is trusted; callers are
/// expected to have validated it.
#[must_use]
pub fn build_grid(
    region: &TableRegion,
    fragments: &[TextFragment],
    options: &GridOptions,
) -> TableGrid {
    let members = region_members(region, fragments, options.min_confidence);
    if members.is_empty() {
        return TableGrid::default();
    }

    let threshold = options.row_threshold_ratio * region.height();
    let rows = cluster_rows(members, threshold, options.row_strategy);
    let grid = assign_columns(rows);

    debug!(
        rows = grid.row_count(),
        columns = grid.column_count(),
        threshold,
        "built table grid"
    );
    grid
}
