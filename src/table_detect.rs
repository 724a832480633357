use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::grid::{assign_columns, cluster_rows, region_members};
use crate::model::{PageDetections, TableGrid, TableOrigin, TableRegion, TextFragment};
use crate::options::ExtractOptions;
use crate::warning::{ExtractWarning, WarningCode};

pub(crate) const LOW_CONFIDENCE_THRESHOLD: f32 = 0.60;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DetectedTable {
    pub page: u32,
    pub origin: TableOrigin,
    pub grid: TableGrid,
    pub confidence: f32,
}

fn modal_width(rows: &[Vec<TextFragment>]) -> usize {
    let mut freq = HashMap::new();
    for width in rows.iter().map(Vec::len) {
        *freq.entry(width).or_insert(0_usize) += 1;
    }

    freq.into_iter()
        .max_by_key(|(width, count)| (*count, *width))
        .map_or(0, |(width, _)| width)
}

/// Row-width consistency blended with mean OCR confidence, computed on the
/// clustered rows before padding.
fn table_confidence(rows: &[Vec<TextFragment>]) -> f32 {
    let modal = modal_width(rows);
    if modal == 0 {
        return 0.0;
    }

    let consistent =
        rows.iter().filter(|row| row.len() == modal).count() as f32 / rows.len() as f32;
    let max_width = rows.iter().map(Vec::len).max().unwrap_or(modal);
    let min_width = rows.iter().map(Vec::len).min().unwrap_or(modal);
    let uniformity = 1.0 - ((max_width - min_width) as f32 / max_width as f32);
    let layout = consistent * 0.75 + uniformity * 0.25;

    let fragments = rows.iter().flatten().collect::<Vec<_>>();
    let mean_confidence = fragments
        .iter()
        .map(|fragment| fragment.confidence.clamp(0.0, 1.0))
        .sum::<f32>()
        / fragments.len() as f32;

    (layout * 0.75 + mean_confidence * 0.25).clamp(0.0, 1.0)
}

fn page_regions(
    page: &PageDetections,
    options: &ExtractOptions,
    warnings: &mut Vec<ExtractWarning>,
) -> Vec<(TableRegion, TableOrigin)> {
    let mut regions = Vec::new();
    for layout in page.regions.iter().filter(|region| region.is_table()) {
        match TableRegion::from_box(&layout.bbox) {
            Ok(region) => regions.push((region, TableOrigin::Detected)),
            Err(error) => {
                warn!(page = page.page_number, %error, "skipping malformed table region");
                warnings.push(
                    ExtractWarning::new(WarningCode::MalformedRegion, error.to_string())
                        .with_page(page.page_number),
                );
            }
        }
    }

    if !regions.is_empty() {
        return regions;
    }

    let manual = options
        .areas
        .iter()
        .filter(|area| area.page == page.page_number)
        .filter_map(|area| TableRegion::from_box(&area.bbox()).ok())
        .map(|region| (region, TableOrigin::ManualArea))
        .collect::<Vec<_>>();
    if !manual.is_empty() {
        warnings.push(
            ExtractWarning::new(
                WarningCode::AreaFallback,
                "no table region detected; using manual table areas",
            )
            .with_page(page.page_number),
        );
    }
    manual
}

fn detect_tables_in_page(
    page: &PageDetections,
    options: &ExtractOptions,
    warnings: &mut Vec<ExtractWarning>,
) -> Vec<DetectedTable> {
    let mut tables = Vec::new();

    for (region, origin) in page_regions(page, options, warnings) {
        let members = region_members(&region, &page.fragments, options.grid.min_confidence);
        let threshold = options.grid.row_threshold_ratio * region.height();
        let rows = cluster_rows(members, threshold, options.grid.row_strategy);

        if rows.is_empty() {
            warn!(
                page = page.page_number,
                region = ?region,
                "no text fragments inside table region"
            );
            warnings.push(
                ExtractWarning::new(
                    WarningCode::EmptyRegion,
                    "no text fragments inside table region",
                )
                .with_page(page.page_number),
            );
            continue;
        }

        let confidence = table_confidence(&rows);
        let grid = assign_columns(rows);
        debug!(
            page = page.page_number,
            rows = grid.row_count(),
            columns = grid.column_count(),
            confidence,
            "detected table"
        );

        tables.push(DetectedTable {
            page: page.page_number,
            origin,
            grid,
            confidence,
        });
    }

    tables
}

pub(crate) fn detect_tables(
    pages: &[PageDetections],
    options: &ExtractOptions,
    warnings: &mut Vec<ExtractWarning>,
) -> Vec<DetectedTable> {
    let selected = pages
        .iter()
        .filter(|page| {
            options
                .pages
                .as_ref()
                .is_none_or(|selection| selection.contains(page.page_number))
        })
        .collect::<Vec<_>>();

    let present = selected
        .iter()
        .map(|page| page.page_number)
        .collect::<BTreeSet<_>>();
    let area_pages = options
        .areas
        .iter()
        .map(|area| area.page)
        .collect::<BTreeSet<_>>();
    for missing in area_pages.difference(&present) {
        warnings.push(
            ExtractWarning::new(
                WarningCode::AreaFallback,
                "manual area page is not present in selected pages",
            )
            .with_page(*missing),
        );
    }

    let mut tables = Vec::new();
    for page in selected {
        tables.extend(detect_tables_in_page(page, options, warnings));
    }
    tables
}
