mod api;
mod csv_out;
mod detector;
mod error;
mod fill;
mod grid;
mod header;
mod merge;
mod model;
mod options;
mod pipeline;
mod table_detect;
mod warning;

use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::csv_out::{write_csv, write_csv_to_string};
use crate::header::apply_header_mode;
use crate::merge::{apply_output_column_filters, merge_tables};
use crate::table_detect::{DetectedTable, LOW_CONFIDENCE_THRESHOLD, detect_tables};

pub use api::{
    ErrorResponse, TableFillRequest, TableFillResponse, handle_table_fill,
};
pub use csv_out::grid_to_csv_string;
pub use detector::{ModelSlot, RecordedDetector, RegionDetector, TextDetector};
pub use error::PipelineError;
pub use fill::{fill_grid, fill_tables};
pub use grid::build_grid;
pub use merge::MergedOutput;
pub use model::{
    ExtractedTable, FillRecord, LayoutRegion, PageDetections, Quad, TABLE_LABEL, TableGrid,
    TableOrigin, TableRegion, TextFragment,
};
pub use options::{
    CsvOptions, DEFAULT_ROW_THRESHOLD_RATIO, ExtractOptions, FillMode, GridOptions, HeaderMode,
    PageSelection, QualityMode, RowStrategy, TableArea,
};
pub use pipeline::DocumentProcessor;
pub use warning::{ExtractWarning, WarningCode};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionReport {
    pub tables: Vec<ExtractedTable>,
    pub warnings: Vec<ExtractWarning>,
    pub table_count: usize,
    pub row_count: usize,
}

impl ExtractionReport {
    fn new(tables: Vec<ExtractedTable>, warnings: Vec<ExtractWarning>) -> Self {
        let row_count = tables.iter().map(|table| table.grid.row_count()).sum();
        Self {
            table_count: tables.len(),
            row_count,
            tables,
            warnings,
        }
    }

    #[must_use]
    pub fn grids(&self) -> Vec<TableGrid> {
        self.tables.iter().map(|table| table.grid.clone()).collect()
    }

    /// Applies fill records to every extracted table.
    #[must_use]
    pub fn fill(self, records: &[FillRecord], mode: &FillMode) -> Self {
        let tables = self
            .tables
            .into_iter()
            .map(|table| ExtractedTable {
                grid: fill_grid(table.grid, records, mode),
                ..table
            })
            .collect();
        Self::new(tables, self.warnings)
    }
}

fn apply_quality_mode(
    tables: Vec<DetectedTable>,
    options: &ExtractOptions,
    warnings: &mut Vec<ExtractWarning>,
) -> Result<Vec<DetectedTable>, PipelineError> {
    let mut out = Vec::new();

    for table in tables {
        if table.confidence >= LOW_CONFIDENCE_THRESHOLD {
            out.push(table);
            continue;
        }

        match options.quality_mode {
            QualityMode::BestEffort => {
                warnings.push(
                    ExtractWarning::new(
                        WarningCode::LowConfidence,
                        "table confidence is low; kept in best-effort mode",
                    )
                    .with_page(table.page)
                    .with_confidence(table.confidence),
                );
                out.push(table);
            }
            QualityMode::Strict => {
                return Err(PipelineError::AmbiguousTable {
                    page: table.page,
                    confidence: table.confidence,
                });
            }
            QualityMode::SkipAmbiguous => {
                warn!(
                    page = table.page,
                    confidence = table.confidence,
                    "skipping low-confidence table"
                );
                warnings.push(
                    ExtractWarning::new(
                        WarningCode::LowConfidence,
                        "skipping low-confidence table",
                    )
                    .with_page(table.page)
                    .with_confidence(table.confidence),
                );
            }
        }
    }

    Ok(out)
}

pub(crate) fn extract_with_warnings(
    pages: &[PageDetections],
    options: &ExtractOptions,
    mut warnings: Vec<ExtractWarning>,
) -> Result<ExtractionReport, PipelineError> {
    options.validate()?;

    let detected = detect_tables(pages, options, &mut warnings);
    let accepted = apply_quality_mode(detected, options, &mut warnings)?;

    let tables = accepted
        .into_iter()
        .enumerate()
        .map(|(index, table)| {
            let table_id = index + 1;
            let grid = apply_header_mode(
                table.grid,
                options.header_mode,
                &mut warnings,
                table.page,
                table_id,
            );
            ExtractedTable {
                page: table.page,
                table_id,
                origin: table.origin,
                confidence: table.confidence,
                grid,
            }
        })
        .collect::<Vec<_>>();

    if tables.is_empty() {
        warn!(pages = pages.len(), "no tables extracted");
        warnings.push(ExtractWarning::new(
            WarningCode::NoTablesDetected,
            "no table rows were detected in the selected pages",
        ));
    }

    let report = ExtractionReport::new(tables, warnings);
    debug!(
        tables = report.table_count,
        rows = report.row_count,
        warnings = report.warnings.len(),
        "extraction finished"
    );
    Ok(report)
}

/// Builds table grids from recorded detector output.
///
/// Soft failures (malformed regions, empty regions, low-confidence tables)
/// are reported in [`ExtractionReport::warnings`]; only invalid options and
/// [`QualityMode::Strict`] rejections are errors.
pub fn extract_tables(
    pages: &[PageDetections],
    options: &ExtractOptions,
) -> Result<ExtractionReport, PipelineError> {
    extract_with_warnings(pages, options, Vec::new())
}

fn merged_output(tables: &[ExtractedTable], csv: &CsvOptions) -> MergedOutput {
    apply_output_column_filters(merge_tables(tables), csv)
}

/// All tables merged into one CSV document.
pub fn tables_to_csv_string(
    tables: &[ExtractedTable],
    csv: &CsvOptions,
) -> Result<String, PipelineError> {
    write_csv_to_string(&merged_output(tables, csv), csv.delimiter)
}

pub fn write_tables_csv(
    tables: &[ExtractedTable],
    output_csv: &Path,
    csv: &CsvOptions,
) -> Result<(), PipelineError> {
    write_csv(output_csv, &merged_output(tables, csv), csv.delimiter)
}

pub fn extract_tables_to_csv_string(
    pages: &[PageDetections],
    options: &ExtractOptions,
    csv: &CsvOptions,
) -> Result<(String, ExtractionReport), PipelineError> {
    let report = extract_tables(pages, options)?;
    let output = tables_to_csv_string(&report.tables, csv)?;
    Ok((output, report))
}
