use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::detector::{RegionDetector, TextDetector};
use crate::error::PipelineError;
use crate::model::PageDetections;
use crate::options::ExtractOptions;
use crate::warning::{ExtractWarning, WarningCode};
use crate::{ExtractionReport, extract_with_warnings};

/// Runs the detectors over page images and turns their output into tables.
/// Pages are processed one after another on the calling thread.
pub struct DocumentProcessor<T, R> {
    text_detector: T,
    region_detector: R,
}

impl<T: TextDetector, R: RegionDetector> DocumentProcessor<T, R> {
    pub fn new(text_detector: T, region_detector: R) -> Self {
        Self {
            text_detector,
            region_detector,
        }
    }

    /// Detector output for one page image.
    pub fn detect_page(
        &self,
        page_number: u32,
        image: &Path,
    ) -> Result<PageDetections, PipelineError> {
        if !image.is_file() {
            return Err(PipelineError::Detector(format!(
                "page image '{}' is missing or not a file",
                image.display()
            )));
        }

        let fragments = self.text_detector.detect_text(image)?;
        let regions = self.region_detector.detect_regions(image)?;
        Ok(PageDetections {
            page_number,
            fragments,
            regions,
        })
    }

    /// Extracts tables from page images, numbered from 1 in slice order.
    /// Pages whose image cannot be read or whose detectors fail contribute
    /// nothing and are reported as warnings.
    pub fn process_document(
        &self,
        images: &[PathBuf],
        options: &ExtractOptions,
    ) -> Result<ExtractionReport, PipelineError> {
        options.validate()?;

        let mut warnings = Vec::new();
        let mut pages = Vec::with_capacity(images.len());
        for (page_number, image) in (1_u32..).zip(images) {
            if options
                .pages
                .as_ref()
                .is_some_and(|selection| !selection.contains(page_number))
            {
                continue;
            }

            match self.detect_page(page_number, image) {
                Ok(page) => pages.push(page),
                Err(error) => {
                    warn!(page = page_number, %error, "page produced no detections");
                    warnings.push(
                        ExtractWarning::new(WarningCode::UnreadablePage, error.to_string())
                            .with_page(page_number),
                    );
                    pages.push(PageDetections::empty(page_number));
                }
            }
        }

        let report = extract_with_warnings(&pages, options, warnings)?;
        info!(
            pages = pages.len(),
            tables = report.table_count,
            rows = report.row_count,
            "document processed"
        );
        Ok(report)
    }
}
