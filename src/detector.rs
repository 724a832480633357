//! Seams for the external OCR and layout models.
//!
//! The models themselves live outside this crate. They are reached through
//! [`TextDetector`] and [`RegionDetector`], and a loaded model can be kept
//! in a process-wide [`ModelSlot`] that loads it on first use and shares it
//! read-only afterwards.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::error::PipelineError;
use crate::model::{LayoutRegion, PageDetections, TextFragment};

/// Produces recognized text fragments for a page image.
pub trait TextDetector: Send + Sync {
    fn detect_text(&self, image: &Path) -> Result<Vec<TextFragment>, PipelineError>;
}

/// Produces labelled layout regions for a page image.
pub trait RegionDetector: Send + Sync {
    fn detect_regions(&self, image: &Path) -> Result<Vec<LayoutRegion>, PipelineError>;
}

impl<T: TextDetector + ?Sized> TextDetector for Arc<T> {
    fn detect_text(&self, image: &Path) -> Result<Vec<TextFragment>, PipelineError> {
        (**self).detect_text(image)
    }
}

impl<T: RegionDetector + ?Sized> RegionDetector for Arc<T> {
    fn detect_regions(&self, image: &Path) -> Result<Vec<LayoutRegion>, PipelineError> {
        (**self).detect_regions(image)
    }
}

/// Lazily loaded, shared model handle. Usable as a `static`:
///
/// ```
/// use office_table_fill::ModelSlot;
///
/// struct Layout;
/// static LAYOUT: ModelSlot<Layout> = ModelSlot::new();
///
/// let model = LAYOUT.get_or_load(|| Ok(Layout)).expect("load");
/// assert!(LAYOUT.is_loaded());
/// # drop(model);
/// ```
pub struct ModelSlot<T> {
    cell: OnceCell<Arc<T>>,
}

impl<T> ModelSlot<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Returns the loaded model, running `load` only if no model is held yet.
    /// A failed load leaves the slot empty so a later call can retry.
    pub fn get_or_load<F>(&self, load: F) -> Result<Arc<T>, PipelineError>
    where
        F: FnOnce() -> Result<T, PipelineError>,
    {
        self.cell
            .get_or_try_init(|| load().map(Arc::new))
            .map(Arc::clone)
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T> Default for ModelSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Replays detector output saved next to each page image as
/// `<image>.json` (a serialized [`PageDetections`]).
#[derive(Debug, Clone, Default)]
pub struct RecordedDetector;

impl RecordedDetector {
    #[must_use]
    pub fn sidecar_path(image: &Path) -> PathBuf {
        let mut name = image.as_os_str().to_owned();
        name.push(".json");
        PathBuf::from(name)
    }

    fn load(image: &Path) -> Result<PageDetections, PipelineError> {
        let path = Self::sidecar_path(image);
        let raw = fs::read_to_string(&path).map_err(|error| {
            PipelineError::Detector(format!(
                "cannot read recorded detections '{}': {error}",
                path.display()
            ))
        })?;
        let detections = serde_json::from_str::<PageDetections>(&raw)?;
        debug!(
            path = %path.display(),
            fragments = detections.fragments.len(),
            regions = detections.regions.len(),
            "loaded recorded detections"
        );
        Ok(detections)
    }
}

impl TextDetector for RecordedDetector {
    fn detect_text(&self, image: &Path) -> Result<Vec<TextFragment>, PipelineError> {
        Ok(Self::load(image)?.fragments)
    }
}

impl RegionDetector for RecordedDetector {
    fn detect_regions(&self, image: &Path) -> Result<Vec<LayoutRegion>, PipelineError> {
        Ok(Self::load(image)?.regions)
    }
}
