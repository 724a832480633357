use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Vertical gap, as a share of region height, that starts a new row.
pub const DEFAULT_ROW_THRESHOLD_RATIO: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderMode {
    AutoDetect,
    HasHeader,
    #[default]
    NoHeader,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QualityMode {
    #[default]
    BestEffort,
    Strict,
    SkipAmbiguous,
}

/// How fragments inside a region are grouped into rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowStrategy {
    /// Single greedy pass in detector order. Output depends on that order.
    #[default]
    Sequential,
    /// Sort by vertical centroid, then run the same greedy pass.
    SortedByY,
}

/// How fill records are matched to grid rows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FillMode {
    /// Record `i` updates row `i` of every grid; overflow records append.
    #[default]
    Positional,
    /// As `Positional`, counting only records sharing a column with the grid.
    KeyIntersect,
    /// Record updates the first row whose `key_column` cell equals its own
    /// value for that column; unmatched records append.
    ByName { key_column: String },
}

/// Inclusive 1-based page ranges, e.g. `1-3,5`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    ranges: Vec<(u32, u32)>,
}

impl PageSelection {
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        self.ranges
            .iter()
            .any(|&(start, end)| (start..=end).contains(&page))
    }
}

fn parse_page(value: &str, what: &str) -> Result<u32, PipelineError> {
    let page: u32 = value
        .trim()
        .parse()
        .map_err(|_| PipelineError::InvalidPageSelection(format!("invalid {what}: '{value}'")))?;
    if page == 0 {
        return Err(PipelineError::InvalidPageSelection(
            "pages are 1-based".to_string(),
        ));
    }
    Ok(page)
}

impl FromStr for PageSelection {
    type Err = PipelineError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut ranges = Vec::new();
        for token in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if let Some((start, end)) = token.split_once('-') {
                let start = parse_page(start, "page range start")?;
                let end = parse_page(end, "page range end")?;
                if end < start {
                    return Err(PipelineError::InvalidPageSelection(format!(
                        "invalid range '{token}': end is smaller than start"
                    )));
                }
                ranges.push((start, end));
            } else {
                let page = parse_page(token, "page number")?;
                ranges.push((page, page));
            }
        }

        if ranges.is_empty() {
            return Err(PipelineError::InvalidPageSelection(
                "page selection cannot be empty".to_string(),
            ));
        }

        Ok(Self { ranges })
    }
}

/// Manually specified table box, used for pages where the region detector
/// found nothing usable.
#[derive(Debug, Clone, PartialEq)]
pub struct TableArea {
    pub page: u32,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl TableArea {
    #[must_use]
    pub fn bbox(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

impl FromStr for TableArea {
    type Err = PipelineError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = PipelineError::InvalidTableArea;

        let (page_part, rect_part) = input.split_once(':').ok_or_else(|| {
            invalid(format!(
                "invalid area format '{input}', expected page:x1,y1,x2,y2"
            ))
        })?;

        let page: u32 = page_part
            .trim()
            .parse()
            .map_err(|_| invalid(format!("invalid page number in area: '{page_part}'")))?;
        if page == 0 {
            return Err(invalid("area page number must be >= 1".to_string()));
        }

        let coords = rect_part
            .split(',')
            .map(str::trim)
            .map(|part| {
                part.parse::<f32>()
                    .map_err(|_| invalid(format!("invalid coordinate: '{part}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let &[x1, y1, x2, y2] = coords.as_slice() else {
            return Err(invalid(format!(
                "invalid area format '{input}', expected exactly 4 coordinates"
            )));
        };

        if x2 <= x1 || y2 <= y1 {
            return Err(invalid("area requires x2>x1 and y2>y1".to_string()));
        }

        Ok(Self {
            page,
            x1,
            y1,
            x2,
            y2,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridOptions {
    pub row_threshold_ratio: f32,
    pub row_strategy: RowStrategy,
    /// Fragments below this confidence never reach a grid.
    pub min_confidence: f32,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            row_threshold_ratio: DEFAULT_ROW_THRESHOLD_RATIO,
            row_strategy: RowStrategy::Sequential,
            min_confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub no_page: bool,
    pub no_table: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            no_page: false,
            no_table: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractOptions {
    pub pages: Option<PageSelection>,
    pub areas: Vec<TableArea>,
    pub grid: GridOptions,
    pub header_mode: HeaderMode,
    pub quality_mode: QualityMode,
}

impl ExtractOptions {
    pub fn validate(&self) -> Result<(), PipelineError> {
        let ratio = self.grid.row_threshold_ratio;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(PipelineError::InvalidOption(format!(
                "row_threshold_ratio must be a positive number, got {ratio}"
            )));
        }

        if !(0.0..=1.0).contains(&self.grid.min_confidence) {
            return Err(PipelineError::InvalidOption(format!(
                "min_confidence must be within [0, 1], got {}",
                self.grid.min_confidence
            )));
        }

        Ok(())
    }
}
