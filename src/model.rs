use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Layout label carried by regions the pipeline turns into grids.
pub const TABLE_LABEL: &str = "Table";

/// One externally supplied record, keyed by column name.
pub type FillRecord = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
enum QuadRepr {
    Flat([f32; 8]),
    Points([[f32; 2]; 4]),
}

/// Four-corner box in detector order: `x1,y1,x2,y2,x3,y3,x4,y4`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "QuadRepr", into = "[f32; 8]")]
pub struct Quad([f32; 8]);

impl From<QuadRepr> for Quad {
    fn from(repr: QuadRepr) -> Self {
        match repr {
            QuadRepr::Flat(coords) => Self(coords),
            QuadRepr::Points(points) => {
                let mut coords = [0.0; 8];
                for (index, [x, y]) in points.into_iter().enumerate() {
                    coords[index * 2] = x;
                    coords[index * 2 + 1] = y;
                }
                Self(coords)
            }
        }
    }
}

impl From<Quad> for [f32; 8] {
    fn from(quad: Quad) -> Self {
        quad.0
    }
}

impl Quad {
    #[must_use]
    pub const fn new(coords: [f32; 8]) -> Self {
        Self(coords)
    }

    /// Axis-aligned rectangle, corners clockwise from top-left.
    #[must_use]
    pub const fn rect(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self([x1, y1, x2, y1, x2, y2, x1, y2])
    }

    pub fn points(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.0.chunks_exact(2).map(|pair| (pair[0], pair[1]))
    }

    /// Mean of the four corners.
    #[must_use]
    pub fn centroid(&self) -> (f32, f32) {
        let (sum_x, sum_y) = self
            .points()
            .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
        (sum_x / 4.0, sum_y / 4.0)
    }

    #[must_use]
    pub fn left(&self) -> f32 {
        self.points().map(|(x, _)| x).fold(f32::INFINITY, f32::min)
    }

    #[must_use]
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        let mut coords = self.0;
        for pair in coords.chunks_exact_mut(2) {
            pair[0] -= dx;
            pair[1] -= dy;
        }
        Self(coords)
    }
}

fn full_confidence() -> f32 {
    1.0
}

/// Recognized text with its box, as returned by the text detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    #[serde(rename = "box")]
    pub quad: Quad,
    #[serde(default = "full_confidence")]
    pub confidence: f32,
}

impl TextFragment {
    #[must_use]
    pub fn new(text: impl Into<String>, quad: Quad, confidence: f32) -> Self {
        Self {
            text: text.into(),
            quad,
            confidence,
        }
    }

    #[must_use]
    pub fn centroid(&self) -> (f32, f32) {
        self.quad.centroid()
    }
}

/// Labelled block from the region detector. The box is kept raw so that
/// malformed detections can be reported instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRegion {
    pub label: String,
    #[serde(alias = "box")]
    pub bbox: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl LayoutRegion {
    #[must_use]
    pub fn table(bbox: [f32; 4]) -> Self {
        Self {
            label: TABLE_LABEL.to_string(),
            bbox: bbox.to_vec(),
            score: None,
        }
    }

    #[must_use]
    pub fn is_table(&self) -> bool {
        self.label == TABLE_LABEL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableRegion {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl TableRegion {
    /// Validates a raw `[x1, y1, x2, y2]` box.
    pub fn from_box(bbox: &[f32]) -> Result<Self, PipelineError> {
        let &[x1, y1, x2, y2] = bbox else {
            return Err(PipelineError::InvalidRegion(format!(
                "expected 4 coordinates, got {}",
                bbox.len()
            )));
        };

        if bbox.iter().any(|value| !value.is_finite()) {
            return Err(PipelineError::InvalidRegion(format!(
                "non-finite coordinate in {bbox:?}"
            )));
        }

        if x2 <= x1 || y2 <= y1 {
            return Err(PipelineError::InvalidRegion(format!(
                "region requires x2>x1 and y2>y1, got {bbox:?}"
            )));
        }

        Ok(Self { x1, y1, x2, y2 })
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    #[must_use]
    pub fn contains(&self, (x, y): (f32, f32)) -> bool {
        (self.x1..=self.x2).contains(&x) && (self.y1..=self.y2).contains(&y)
    }
}

#[derive(Deserialize)]
struct GridRepr {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<Vec<String>>,
}

impl From<GridRepr> for TableGrid {
    fn from(repr: GridRepr) -> Self {
        Self::from_parts(repr.columns, repr.data)
    }
}

/// Row/column structure reconstructed from one table region.
///
/// Rows are stored positionally against `columns`. Constructors and
/// deserialization pad every row to `columns.len()` cells; readers still
/// tolerate ragged rows built through the public fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "GridRepr")]
pub struct TableGrid {
    pub columns: Vec<String>,
    pub data: Vec<Vec<String>>,
}

impl TableGrid {
    #[must_use]
    pub fn column_key(index: usize) -> String {
        format!("Col_{index}")
    }

    /// Builds a grid with positional keys, padding short rows.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let columns = (0..width).map(Self::column_key).collect();
        Self::from_parts(columns, rows)
    }

    /// Pairs rows with named columns. Short rows are padded and long rows
    /// truncated to the column count.
    #[must_use]
    pub fn from_parts(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let data = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, data }
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() || self.columns.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == key)
    }

    #[must_use]
    pub fn cell(&self, row: usize, key: &str) -> Option<&str> {
        let index = self.column_index(key)?;
        self.data.get(row)?.get(index).map(String::as_str)
    }

    pub fn row(&self, row: usize) -> Option<impl Iterator<Item = (&str, &str)>> {
        self.data.get(row).map(|cells| {
            self.columns
                .iter()
                .map(String::as_str)
                .zip(cells.iter().map(String::as_str))
        })
    }

    /// Row built from a record over this grid's columns.
    #[must_use]
    pub fn row_from_record(&self, record: &FillRecord) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| record.get(column).cloned().unwrap_or_default())
            .collect()
    }
}

/// Recorded detector output for one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageDetections {
    pub page_number: u32,
    #[serde(default)]
    pub fragments: Vec<TextFragment>,
    #[serde(default)]
    pub regions: Vec<LayoutRegion>,
}

impl PageDetections {
    #[must_use]
    pub fn empty(page_number: u32) -> Self {
        Self {
            page_number,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableOrigin {
    Detected,
    ManualArea,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedTable {
    pub page: u32,
    pub table_id: usize,
    pub origin: TableOrigin,
    pub confidence: f32,
    pub grid: TableGrid,
}
