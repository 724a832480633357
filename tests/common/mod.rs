#![allow(dead_code)]

use std::path::Path;

use office_table_fill::{LayoutRegion, PageDetections, Quad, TextFragment};

/// Fragment whose box is 40 wide and 10 tall, centred vertically on `center_y`.
pub fn fragment(text: &str, left: f32, center_y: f32) -> TextFragment {
    TextFragment::new(
        text,
        Quad::rect(left, center_y - 5.0, left + 40.0, center_y + 5.0),
        0.95,
    )
}

/// A page holding one table region with the given rows laid out 60 apart
/// horizontally and 30 apart vertically, starting at (`x`, `y`).
pub fn table_page(page_number: u32, origin: (f32, f32), rows: &[&[&str]]) -> PageDetections {
    let (x, y) = origin;
    let mut fragments = Vec::new();
    for (row_index, row) in rows.iter().enumerate() {
        for (col_index, text) in row.iter().enumerate() {
            fragments.push(fragment(
                text,
                x + 10.0 + 60.0 * col_index as f32,
                y + 15.0 + 30.0 * row_index as f32,
            ));
        }
    }

    let width = 60.0 * rows.iter().map(|row| row.len()).max().unwrap_or(1) as f32 + 20.0;
    let height = 30.0 * rows.len() as f32 + 10.0;
    PageDetections {
        page_number,
        fragments,
        regions: vec![LayoutRegion::table([x, y, x + width, y + height])],
    }
}

pub fn write_json<T: serde::Serialize>(
    path: &Path,
    value: &T,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}
