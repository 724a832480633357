use std::io::Write;
use std::path::Path;

use csv::{Writer, WriterBuilder};

use crate::error::PipelineError;
use crate::merge::MergedOutput;
use crate::model::TableGrid;

fn write_records<W: Write>(
    writer: &mut Writer<W>,
    headers: &[String],
    rows: &[Vec<String>],
) -> Result<(), PipelineError> {
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn into_string(writer: Writer<Vec<u8>>) -> Result<String, PipelineError> {
    let bytes = writer
        .into_inner()
        .map_err(|error| PipelineError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| PipelineError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}

pub(crate) fn write_csv(
    path: &Path,
    merged: &MergedOutput,
    delimiter: u8,
) -> Result<(), PipelineError> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_path(path)?;
    write_records(&mut writer, &merged.headers, &merged.rows)
}

pub(crate) fn write_csv_to_string(
    merged: &MergedOutput,
    delimiter: u8,
) -> Result<String, PipelineError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::<u8>::new());
    write_records(&mut writer, &merged.headers, &merged.rows)?;
    into_string(writer)
}

/// One grid as CSV, with its column keys as the header row.
pub fn grid_to_csv_string(grid: &TableGrid, delimiter: u8) -> Result<String, PipelineError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::<u8>::new());
    write_records(&mut writer, &grid.columns, &grid.data)?;
    into_string(writer)
}
