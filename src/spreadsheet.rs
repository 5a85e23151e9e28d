//! Whitespace-delimited spreadsheet exposure reader.
//!
//! Some beamline tooling exports a detector exposure as plain text: a
//! dimension line (`width height ...`) followed by one row of samples per
//! line. This reader parses that layout into a [`Frame`] with an f32
//! buffer. No backend negotiation is involved; a file either parses or it
//! does not.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::SpreadsheetError;
use crate::frame::{Frame, PixelBuffer, PixelData, TagDictionary, TagValue};

/// Read a spreadsheet exposure from a file.
pub fn read_spreadsheet(path: impl AsRef<Path>) -> Result<Frame, SpreadsheetError> {
    parse_spreadsheet(BufReader::new(File::open(path)?))
}

/// Parse a spreadsheet exposure from any reader.
///
/// The dimension line feeds `dim_1`/`dim_2` header entries and is kept
/// verbatim under `title`. Rows that fail to parse as numbers are skipped;
/// the surviving rows must match the declared shape exactly.
pub fn parse_spreadsheet<R: Read>(reader: R) -> Result<Frame, SpreadsheetError> {
    let mut lines = BufReader::new(reader).lines();

    let title = lines
        .next()
        .transpose()?
        .ok_or_else(|| SpreadsheetError::InvalidDimensions("empty input".to_string()))?;
    let (width, height) = parse_dimension_line(&title)?;

    let mut samples: Vec<f32> = Vec::with_capacity(width * height);
    let mut rows = 0usize;
    for line in lines {
        let line = line?;
        if let Some(row) = parse_row(&line, width) {
            samples.extend_from_slice(&row);
            rows += 1;
        }
    }

    if rows != height {
        return Err(SpreadsheetError::ShapeMismatch {
            declared_width: width,
            declared_height: height,
            rows,
        });
    }

    let mut header = TagDictionary::new();
    header.insert("title".to_string(), TagValue::Text(title));
    header.insert("dim_1".to_string(), TagValue::Unsigned(width as u64));
    header.insert("dim_2".to_string(), TagValue::Unsigned(height as u64));

    // rows == height and every kept row holds exactly `width` samples, so
    // the buffer construction cannot fail.
    let buffer = PixelBuffer::new(width, height, 1, PixelData::F32(samples)).ok_or(
        SpreadsheetError::ShapeMismatch {
            declared_width: width,
            declared_height: height,
            rows,
        },
    )?;

    Ok(Frame::new(header, buffer))
}

/// Parse `width height ...` from the first line.
fn parse_dimension_line(line: &str) -> Result<(usize, usize), SpreadsheetError> {
    let mut items = line.split_whitespace();
    let width = items
        .next()
        .and_then(|v| v.parse::<usize>().ok())
        .ok_or_else(|| SpreadsheetError::InvalidDimensions(line.to_string()))?;
    let height = items
        .next()
        .and_then(|v| v.parse::<usize>().ok())
        .ok_or_else(|| SpreadsheetError::InvalidDimensions(line.to_string()))?;
    if width == 0 || height == 0 {
        return Err(SpreadsheetError::InvalidDimensions(line.to_string()));
    }
    Ok((width, height))
}

/// Parse one data row; `None` if any token is non-numeric or the count
/// does not match the declared width.
fn parse_row(line: &str, width: usize) -> Option<Vec<f32>> {
    let row: Option<Vec<f32>> = line
        .split_whitespace()
        .map(|token| token.parse::<f32>().ok())
        .collect();
    row.filter(|r| r.len() == width)
}

// =============================================================================
// Tests
// =============================================================================
