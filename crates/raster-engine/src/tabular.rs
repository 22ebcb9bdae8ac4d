//! CSV input: location values and points of interest.
//!
//! The first row is the header. Columns are looked up by exact header
//! match; cells are trimmed before parsing. Inputs are capped in bytes and
//! in data rows by [`EngineConfig`].

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use overlay_common::{HeatmapError, HeatmapResult};

use crate::config::EngineConfig;
use crate::distance::PointOfInterest;
use crate::names::LocationValue;

/// Read `(name, value)` pairs from the named columns.
pub fn read_location_values(
    bytes: &[u8],
    name_column: &str,
    value_column: &str,
    config: &EngineConfig,
) -> HeatmapResult<Vec<LocationValue>> {
    let table = Table::read(bytes, config)?;
    let name_idx = table.column(name_column)?;
    let value_idx = table.column(value_column)?;

    let values = table
        .rows
        .iter()
        .map(|row| {
            Ok(LocationValue::new(
                cell(row, name_idx),
                parse_number(row, value_idx, value_column)?,
            ))
        })
        .collect::<HeatmapResult<Vec<_>>>()?;

    debug!(rows = values.len(), "Read location values");
    Ok(values)
}

/// Read weighted points of interest. Without a weight column every point
/// weighs 1.
pub fn read_points_of_interest(
    bytes: &[u8],
    lat_column: &str,
    long_column: &str,
    weight_column: Option<&str>,
    config: &EngineConfig,
) -> HeatmapResult<Vec<PointOfInterest>> {
    let table = Table::read(bytes, config)?;
    let lat_idx = table.column(lat_column)?;
    let long_idx = table.column(long_column)?;
    let weight_idx = weight_column
        .map(|name| table.column(name).map(|idx| (idx, name)))
        .transpose()?;

    let points = table
        .rows
        .iter()
        .map(|row| {
            let weight = match weight_idx {
                Some((idx, name)) => parse_number(row, idx, name)?,
                None => 1.0,
            };
            Ok(PointOfInterest::new(
                parse_number(row, lat_idx, lat_column)?,
                parse_number(row, long_idx, long_column)?,
                weight,
            ))
        })
        .collect::<HeatmapResult<Vec<_>>>()?;

    debug!(rows = points.len(), "Read points of interest");
    Ok(points)
}

struct Table {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl Table {
    fn read(bytes: &[u8], config: &EngineConfig) -> HeatmapResult<Self> {
        if bytes.len() > config.max_input_bytes {
            return Err(HeatmapError::InputTooLarge {
                limit: config.max_input_bytes,
                actual: bytes.len(),
            });
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(bytes);

        let headers = reader
            .headers()
            .map_err(|e| HeatmapError::decode("CSV header", e))?
            .clone();

        if headers.is_empty() {
            return Err(HeatmapError::EmptyInput("CSV has no header row".to_string()));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| HeatmapError::decode("CSV", e))?;
            if rows.len() == config.max_csv_rows {
                return Err(HeatmapError::TooManyRows {
                    limit: config.max_csv_rows,
                });
            }
            rows.push(record);
        }

        if rows.is_empty() {
            return Err(HeatmapError::EmptyInput("CSV has no data rows".to_string()));
        }

        Ok(Self { headers, rows })
    }

    fn column(&self, name: &str) -> HeatmapResult<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| HeatmapError::MissingColumn {
                column: name.to_string(),
                found: self.headers.iter().collect::<Vec<_>>().join(", "),
            })
    }
}

fn cell(row: &StringRecord, idx: usize) -> &str {
    row.get(idx).unwrap_or("")
}

fn parse_number(row: &StringRecord, idx: usize, column: &str) -> HeatmapResult<f64> {
    let raw = cell(row, idx);
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| HeatmapError::InvalidNumber {
            column: column.to_string(),
            value: raw.to_string(),
        })
}
