//! Parsers for driver log output.
//!
//! The job service returns query results only as the driver's console text,
//! so tabular data has to be recovered from the box-drawn table that
//! `df.show` prints, and column types re-inferred from the first data row.

use crate::errors::ClientError;
use crate::models::{Column, ColumnType, DriverLogType, Row, Value};

/// Marker opening (and closing) a box-drawn table, e.g. `+---+-----+`.
const TABLE_SEPARATOR: &str = "+-";
/// Column delimiter inside header and data lines.
const COLUMN_DELIMITER: char = '|';

/// Parsed driver log output, one variant per log stream.
#[derive(Debug, Clone, PartialEq)]
pub enum LogOutput {
    Table { schema: Vec<Column>, rows: Vec<Row> },
    Events(Vec<SparkEvent>),
    Raw(Vec<String>),
}

/// One record from the Spark event log.
#[derive(Debug, Clone, PartialEq)]
pub struct SparkEvent {
    pub name: Option<String>,
    /// Milliseconds since epoch.
    pub timestamp_ms: i64,
}

/// Parse a raw driver log body with the parser matching its stream type.
pub fn parse_driver_log(log_type: DriverLogType, text: &str) -> Result<LogOutput, ClientError> {
    let lines: Vec<&str> = text.split('\n').map(str::trim).collect();
    match log_type {
        DriverLogType::Stdout => {
            let (schema, rows) = parse_table(&lines)?;
            Ok(LogOutput::Table { schema, rows })
        }
        DriverLogType::Event => Ok(LogOutput::Events(parse_events(&lines)?)),
        DriverLogType::Stderr => Ok(LogOutput::Raw(
            lines.into_iter().map(str::to_string).collect(),
        )),
    }
}

/// Extract the first box-drawn table from `lines`.
///
/// No table in the output is a valid empty result, not an error. A table
/// whose first data row allows type inference comes back typed; a later row
/// that cannot be converted to an inferred type fails the whole parse.
pub fn parse_table<S: AsRef<str>>(lines: &[S]) -> Result<(Vec<Column>, Vec<Row>), ClientError> {
    let separator_idx = match lines
        .iter()
        .position(|l| l.as_ref().trim().starts_with(TABLE_SEPARATOR))
    {
        Some(idx) => idx,
        None => return Ok((Vec::new(), Vec::new())),
    };

    let header = match lines.get(separator_idx + 1) {
        Some(line) => line.as_ref(),
        None => return Ok((Vec::new(), Vec::new())),
    };

    let schema: Vec<Column> = split_columns(header)
        .iter()
        .map(|name| Column::provisional(name))
        .collect();
    if schema.is_empty() {
        return Ok((schema, Vec::new()));
    }

    // Data starts past the second separator line and runs until the closing
    // separator or end of input.
    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for line in lines.iter().skip(separator_idx + 3) {
        let line = line.as_ref().trim();
        if line.starts_with(TABLE_SEPARATOR) {
            break;
        }
        let cells = split_columns(line);
        if !cells.is_empty() {
            raw_rows.push(cells);
        }
    }

    if raw_rows.is_empty() {
        return Ok((schema, Vec::new()));
    }
    extract_datatypes(schema, raw_rows)
}

/// Split a table line on the column delimiter, dropping blank fragments and
/// trimming the rest.
fn split_columns(line: &str) -> Vec<String> {
    line.split(COLUMN_DELIMITER)
        .filter(|fragment| !fragment.trim().is_empty())
        .map(|fragment| fragment.trim().to_string())
        .collect()
}

/// Infer each column's type from the first data row and convert every row
/// accordingly.
///
/// The log endpoint returns the SQL output with no schema information, so
/// number and boolean columns are recognized from their first value and
/// everything else stays string. Inference is skipped entirely when the
/// first row's width does not match the schema.
fn extract_datatypes(
    mut schema: Vec<Column>,
    raw_rows: Vec<Vec<String>>,
) -> Result<(Vec<Column>, Vec<Row>), ClientError> {
    let first_row = &raw_rows[0];
    if first_row.len() != schema.len() {
        tracing::warn!(
            "Skipping type inference: first row has {} values but header has {} columns",
            first_row.len(),
            schema.len()
        );
        let rows = raw_rows
            .into_iter()
            .map(|row| row.into_iter().map(Value::Text).collect())
            .collect();
        return Ok((schema, rows));
    }

    let col_types: Vec<ColumnType> = first_row.iter().map(|cell| classify(cell)).collect();

    let mut rows: Vec<Row> = Vec::with_capacity(raw_rows.len());
    for raw_row in raw_rows {
        let mut row: Row = Vec::with_capacity(raw_row.len());
        for (idx, cell) in raw_row.into_iter().enumerate() {
            let col_type = col_types.get(idx).copied().unwrap_or(ColumnType::String);
            row.push(convert(cell, col_type, &schema, idx)?);
        }
        rows.push(row);
    }

    for (column, col_type) in schema.iter_mut().zip(col_types) {
        column.column_type = col_type;
    }
    Ok((schema, rows))
}

fn classify(cell: &str) -> ColumnType {
    if !cell.is_empty() && cell.chars().all(|c| c.is_ascii_digit()) {
        ColumnType::Number
    } else if is_boolean_token(cell) {
        ColumnType::Boolean
    } else {
        ColumnType::String
    }
}

fn is_boolean_token(cell: &str) -> bool {
    cell.eq_ignore_ascii_case("true") || cell.eq_ignore_ascii_case("false")
}

fn convert(
    cell: String,
    col_type: ColumnType,
    schema: &[Column],
    idx: usize,
) -> Result<Value, ClientError> {
    match col_type {
        ColumnType::Number => match cell.parse::<f64>() {
            Ok(n) => Ok(Value::Number(n)),
            Err(_) => Err(ClientError::Conversion {
                column: schema
                    .get(idx)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| idx.to_string()),
                value: cell,
                expected: "number",
            }),
        },
        ColumnType::Boolean => Ok(Value::Bool(cell.eq_ignore_ascii_case("true"))),
        ColumnType::String => Ok(Value::Text(cell)),
    }
}

/// Parse event-log output: one JSON record per non-blank line, keeping only
/// records that carry a `Timestamp` or `time` field (epoch milliseconds).
/// Malformed JSON propagates.
pub fn parse_events<S: AsRef<str>>(lines: &[S]) -> Result<Vec<SparkEvent>, ClientError> {
    let mut events = Vec::new();
    for line in lines {
        let line = line.as_ref().trim();
        if line.is_empty() {
            continue;
        }
        let record: serde_json::Value = serde_json::from_str(line)?;
        let timestamp_ms = record
            .get("Timestamp")
            .or_else(|| record.get("time"))
            .and_then(serde_json::Value::as_i64);
        if let Some(timestamp_ms) = timestamp_ms {
            events.push(SparkEvent {
                name: record
                    .get("Event")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string),
                timestamp_ms,
            });
        }
    }
    Ok(events)
}
