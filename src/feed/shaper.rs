//! Data Shaper
//!
//! Turns the raw upstream payload into the fixed table exposed by the proxy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::sanitize::{absint, sanitize_email, sanitize_text_field, scalar_text};
use crate::error::ShapeError;

/// Output format of the `date` column.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

// == Table Types ==
/// One applicant row. Field order is the serialization order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub id: u64,
    pub fname: String,
    pub lname: String,
    pub email: String,
    pub date: String,
}

/// Sanitized table: column labels plus rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableData {
    pub header: Vec<String>,
    pub body: Vec<Row>,
}

// == Shape ==
/// Shapes `{title, data: {headers, rows}}` into a [`TableData`].
///
/// `data.headers` and `data.rows` must both be present as arrays (or
/// objects, whose values are taken in document order); anything else is a
/// [`ShapeError::MalformedPayload`]. Individual fields never fail: bad values
/// are coerced to `""` or `0`.
pub fn shape(raw: &Value) -> Result<TableData, ShapeError> {
    let data = raw
        .get("data")
        .ok_or_else(|| ShapeError::MalformedPayload("missing `data`".to_string()))?;

    let headers = sequence(data, "headers")?;
    let rows = sequence(data, "rows")?;

    let header = headers
        .into_iter()
        .map(|item| sanitize_text_field(&scalar_text(item).unwrap_or_default()))
        .collect();

    let body = rows.into_iter().map(shape_row).collect();

    Ok(TableData { header, body })
}

/// Sanitized feed title, empty when missing.
pub fn feed_title(raw: &Value) -> String {
    raw.get("title")
        .and_then(scalar_text)
        .map(|title| sanitize_text_field(&title))
        .unwrap_or_default()
}

fn sequence<'a>(data: &'a Value, field: &str) -> Result<Vec<&'a Value>, ShapeError> {
    match data.get(field) {
        Some(Value::Array(items)) => Ok(items.iter().collect()),
        Some(Value::Object(items)) => Ok(items.values().collect()),
        Some(_) => Err(ShapeError::MalformedPayload(format!(
            "`data.{}` is not a list",
            field
        ))),
        None => Err(ShapeError::MalformedPayload(format!(
            "missing `data.{}`",
            field
        ))),
    }
}

fn shape_row(row: &Value) -> Row {
    let empty = Map::new();
    let fields = row.as_object().unwrap_or(&empty);

    Row {
        id: fields.get("id").map(absint).unwrap_or(0),
        fname: text_field(fields, "fname"),
        lname: text_field(fields, "lname"),
        email: fields
            .get("email")
            .and_then(scalar_text)
            .map(|email| sanitize_email(&email))
            .unwrap_or_default(),
        date: fields.get("date").map(format_date).unwrap_or_default(),
    }
}

fn text_field(fields: &Map<String, Value>, name: &str) -> String {
    fields
        .get(name)
        .and_then(scalar_text)
        .map(|text| sanitize_text_field(&text))
        .unwrap_or_default()
}

/// Formats an integer Unix timestamp as `dd/mm/yyyy` in UTC.
///
/// Strings, floats and out-of-range timestamps give an empty string.
fn format_date(value: &Value) -> String {
    value
        .as_i64()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|date| date.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}
