//! CSV normalization.
//!
//! Turns one exported CSV file into typed records ready for insertion:
//! duplicate primary keys are dropped (first occurrence wins), timestamps are
//! parsed leniently, numeric cells written as floats by dataframe exports
//! (`42.0`) are coerced back to integers, and empty or unconvertible
//! non-key cells become `None`.

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDateTime;
use csv::ReaderBuilder;
use serde::de::{self, Deserialize, Deserializer};
use tracing::{debug, trace};

use crate::error::{ImportError, Result};
use crate::models::Record;
use crate::schema::SqlType;

/// Textual format of every timestamp in the exports
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Largest magnitude at which every integral `f64` is exact
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// Parse a `YYYY-MM-DD HH:MM:SS` timestamp; anything else is `None`.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if raw.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).ok()
}

/// Render a timestamp the way the store holds it
#[must_use]
pub fn sql_timestamp(value: Option<NaiveDateTime>) -> Option<String> {
    value.map(|t| t.format(TIMESTAMP_FORMAT).to_string())
}

/// Parse an integer cell.
///
/// Empty cells and `NaN` are missing, never zero. Integral floats such as
/// `42.0` are accepted.
#[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
pub fn parse_int(raw: &str) -> std::result::Result<Option<i64>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(value) = raw.parse::<i64>() {
        return Ok(Some(value));
    }

    match raw.parse::<f64>() {
        Ok(value) if value.is_nan() => Ok(None),
        Ok(value) if value.trunc() == value && value.abs() <= MAX_EXACT_FLOAT => {
            Ok(Some(value as i64))
        }
        _ => Err(format!("`{raw}` is not an integer")),
    }
}

/// Parse a boolean cell; empty and `NaN` are missing.
pub fn parse_bool(raw: &str) -> std::result::Result<Option<bool>, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "nan" => Ok(None),
        "true" | "1" | "1.0" => Ok(Some(true)),
        "false" | "0" | "0.0" => Ok(Some(false)),
        other => Err(format!("`{other}` is not a boolean")),
    }
}

/// Normalized primary-key value, used for de-duplication
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrimaryKey {
    /// Integer key; `1` and `1.0` are the same key
    Int(i64),
    /// String key, compared verbatim
    Text(String),
}

impl PrimaryKey {
    /// Parse a raw key cell. `Ok(None)` means the key is missing.
    pub fn parse(sql_type: SqlType, raw: &str) -> std::result::Result<Option<Self>, String> {
        match sql_type {
            SqlType::Integer => Ok(parse_int(raw)?.map(Self::Int)),
            _ if raw.is_empty() => Ok(None),
            _ => Ok(Some(Self::Text(raw.to_string()))),
        }
    }
}

/// Deserialize a nullable integer cell; unparseable values become `None`.
pub fn int_cell<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    Ok(parse_int(&raw).unwrap_or_else(|message| {
        debug!(%message, "Unparseable integer stored as null");
        None
    }))
}

/// Deserialize an integer primary key
pub fn required_int_cell<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_int(&raw)
        .map_err(de::Error::custom)?
        .ok_or_else(|| de::Error::custom("primary key is empty"))
}

/// Deserialize a nullable boolean cell; unparseable values become `None`.
pub fn bool_cell<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    Ok(parse_bool(&raw).unwrap_or_else(|message| {
        debug!(%message, "Unparseable boolean stored as null");
        None
    }))
}

/// Deserialize a timestamp cell; unparseable values become `None`.
pub fn timestamp_cell<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let parsed = parse_timestamp(&raw);
    if parsed.is_none() {
        debug!(value = %raw, "Unparseable timestamp stored as null");
    }
    Ok(parsed)
}

/// The clean contents of one CSV file
#[derive(Debug)]
pub struct NormalizedFile<R> {
    /// Records in file order, one per distinct primary key
    pub records: Vec<R>,
    /// Data rows read, duplicates included
    pub rows_read: usize,
    /// Rows discarded because their key was already seen
    pub duplicates_dropped: usize,
}

/// Message of a row deserialization error without the reader's position,
/// which [`ImportError::Parse`] already carries.
fn cell_error_message(error: &csv::Error) -> String {
    match error.kind() {
        csv::ErrorKind::Deserialize { err, .. } => err.to_string(),
        _ => error.to_string(),
    }
}

/// Read and normalize the CSV file at `path` into records of type `R`.
///
/// The whole file is rejected if any row lacks a primary key or holds a
/// primary key that cannot be converted to its column type. Other cells
/// that do not convert are stored as null.
pub fn read_records<R: Record>(path: &Path) -> Result<NormalizedFile<R>> {
    let schema = R::RELATION.schema();
    let file = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());

    if !path.is_file() {
        return Err(ImportError::MissingFile(path.to_path_buf()));
    }

    let csv_error = |source: csv::Error| ImportError::Csv {
        file: file.clone(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(csv_error)?;
    let headers = reader.headers().map_err(csv_error)?.clone();
    let key_index = headers
        .iter()
        .position(|header| header == schema.primary_key)
        .ok_or_else(|| ImportError::MissingColumn {
            file: file.clone(),
            column: schema.primary_key.to_string(),
        })?;
    let key_type = schema.primary_key_type();

    let mut seen = HashSet::new();
    let mut records = Vec::new();
    let mut rows_read = 0;
    let mut duplicates_dropped = 0;

    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        rows_read += 1;
        let line = row.position().map_or(0, csv::Position::line);

        let raw_key = row.get(key_index).unwrap_or_default();
        let key = PrimaryKey::parse(key_type, raw_key)
            .map_err(|message| ImportError::Parse {
                file: file.clone(),
                line,
                message,
            })?
            .ok_or_else(|| ImportError::MissingPrimaryKey {
                file: file.clone(),
                line,
            })?;

        if !seen.insert(key) {
            duplicates_dropped += 1;
            trace!(file = %file, line, "Dropping duplicate row");
            continue;
        }

        let record: R = row
            .deserialize(Some(&headers))
            .map_err(|e| ImportError::Parse {
                file: file.clone(),
                line,
                message: cell_error_message(&e),
            })?;
        records.push(record);
    }

    Ok(NormalizedFile {
        records,
        rows_read,
        duplicates_dropped,
    })
}
