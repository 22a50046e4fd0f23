//! CSV ingest and type coercion.
//!
//! This module is responsible for turning the daily bike-sharing CSV into a
//! [`Dataset`] of typed [`Record`]s.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **All-or-nothing rows**: a value that cannot be coerced fails the load
//!   instead of leaving a partially populated dataset
//! - **No validation beyond coercion** (e.g. `cnt = registered + casual` is trusted)

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, info};

use crate::domain::types::integral_f64;
use crate::domain::{Column, Dataset, Month, Record, Year};
use crate::error::AppError;

/// Columns every input file must carry.
pub const REQUIRED_COLUMNS: [Column; 10] = Column::ALL;

/// Load the dataset from a CSV file on disk.
pub fn load(path: &Path) -> Result<Dataset, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::data(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let dataset = load_from_reader(file)
        .map_err(|e| match e {
            AppError::DataUnavailable(msg) => {
                AppError::data(format!("{} ({msg})", path.display()))
            }
            other => other,
        })?;

    let stats = dataset.stats();
    info!(
        path = %path.display(),
        rows = stats.n_rows,
        first = ?stats.date_min,
        last = ?stats.date_max,
        "loaded dataset"
    );
    Ok(dataset)
}

/// Load the dataset from any reader producing CSV text.
pub fn load_from_reader<R: Read>(reader: R) -> Result<Dataset, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::data(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    let columns = resolve_columns(&header_map)?;
    debug!(headers = headers.len(), "resolved CSV schema");

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;

        let record =
            result.map_err(|e| AppError::data(format!("CSV parse error on line {line}: {e}")))?;

        let row = parse_row(&record, &columns)
            .map_err(|e| AppError::data(format!("line {line}: {e}")))?;
        records.push(row);
    }

    let names = headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    Ok(Dataset::from_records(records).with_headers(names))
}

/// Field index for each required column, in `Column::ALL` order.
struct ColumnIndex {
    idx: [usize; 10],
}

impl ColumnIndex {
    fn get(&self, column: Column) -> usize {
        // Variants are declared in `Column::ALL` order.
        self.idx[column as usize]
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, schema validation will incorrectly
    // report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn resolve_columns(header_map: &HashMap<String, usize>) -> Result<ColumnIndex, AppError> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .map(|c| c.name())
        .filter(|name| !header_map.contains_key(*name))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::data(format!(
            "Missing required column(s): {}",
            missing
                .iter()
                .map(|m| format!("`{m}`"))
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    let mut idx = [0usize; 10];
    for (slot, column) in idx.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = header_map[column.name()];
    }
    Ok(ColumnIndex { idx })
}

fn parse_row(record: &StringRecord, columns: &ColumnIndex) -> Result<Record, String> {
    let dteday = parse_date(get_required(record, columns, Column::Dteday)?)?;
    let season = get_required(record, columns, Column::Season)?.to_string();
    let weathersit = get_required(record, columns, Column::Weathersit)?.to_string();

    let mnth_raw = get_required(record, columns, Column::Mnth)?;
    let mnth = Month::parse(mnth_raw).ok_or_else(|| format!("Invalid `mnth` value '{mnth_raw}'."))?;

    let yr_raw = get_required(record, columns, Column::Yr)?;
    let yr = Year::parse(yr_raw).ok_or_else(|| format!("Invalid `yr` value '{yr_raw}'."))?;

    let temp_raw = get_required(record, columns, Column::Temp)?;
    let temp = parse_f64(temp_raw).ok_or_else(|| format!("Invalid `temp` value '{temp_raw}'."))?;

    let wd_raw = get_required(record, columns, Column::Workingday)?;
    let workingday =
        parse_flag(wd_raw).ok_or_else(|| format!("Invalid `workingday` value '{wd_raw}'."))?;

    let registered = parse_count(record, columns, Column::Registered)?;
    let casual = parse_count(record, columns, Column::Casual)?;
    let cnt = parse_count(record, columns, Column::Cnt)?;

    Ok(Record {
        dteday,
        season,
        weathersit,
        mnth,
        yr,
        temp,
        workingday,
        registered,
        casual,
        cnt,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    columns: &ColumnIndex,
    column: Column,
) -> Result<&'a str, String> {
    record
        .get(columns.get(column))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{}`", column.name()))
}

fn parse_count(record: &StringRecord, columns: &ColumnIndex, column: Column) -> Result<u64, String> {
    let raw = get_required(record, columns, column)?;
    raw.parse::<u64>()
        .ok()
        .or_else(|| integral_f64(raw))
        .ok_or_else(|| format!("Invalid `{}` value '{raw}' (expected a non-negative integer).", column.name()))
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // ISO dates (`YYYY-MM-DD`) are what the public exports use, but files
    // re-saved from spreadsheets often come back as `DD/MM/YYYY` or
    // `DD-MM-YYYY`. Accept a small, fixed set of formats.
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];
    // Some tools append a midnight time component.
    let s = s.split_whitespace().next().unwrap_or(s);
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, YYYY/MM/DD, DD/MM/YYYY, DD-MM-YYYY."
    ))
}

fn parse_f64(s: &str) -> Option<f64> {
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" | "yes" => Some(true),
        "0" | "0.0" | "false" | "no" => Some(false),
        _ => None,
    }
}
