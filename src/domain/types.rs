//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - held in memory for the lifetime of the process (the dataset)
//! - grouped and reduced into views
//! - exported to JSON/CSV

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Calendar month, ordered January to December.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::Jan,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
        Month::Nov,
        Month::Dec,
    ];

    pub fn abbrev(self) -> &'static str {
        match self {
            Month::Jan => "Jan",
            Month::Feb => "Feb",
            Month::Mar => "Mar",
            Month::Apr => "Apr",
            Month::May => "May",
            Month::Jun => "Jun",
            Month::Jul => "Jul",
            Month::Aug => "Aug",
            Month::Sep => "Sep",
            Month::Oct => "Oct",
            Month::Nov => "Nov",
            Month::Dec => "Dec",
        }
    }

    /// Zero-based position in the calendar.
    pub fn index(self) -> usize {
        self as usize
    }

    /// `1..=12` to a month.
    pub fn from_number(n: u32) -> Option<Month> {
        let idx = usize::try_from(n).ok()?.checked_sub(1)?;
        Month::ALL.get(idx).copied()
    }

    /// Parse a three-letter abbreviation, a full month name, or a month number.
    ///
    /// Matching is case-insensitive: `jan`, `JAN`, `January` and `1` all
    /// resolve to [`Month::Jan`].
    pub fn parse(s: &str) -> Option<Month> {
        let s = s.trim();
        if let Ok(n) = s.parse::<u32>() {
            return Month::from_number(n);
        }
        if s.len() < 3 || !s.is_ascii() {
            return None;
        }
        let lower = s.to_ascii_lowercase();
        let month = Month::ALL
            .into_iter()
            .find(|m| lower[..3] == m.abbrev().to_ascii_lowercase())?;
        if lower.len() == 3 || full_name(month) == lower {
            Some(month)
        } else {
            None
        }
    }
}

fn full_name(month: Month) -> &'static str {
    match month {
        Month::Jan => "january",
        Month::Feb => "february",
        Month::Mar => "march",
        Month::Apr => "april",
        Month::May => "may",
        Month::Jun => "june",
        Month::Jul => "july",
        Month::Aug => "august",
        Month::Sep => "september",
        Month::Oct => "october",
        Month::Nov => "november",
        Month::Dec => "december",
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbrev())
    }
}

/// Calendar year of a record.
///
/// The public bike-sharing exports encode the year as `0` (2011) / `1` (2012);
/// cleaned files carry the year itself. Both resolve to the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Year(pub u16);

impl Year {
    /// Year that code `0` stands for.
    pub const BASE: u16 = 2011;

    pub fn parse(s: &str) -> Option<Year> {
        let s = s.trim();
        let v: u16 = s
            .parse()
            .ok()
            .or_else(|| integral_f64(s).and_then(|v| u16::try_from(v).ok()))?;
        match v {
            0 | 1 => Some(Year(Year::BASE + v)),
            1900..=2100 => Some(Year(v)),
            _ => None,
        }
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse values like `15` or `15.0` into an integer; rejects fractions.
pub(crate) fn integral_f64(s: &str) -> Option<u64> {
    let v = s.trim().parse::<f64>().ok()?;
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 {
        Some(v as u64)
    } else {
        None
    }
}

/// Severity rank of a `weathersit` value, lower is milder.
///
/// Numeric codes rank as themselves. Labels from cleaned exports (`Clear`,
/// `Misty`, `Light_rainsnow`, `Heavy_rainsnow`, any case or separator) rank
/// 1 to 4. Unknown labels have no rank.
pub fn weather_severity(value: &str) -> Option<usize> {
    let value = value.trim();
    if let Some(code) = integral_f64(value) {
        return usize::try_from(code).ok();
    }
    let label = value.to_ascii_lowercase().replace(['_', '-'], " ");
    let rank = if label.starts_with("clear") {
        1
    } else if label.starts_with("mist") {
        2
    } else if label.starts_with("light") {
        3
    } else if label.starts_with("heavy") {
        4
    } else {
        return None;
    };
    Some(rank)
}

/// One row of the daily bike-sharing table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub dteday: NaiveDate,
    pub season: String,
    pub weathersit: String,
    pub mnth: Month,
    pub yr: Year,
    /// Normalized temperature (0..1).
    pub temp: f64,
    pub workingday: bool,
    pub registered: u64,
    pub casual: u64,
    /// `registered + casual` by construction of the source data; not re-checked.
    pub cnt: u64,
}

/// Summary stats about the rows actually loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetStats {
    pub n_rows: usize,
    pub date_min: Option<NaiveDate>,
    pub date_max: Option<NaiveDate>,
}

/// The loaded table. Immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
    headers: Vec<String>,
    stats: DatasetStats,
}

impl Dataset {
    pub fn from_records(records: Vec<Record>) -> Self {
        let stats = DatasetStats {
            n_rows: records.len(),
            date_min: records.iter().map(|r| r.dteday).min(),
            date_max: records.iter().map(|r| r.dteday).max(),
        };
        Self { records, headers: Vec::new(), stats }
    }

    /// Attach the column names as they appeared in the source header.
    pub fn with_headers(mut self, headers: Vec<String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Source column names, in file order. Empty for hand-built datasets.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn stats(&self) -> &DatasetStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The named columns of the dataset.
///
/// Categorical columns can be used as group keys; numeric columns can be reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Dteday,
    Season,
    Weathersit,
    Mnth,
    Yr,
    Temp,
    Workingday,
    Registered,
    Casual,
    Cnt,
}

impl Column {
    pub const ALL: [Column; 10] = [
        Column::Dteday,
        Column::Season,
        Column::Weathersit,
        Column::Mnth,
        Column::Yr,
        Column::Temp,
        Column::Workingday,
        Column::Registered,
        Column::Casual,
        Column::Cnt,
    ];

    /// Header name in the input file.
    pub fn name(self) -> &'static str {
        match self {
            Column::Dteday => "dteday",
            Column::Season => "season",
            Column::Weathersit => "weathersit",
            Column::Mnth => "mnth",
            Column::Yr => "yr",
            Column::Temp => "temp",
            Column::Workingday => "workingday",
            Column::Registered => "registered",
            Column::Casual => "casual",
            Column::Cnt => "cnt",
        }
    }

    pub fn from_name(name: &str) -> Option<Column> {
        let name = name.trim();
        Column::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Column::Temp | Column::Registered | Column::Casual | Column::Cnt
        )
    }

    /// Key value of a categorical column; `None` for numeric columns.
    pub fn key_of(self, record: &Record) -> Option<KeyValue> {
        match self {
            Column::Dteday => Some(KeyValue::Date(record.dteday)),
            Column::Season => Some(KeyValue::Label(record.season.clone())),
            Column::Weathersit => Some(KeyValue::Label(record.weathersit.clone())),
            Column::Mnth => Some(KeyValue::Month(record.mnth)),
            Column::Yr => Some(KeyValue::Year(record.yr)),
            Column::Workingday => Some(KeyValue::Flag(record.workingday)),
            Column::Temp | Column::Registered | Column::Casual | Column::Cnt => None,
        }
    }

    /// Numeric value of a numeric column; `None` for categorical columns.
    pub fn value_of(self, record: &Record) -> Option<f64> {
        match self {
            Column::Temp => Some(record.temp),
            Column::Registered => Some(record.registered as f64),
            Column::Casual => Some(record.casual as f64),
            Column::Cnt => Some(record.cnt as f64),
            _ => None,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single group-key value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    Label(String),
    Month(Month),
    Year(Year),
    Flag(bool),
    Date(NaiveDate),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Label(s) => f.write_str(s),
            KeyValue::Month(m) => f.write_str(m.abbrev()),
            KeyValue::Year(y) => write!(f, "{y}"),
            KeyValue::Flag(b) => f.write_str(if *b { "1" } else { "0" }),
            KeyValue::Date(d) => write!(f, "{d}"),
        }
    }
}

/// How a value column is reduced within each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reducer {
    Sum,
    Mean,
    /// No grouping: the rows themselves, paired with a fitted line.
    Identity,
}

/// Which kind of chart a view is drawn as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// One bar per value column at each category, drawn on top of each other.
    GroupedBar,
    /// One line per series value, with a marker at each point.
    LineWithMarkers,
    /// Raw points plus the fitted regression line.
    ScatterWithRegression,
    /// One bar per category with a confidence interval whisker.
    BarWithError,
}
