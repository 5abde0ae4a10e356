use std::{
    fmt,
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Timelike};
use serde::Deserialize;

use crate::{datetime, error::ConversionError};

pub type ColName = String;

/// Transform a consumer may attach to a column; stored and handed back untouched.
pub type CellFn = Arc<dyn Fn(&CellValue) -> CellValue + Send + Sync>;

/// Target type of a column.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColType {
    Text,
    Int,
    Float,
    Date,
    DateTime,
}

impl ColType {
    /// Name of the column kind, used in the debug rendering of a [`Column`].
    pub fn column_name(self) -> &'static str {
        match self {
            ColType::Text => "TextColumn",
            ColType::Int => "IntColumn",
            ColType::Float => "FloatColumn",
            ColType::Date => "DateColumn",
            ColType::DateTime => "DateTimeColumn",
        }
    }

    /// Coerces a non-empty cell string into this type.
    pub fn parse(self, s: &str) -> Result<CellValue, ConversionError> {
        match self {
            ColType::Text => Ok(CellValue::Text(s.to_owned())),
            ColType::Int => parse_number::<i64>(s)
                .map(CellValue::Int)
                .map_err(|e| ConversionError::new(self, s, e)),
            ColType::Float => parse_number::<f64>(s)
                .map(CellValue::Float)
                .map_err(|e| ConversionError::new(self, s, e)),
            ColType::Date => datetime::parse(s)
                .map(|t| CellValue::Date(t.date))
                .ok_or_else(|| ConversionError::new(self, s, "unrecognized date format")),
            ColType::DateTime => {
                let parsed = datetime::parse(s).ok_or_else(|| {
                    ConversionError::new(self, s, "unrecognized date/time format")
                })?;
                match parsed.offset {
                    Some(_) => parsed.zoned().map(CellValue::DateTimeTz).ok_or_else(|| {
                        ConversionError::new(self, s, "time does not exist at the given offset")
                    }),
                    None => Ok(CellValue::DateTime(parsed.naive())),
                }
            }
        }
    }
}

impl fmt::Display for ColType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColType::Text => "text",
            ColType::Int => "integer",
            ColType::Float => "float",
            ColType::Date => "date",
            ColType::DateTime => "date-time",
        };
        f.write_str(name)
    }
}

// Accepts `_` between digits, e.g. `1_000_000` or `1_000.5`.
fn parse_number<T: FromStr>(s: &str) -> Result<T, T::Err> {
    let s = s.trim();
    match strip_digit_separators(s) {
        Some(digits) => digits.parse(),
        // No separators, or misplaced ones the std parser will reject.
        None => s.parse(),
    }
}

fn strip_digit_separators(s: &str) -> Option<String> {
    if !s.contains('_') {
        return None;
    }
    let bytes = s.as_bytes();
    let well_placed = bytes.iter().enumerate().all(|(i, b)| {
        *b != b'_'
            || (i > 0
                && i + 1 < bytes.len()
                && bytes[i - 1].is_ascii_digit()
                && bytes[i + 1].is_ascii_digit())
    });
    well_placed.then(|| s.replace('_', ""))
}

/// A typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    DateTimeTz(DateTime<FixedOffset>),
}

/// Canonical textual form: ISO 8601 for temporal values; for floats the
/// shortest round-tripping digits, positional with `.0` kept on integral
/// values, or `1e+16`/`1.5e-05` style outside `[1e-4, 1e16)`.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Float(x) => write_float(f, *x),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::DateTime(dt) => write_iso_datetime(f, dt),
            CellValue::DateTimeTz(dt) => {
                write_iso_datetime(f, &dt.naive_local())?;
                write!(f, "{}", dt.format("%:z"))
            }
        }
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        return f.write_str("nan");
    }
    if x.is_infinite() {
        return f.write_str(if x > 0.0 { "inf" } else { "-inf" });
    }

    let magnitude = x.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        // `{:e}` gives `1.5e-5`; the exponent is written signed, two digits minimum.
        let sci = format!("{x:e}");
        let (mantissa, exp) = sci.split_once('e').ok_or(fmt::Error)?;
        let exp: i32 = exp.parse().map_err(|_| fmt::Error)?;
        let sign = if exp < 0 { '-' } else { '+' };
        write!(f, "{mantissa}e{sign}{:02}", exp.abs())
    } else if x.fract() == 0.0 {
        write!(f, "{x:.1}")
    } else {
        write!(f, "{x}")
    }
}

fn write_iso_datetime(f: &mut fmt::Formatter<'_>, dt: &NaiveDateTime) -> fmt::Result {
    // `%S` renders a leap second as `60`; its extra second lives in `nanosecond()`.
    write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S"))?;
    let nanos = dt.nanosecond() % 1_000_000_000;
    if nanos == 0 {
        Ok(())
    } else if nanos % 1_000 == 0 {
        write!(f, ".{:06}", nanos / 1_000)
    } else {
        write!(f, ".{nanos:09}")
    }
}

/// Process-wide or injected source of creation-order values.
///
/// Columns drawn from the same counter get strictly increasing orders, which
/// lets a schema recover declaration order after collecting its columns.
#[derive(Debug, Default)]
pub struct CreationCounter {
    next: AtomicU64,
}

static GLOBAL_COUNTER: CreationCounter = CreationCounter::new();

impl CreationCounter {
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    pub const fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// The counter used by [`Column::new`].
    pub fn global() -> &'static CreationCounter {
        &GLOBAL_COUNTER
    }

    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Describes one table column: its type, labels and ordering metadata.
pub struct Column {
    col_type: ColType,
    label: Option<String>,
    verbose_name: Option<String>,
    cell_fn: Option<CellFn>,
    creation_order: u64,
    /// Position among all columns, hidden ones included.
    pub index: usize,
    /// Position among visible columns only.
    pub view_index: usize,
}

impl Column {
    /// Creates a column ordered by the process-wide counter.
    pub fn new(col_type: ColType) -> Self {
        Self::with_counter(col_type, CreationCounter::global())
    }

    pub fn with_counter(col_type: ColType, counter: &CreationCounter) -> Self {
        Self::with_creation_order(col_type, counter.next())
    }

    /// Creates a column with an explicit creation order instead of drawing one.
    pub fn with_creation_order(col_type: ColType, creation_order: u64) -> Self {
        Self {
            col_type,
            label: None,
            verbose_name: None,
            cell_fn: None,
            creation_order,
            index: 0,
            view_index: 0,
        }
    }

    pub fn text() -> Self {
        Self::new(ColType::Text)
    }

    pub fn int() -> Self {
        Self::new(ColType::Int)
    }

    pub fn float() -> Self {
        Self::new(ColType::Float)
    }

    pub fn date() -> Self {
        Self::new(ColType::Date)
    }

    pub fn datetime() -> Self {
        Self::new(ColType::DateTime)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
        self.verbose_name = Some(verbose_name.into());
        self
    }

    pub fn with_cell_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&CellValue) -> CellValue + Send + Sync + 'static,
    {
        self.cell_fn = Some(Arc::new(f));
        self
    }

    pub fn col_type(&self) -> ColType {
        self.col_type
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Long display name, falling back to the label and then to `""`.
    pub fn verbose_name(&self) -> &str {
        self.verbose_name
            .as_deref()
            .or(self.label.as_deref())
            .unwrap_or_default()
    }

    pub fn cell_fn(&self) -> Option<&CellFn> {
        self.cell_fn.as_ref()
    }

    pub fn creation_order(&self) -> u64 {
        self.creation_order
    }

    /// Decodes a raw cell. Empty or absent input is `Ok(None)`.
    pub fn from_str(&self, s: Option<&str>) -> Result<Option<CellValue>, ConversionError> {
        match s {
            None | Some("") => Ok(None),
            Some(s) => self.col_type.parse(s).map(Some),
        }
    }

    /// Encodes a cell value. Absent values become `""`.
    pub fn to_str(&self, value: Option<&CellValue>) -> String {
        value.map(CellValue::to_string).unwrap_or_default()
    }
}

/// Duplicates keep the source's creation order so a column can be re-bound
/// onto another schema without losing its place. Positions start over.
impl Clone for Column {
    fn clone(&self) -> Self {
        Self {
            col_type: self.col_type,
            label: self.label.clone(),
            verbose_name: self.verbose_name.clone(),
            cell_fn: self.cell_fn.clone(),
            creation_order: self.creation_order,
            index: 0,
            view_index: 0,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(label={})",
            self.col_type.column_name(),
            self.label.as_deref().unwrap_or("None")
        )
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.col_type.column_name())
            .field("label", &self.label)
            .field("verbose_name", &self.verbose_name)
            .field("cell_fn", &self.cell_fn.as_ref().map(|_| "<fn>"))
            .field("creation_order", &self.creation_order)
            .field("index", &self.index)
            .field("view_index", &self.view_index)
            .finish()
    }
}
