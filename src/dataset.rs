use crate::error::DatasetError;
use serde_json::{Map, Number, Value};
use std::path::Path;

/// One record keyed by column name, in source column order.
pub type Row = Map<String, Value>;

/// Rows together with the column set they came from.
///
/// The column list is known even when there are no rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// The two datasets the API serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Chart,
    Spiva,
}

impl Dataset {
    pub fn name(self) -> &'static str {
        match self {
            Dataset::Chart => "chart",
            Dataset::Spiva => "spiva",
        }
    }

    pub fn table_name(self) -> &'static str {
        match self {
            Dataset::Chart => "sp500_benchmark_underperformance",
            Dataset::Spiva => "spiva_underperformance_by_category",
        }
    }

    pub fn csv_file(self) -> &'static str {
        match self {
            Dataset::Chart => "sp500-benchmark-underperformance.csv",
            Dataset::Spiva => "spiva-underperformance-by-category.csv",
        }
    }
}

// Default NA spellings of a pandas CSV reader
const MISSING: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Float,
    Text,
}

/// Parses CSV bytes into a table, typing each column from its contents.
///
/// `path` is only used for error reporting.
pub fn parse_csv(bytes: &[u8], path: &Path) -> Result<Table, DatasetError> {
    let csv_err = |source| DatasetError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut records = Vec::new();
    for result in reader.records() {
        records.push(result.map_err(csv_err)?);
    }

    let kinds: Vec<ColumnKind> = (0..headers.len())
        .map(|col| infer_kind(records.iter().filter_map(|r| r.get(col))))
        .collect();

    let rows = records
        .iter()
        .map(|record| {
            headers
                .iter()
                .zip(&kinds)
                .zip(record.iter())
                .map(|((header, kind), cell)| (header.clone(), typed_value(cell, *kind)))
                .collect()
        })
        .collect();

    Ok(Table::new(headers, rows))
}

fn is_missing(cell: &str) -> bool {
    MISSING.contains(&cell.trim())
}

fn infer_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut kind = ColumnKind::Integer;
    let mut saw_missing = false;
    for cell in cells.map(str::trim) {
        if is_missing(cell) {
            saw_missing = true;
            continue;
        }
        if kind == ColumnKind::Integer && cell.parse::<i64>().is_err() {
            kind = ColumnKind::Float;
        }
        if kind == ColumnKind::Float && cell.parse::<f64>().is_err() {
            return ColumnKind::Text;
        }
    }
    // integers cannot hold a missing value
    if kind == ColumnKind::Integer && saw_missing {
        ColumnKind::Float
    } else {
        kind
    }
}

fn typed_value(cell: &str, kind: ColumnKind) -> Value {
    if is_missing(cell) {
        return Value::Null;
    }
    let trimmed = cell.trim();
    match kind {
        ColumnKind::Integer => trimmed
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or(Value::Null),
        ColumnKind::Float => trimmed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ColumnKind::Text => Value::String(cell.to_string()),
    }
}
