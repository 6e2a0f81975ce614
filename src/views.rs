//! JSON shapes returned by the data endpoints.

use crate::dataset::{Row, Table};
use crate::error::DatasetError;
use serde::Serialize;
use serde_json::{Map, Value};

pub const CATEGORY_COLUMN: &str = "Comparison Index";

/// Horizon columns, in output order.
pub const HORIZON_COLUMNS: [&str; 5] = ["1 YR (%)", "3 YR (%)", "5 YR (%)", "10 YR (%)", "15 YR (%)"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub categories: Vec<Value>,
    /// Horizon label (`"1 YR"`) to per-row values, aligned with `categories`.
    pub years: Map<String, Value>,
}

impl ChartData {
    /// Fails with `MissingColumn` if the table, or any of its rows, lacks the category
    /// or a horizon column. An empty table is still checked against its column set.
    pub fn from_table(table: &Table) -> Result<Self, DatasetError> {
        if let Some(missing) = std::iter::once(CATEGORY_COLUMN)
            .chain(HORIZON_COLUMNS)
            .find(|name| !table.has_column(name))
        {
            return Err(DatasetError::MissingColumn(missing.to_string()));
        }

        let rows = &table.rows;
        let categories = column(rows, CATEGORY_COLUMN)?;

        let mut years = Map::new();
        for horizon in HORIZON_COLUMNS {
            years.insert(
                horizon_label(horizon).to_string(),
                Value::Array(column(rows, horizon)?),
            );
        }

        Ok(Self { categories, years })
    }
}

fn column(rows: &[Row], name: &str) -> Result<Vec<Value>, DatasetError> {
    rows.iter()
        .map(|row| {
            row.get(name)
                .cloned()
                .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
        })
        .collect()
}

fn horizon_label(column: &str) -> &str {
    column.strip_suffix(" (%)").unwrap_or(column)
}

/// Tags each row with a 1-based `id` in the order given.
pub fn number_rows(rows: Vec<Row>) -> Vec<Row> {
    rows.into_iter()
        .enumerate()
        .map(|(idx, mut row)| {
            row.insert("id".to_string(), Value::from(idx + 1));
            row
        })
        .collect()
}
