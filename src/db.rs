use crate::config::DatabaseConfig;
use crate::dataset::{Row, Table};
use crate::error::DatasetError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde_json::{Number, Value};
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    Column, Error as SqlxError, PgPool, Row as _, TypeInfo,
};

/// Result of asking a table source for a whole table.
#[derive(Debug)]
pub enum FetchOutcome {
    Rows(Table),
    DatabaseUnavailable(DatasetError),
}

// Anything that can hand back a full table by name
#[async_trait]
pub trait TableSource: Send + Sync {
    async fn fetch_table(&self, table: &str) -> FetchOutcome;

    fn describe(&self) -> String;
}

// Database connection pool plus the schema holding the datasets
pub struct Database {
    pool: PgPool,
    schema: String,
}

impl Database {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        Self {
            pool,
            schema: schema.into(),
        }
    }

    /// Opens a pool and probes it. Any failure is logged and yields `None`.
    pub async fn connect(config: &DatabaseConfig) -> Option<Self> {
        // Only log the host part, not credentials
        let host_part = config.url.split('@').nth(1).unwrap_or("(hidden)");
        tracing::info!("Attempting to connect to database at: {}", host_part);

        match Self::connect_with_retry(config).await {
            Ok(pool) => {
                tracing::info!(
                    "Database mode enabled, reading tables from schema \"{}\"",
                    config.schema
                );
                Some(Self::new(pool, config.schema.clone()))
            }
            Err(err) => {
                tracing::error!("All database connection attempts failed! Last error: {}", err);
                tracing::warn!("Database mode disabled, serving bundled CSV data");
                None
            }
        }
    }

    async fn connect_with_retry(config: &DatabaseConfig) -> Result<PgPool, SqlxError> {
        let max_retries = config.connect_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_retries {
            tracing::info!("Database connection attempt {} of {}", attempt, max_retries);

            let pool_result = PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(config.connect_timeout)
                .connect(&config.url)
                .await;

            match pool_result {
                Ok(pool) => {
                    // Test the connection with a simple query
                    match sqlx::query("SELECT 1").execute(&pool).await {
                        Ok(_) => return Ok(pool),
                        Err(err) => {
                            tracing::error!("Database connection test failed: {}", err);
                            last_error = Some(err);
                        }
                    }
                }
                Err(err) => {
                    tracing::error!("Database connection attempt {} failed: {}", attempt, err);
                    last_error = Some(err);
                }
            }

            if attempt < max_retries {
                let delay = std::time::Duration::from_secs(2 * attempt as u64);
                tracing::info!("Waiting {:?} before next connection attempt", delay);
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or(SqlxError::PoolClosed))
    }

    fn qualified_table(&self, table: &str) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(table))
    }

    pub async fn select_all(&self, table: &str) -> Result<Table, DatasetError> {
        let sql = format!("SELECT * FROM {}", self.qualified_table(table));
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        // An empty result carries no column metadata, so ask the catalog instead
        let columns = match rows.first() {
            Some(first) => first.columns().iter().map(|c| c.name().to_string()).collect(),
            None => self.table_columns(table).await?,
        };

        let rows = rows.iter().map(row_to_json).collect::<Result<Vec<_>, _>>()?;
        Ok(Table::new(columns, rows))
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<String>, DatasetError> {
        let columns = sqlx::query_scalar::<_, String>(
            "SELECT column_name::text FROM information_schema.columns
             WHERE table_schema = $1 AND table_name = $2
             ORDER BY ordinal_position",
        )
        .bind(&self.schema)
        .bind(table)
        .fetch_all(&self.pool)
        .await?;
        Ok(columns)
    }
}

#[async_trait]
impl TableSource for Database {
    async fn fetch_table(&self, table: &str) -> FetchOutcome {
        match self.select_all(table).await {
            Ok(table) => FetchOutcome::Rows(table),
            Err(err) => FetchOutcome::DatabaseUnavailable(err),
        }
    }

    fn describe(&self) -> String {
        format!("postgres schema \"{}\"", self.schema)
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn row_to_json(row: &PgRow) -> Result<Row, DatasetError> {
    row.columns()
        .iter()
        .map(|column| {
            let value = column_value(row, column.ordinal(), column.name(), column.type_info().name())?;
            Ok::<_, DatasetError>((column.name().to_string(), value))
        })
        .collect()
}

fn column_value(row: &PgRow, idx: usize, name: &str, type_name: &str) -> Result<Value, DatasetError> {
    let value = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(idx)?.map(Value::from),
        "INT2" => row.try_get::<Option<i16>, _>(idx)?.map(Value::from),
        "INT4" => row.try_get::<Option<i32>, _>(idx)?.map(Value::from),
        "INT8" => row.try_get::<Option<i64>, _>(idx)?.map(Value::from),
        "FLOAT4" => row.try_get::<Option<f32>, _>(idx)?.map(f32_to_json),
        "FLOAT8" => row.try_get::<Option<f64>, _>(idx)?.map(float_to_json),
        "NUMERIC" => row.try_get::<Option<Decimal>, _>(idx)?.map(decimal_to_json),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
            row.try_get::<Option<String>, _>(idx)?.map(Value::from)
        }
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(idx)?,
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(idx)?
            .map(|d| Value::from(d.to_string())),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(idx)?
            .map(|t| Value::from(t.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(idx)?
            .map(|t| Value::from(t.to_rfc3339())),
        other => {
            return Err(DatasetError::UnsupportedColumnType {
                column: name.to_string(),
                type_name: other.to_string(),
            })
        }
    };
    Ok(value.unwrap_or(Value::Null))
}

fn float_to_json(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

// Go through the shortest decimal form so 53.2f32 stays 53.2
fn f32_to_json(value: f32) -> Value {
    value
        .to_string()
        .parse::<f64>()
        .map(float_to_json)
        .unwrap_or(Value::Null)
}

fn decimal_to_json(value: Decimal) -> Value {
    if value.scale() == 0 {
        if let Some(int) = value.to_i64() {
            return Value::from(int);
        }
    }
    value
        .to_string()
        .parse::<f64>()
        .map(float_to_json)
        .unwrap_or(Value::Null)
}
