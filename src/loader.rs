use crate::dataset::{parse_csv, Dataset, Table};
use crate::db::{FetchOutcome, TableSource};
use crate::error::DatasetError;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Resolved data sources, fixed for the life of the process.
#[derive(Clone)]
pub struct DataSources {
    database: Option<Arc<dyn TableSource>>,
    data_dir: PathBuf,
}

impl DataSources {
    pub fn csv_only(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            database: None,
            data_dir: data_dir.into(),
        }
    }

    pub fn with_database(database: Arc<dyn TableSource>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            database: Some(database),
            data_dir: data_dir.into(),
        }
    }

    pub fn mode(&self) -> &'static str {
        if self.database.is_some() {
            "database"
        } else {
            "csv"
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Loads a dataset from the database when one is live, otherwise from the bundled CSV.
    ///
    /// A database failure only affects this call: it is logged and the CSV is served instead.
    /// CSV failures are returned to the caller.
    pub async fn load(&self, dataset: Dataset) -> Result<Table, DatasetError> {
        if let Some(database) = &self.database {
            match database.fetch_table(dataset.table_name()).await {
                FetchOutcome::Rows(table) => return Ok(table),
                FetchOutcome::DatabaseUnavailable(err) => {
                    tracing::warn!(
                        "Loading {} dataset from {} failed ({}); falling back to CSV",
                        dataset.name(),
                        database.describe(),
                        err
                    );
                }
            }
        }
        self.load_csv(dataset).await
    }

    pub async fn load_csv(&self, dataset: Dataset) -> Result<Table, DatasetError> {
        let path = self.data_dir.join(dataset.csv_file());
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| DatasetError::Io {
                path: path.clone(),
                source,
            })?;
        parse_csv(&bytes, &path)
    }
}
