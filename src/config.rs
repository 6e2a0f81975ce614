use anyhow::Context;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 7000;
pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_DATA_DIR: &str = "data";

// Settings needed to reach the optional Postgres source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub schema: String,
    pub connect_attempts: u32,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    pub service_name: String,
    /// `None` means CSV-only mode.
    pub database: Option<DatabaseConfig>,
}

impl AppConfig {
    /// Reads configuration from the process environment, after loading `.env` if present.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(port) => port
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT must be a number, got {:?}", port))?,
            None => DEFAULT_PORT,
        };

        let data_dir = lookup("DATA_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let service_name = lookup("SERVICE_NAME")
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());

        let database = Self::database_from_lookup(&lookup)?;

        Ok(Self {
            port,
            data_dir,
            service_name,
            database,
        })
    }

    fn database_from_lookup<F>(lookup: &F) -> anyhow::Result<Option<DatabaseConfig>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = lookup("USE_DATABASE").map_or(false, |flag| is_truthy(&flag));
        if !enabled {
            return Ok(None);
        }

        let url = match lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            Some(url) => url,
            None => {
                tracing::warn!("USE_DATABASE is set but DATABASE_URL is missing; staying in CSV mode");
                return Ok(None);
            }
        };

        let schema = lookup("DB_SCHEMA")
            .filter(|schema| !schema.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SCHEMA.to_string());

        let connect_attempts = match lookup("DB_CONNECT_ATTEMPTS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("DB_CONNECT_ATTEMPTS must be a number, got {:?}", raw))?
                .max(1),
            None => 1,
        };

        let connect_timeout = match lookup("DB_CONNECT_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse::<u64>().with_context(|| {
                format!("DB_CONNECT_TIMEOUT_SECS must be a number, got {:?}", raw)
            })?),
            None => Duration::from_secs(10),
        };

        Ok(Some(DatabaseConfig {
            url,
            schema,
            connect_attempts,
            connect_timeout,
        }))
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
