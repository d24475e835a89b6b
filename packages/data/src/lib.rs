#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Data access layer for the bundled pollutant measurement database.
//!
//! A category change fetches the bundled database file, opens it with the
//! embedded query engine, runs the fixed-shape sample query against the
//! category's table, and maps the rows to [`PointSample`]s. Failures never
//! cross this boundary: they are logged and surface as an empty sample set
//! so the view renders the base map with no overlay.

pub mod engine;
pub mod fetch;

use std::sync::Arc;

use async_trait::async_trait;
use pollution_map_map_models::PointSample;
use pollution_map_pollutant_models::Pollutant;

pub use engine::DuckDbEngine;
pub use fetch::HttpFetcher;

/// Errors that can occur while loading point samples.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error (scratch file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The embedded engine rejected the file or the query.
    #[error("query failed: {0}")]
    Query(#[from] duckdb::Error),

    /// The data file is structurally unusable.
    #[error("malformed data file: {message}")]
    Malformed {
        /// Description of what went wrong.
        message: String,
    },
}

/// Default URL of the bundled measurement database.
const DEFAULT_DATA_URL: &str = "http://127.0.0.1:8080/data/tempo.duckdb";

/// Configuration for locating the bundled measurement database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataConfig {
    /// URL the database file is fetched from.
    pub data_url: String,
}

impl DataConfig {
    /// Creates a configuration pointing at the given URL.
    pub fn new(data_url: impl Into<String>) -> Self {
        Self {
            data_url: data_url.into(),
        }
    }

    /// Builds the configuration from the environment.
    ///
    /// Reads `POLLUTION_MAP_DATA_URL`, falling back to the default asset
    /// location.
    #[must_use]
    pub fn from_env() -> Self {
        let data_url = std::env::var("POLLUTION_MAP_DATA_URL")
            .unwrap_or_else(|_| DEFAULT_DATA_URL.to_string());
        Self { data_url }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_URL)
    }
}

/// Retrieves the raw bytes of a file at a URL.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    /// Fetches the file.
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] if the file cannot be retrieved.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DataError>;
}

/// The embedded relational query engine, as an opaque capability.
pub trait QueryEngine: Send + Sync {
    /// Opens a database from its raw file bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] if the bytes are not a readable database.
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn QueryHandle>, DataError>;
}

/// A live handle to an opened database.
///
/// Handles are scoped to a single fetch cycle and released before the
/// samples are returned.
pub trait QueryHandle: Send {
    /// Executes a query returning `(latitude, longitude, value)` rows in
    /// table order.
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] if the query fails (e.g. the table is absent).
    fn execute(&mut self, sql: &str) -> Result<Vec<[f64; 3]>, DataError>;
}

/// Produces the point samples for a pollutant category.
///
/// This is the seam the view coordinator depends on; [`SampleStore`] is the
/// production implementation.
#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Loads the samples for `pollutant`. Failures are reported through the
    /// log and yield an empty vector.
    async fn fetch_samples(&self, pollutant: Pollutant) -> Vec<PointSample>;
}

/// Fetches and queries the bundled database on every category change.
///
/// The file is re-fetched per call rather than cached; category changes are
/// explicit user actions, so the extra fetch is cheap relative to keeping a
/// copy coherent.
pub struct SampleStore {
    config: DataConfig,
    fetcher: Arc<dyn FileFetcher>,
    engine: Arc<dyn QueryEngine>,
}

impl SampleStore {
    /// Creates a store over the given fetcher and engine.
    #[must_use]
    pub fn new(
        config: DataConfig,
        fetcher: Arc<dyn FileFetcher>,
        engine: Arc<dyn QueryEngine>,
    ) -> Self {
        Self {
            config,
            fetcher,
            engine,
        }
    }

    /// Creates a store with the production HTTP fetcher and `DuckDB` engine.
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] if the HTTP client cannot be constructed.
    pub fn with_defaults(config: DataConfig) -> Result<Self, DataError> {
        Ok(Self::new(
            config,
            Arc::new(HttpFetcher::new()?),
            Arc::new(DuckDbEngine::new()),
        ))
    }

    async fn try_fetch(&self, pollutant: Pollutant) -> Result<Vec<PointSample>, DataError> {
        let table = pollutant.table_name();
        let bytes = self.fetcher.fetch(&self.config.data_url).await?;

        let mut handle = self.engine.open(&bytes)?;
        let sql = format!("SELECT latitude, longitude, value FROM {table}");
        let rows = handle.execute(&sql)?;
        // Scoped acquisition: the handle never outlives the fetch cycle.
        drop(handle);

        Ok(rows
            .into_iter()
            .map(|[latitude, longitude, value]| {
                PointSample::new(latitude, longitude, value.clamp(0.0, 1.0))
            })
            .collect())
    }
}

#[async_trait]
impl SampleSource for SampleStore {
    async fn fetch_samples(&self, pollutant: Pollutant) -> Vec<PointSample> {
        match self.try_fetch(pollutant).await {
            Ok(samples) => {
                log::debug!("Loaded {} samples for {pollutant}", samples.len());
                samples
            }
            Err(e) => {
                log::error!("Failed to load samples for {pollutant}: {e}");
                Vec::new()
            }
        }
    }
}
