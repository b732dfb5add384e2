use super::raw::RawTable;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The boundary with whatever fetches market data.
///
/// Implementations are responsible for retrieval only: talking to a provider,
/// handling credentials, and stripping response envelopes. They hand back the
/// table exactly as the source shaped it; normalization happens afterwards and
/// never performs I/O itself.
#[async_trait]
pub trait RawTableSupplier: Send + Sync {
    /// Short human-readable name of the source, used in logs.
    fn name(&self) -> String;

    /// Fetches one raw table.
    ///
    /// # Errors
    /// Returns an error if the source cannot be read or does not contain a table.
    async fn fetch(&self) -> Result<RawTable>;
}

/// Supplies a raw table stored as a JSON document on disk.
///
/// Accepts both layouts understood by [`RawTable::from_json`]: an array of
/// records or an object of column arrays. Useful for replaying a saved provider
/// response through the normalizer.
#[derive(Debug, Clone)]
pub struct JsonFileSupplier {
    path: PathBuf,
}

impl JsonFileSupplier {
    /// Creates a supplier reading from `path`. The file is not touched until
    /// [`fetch`](RawTableSupplier::fetch) is called.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl RawTableSupplier for JsonFileSupplier {
    fn name(&self) -> String {
        format!("json file {}", self.path.display())
    }

    async fn fetch(&self) -> Result<RawTable> {
        debug!(path = %self.path.display(), "reading raw table");

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read {}", self.path.display()))?;

        let document: serde_json::Value = serde_json::from_str(&contents)
            .with_context(|| format!("{} is not valid JSON", self.path.display()))?;

        let table = RawTable::from_json(document)
            .with_context(|| format!("{} does not hold a table", self.path.display()))?;

        info!(
            source = %self.name(),
            rows = table.len(),
            columns = ?table.columns(),
            "fetched raw table"
        );

        Ok(table)
    }
}
