//! Runtime configuration.
//!
//! [`LockDiffConfig`] is read from a JSON document in which every field is
//! optional, e.g.
//!
//! ```json
//! {
//!   "include_unchanged": false,
//!   "section_precedence": "prod_first",
//!   "report_format": "markdown",
//!   "asset_name_prefix": "app.cld.",
//!   "load_timeout_secs": 10,
//!   "concurrency_limit": 4
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::executor::DiffExecutor;
use crate::lockdiff::differ::{DifferOptions, LockDiffer, SectionPrecedence};
use crate::lockdiff::formats::{FormatReporter, ReportFormat};
use crate::lockdiff::pipeline::LockDiffPipeline;
use crate::traits::SnapshotSource;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockDiffConfig {
    /// Keep rows for packages identical on both sides (default: true)
    pub include_unchanged: bool,

    pub section_precedence: SectionPrecedence,

    pub report_format: ReportFormat,

    /// Prepended to asset keys of pipeline results
    pub asset_name_prefix: String,

    /// Per-document read timeout (default: 30)
    pub load_timeout_secs: u64,

    /// Lock files diffed in parallel by [`DiffExecutor`] (default: 4)
    pub concurrency_limit: usize,
}

impl Default for LockDiffConfig {
    fn default() -> Self {
        Self {
            include_unchanged: true,
            section_precedence: SectionPrecedence::default(),
            report_format: ReportFormat::default(),
            asset_name_prefix: String::new(),
            load_timeout_secs: 30,
            concurrency_limit: 4,
        }
    }
}

impl LockDiffConfig {
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(bytes)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        Self::from_json_slice(&bytes)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency_limit == 0 {
            return Err(ConfigError::Invalid(
                "concurrency_limit must be greater than 0".to_string(),
            ));
        }
        if self.load_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "load_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }

    pub fn differ(&self) -> LockDiffer {
        LockDiffer::with_options(DifferOptions {
            include_unchanged: self.include_unchanged,
            section_precedence: self.section_precedence,
        })
    }

    pub fn reporter(&self) -> FormatReporter {
        self.report_format.reporter()
    }

    pub fn pipeline<S>(&self, source: S, lock_path: impl Into<String>) -> LockDiffPipeline<S, FormatReporter>
    where
        S: SnapshotSource,
    {
        LockDiffPipeline::new(source, lock_path)
            .with_reporter(self.reporter())
            .with_differ(self.differ())
            .with_timeout(self.load_timeout())
            .with_asset_name_prefix(self.asset_name_prefix.clone())
    }

    pub fn executor(&self) -> DiffExecutor {
        DiffExecutor::new(self.concurrency_limit)
            .with_differ(self.differ())
            .with_timeout(self.load_timeout())
    }
}
