/// Runtime configuration
///
/// Defaults reproduce the stock dashboard: `smoking.csv` in the working
/// directory, top 10 countries, the standard column names. Environment
/// variables override the defaults.
use crate::aggregate::DEFAULT_TOP_N;
use crate::error::{DashboardError, Result};
use crate::schema::CsvLayout;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DATA_ENV: &str = "SMOKESTATS_DATA";
pub const TOP_N_ENV: &str = "SMOKESTATS_TOP_N";
pub const DEFAULT_DATA_PATH: &str = "smoking.csv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    pub top_n: usize,
    #[serde(default)]
    pub layout: CsvLayout,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            top_n: DEFAULT_TOP_N,
            layout: CsvLayout::default(),
        }
    }
}

impl DashboardConfig {
    /// Defaults overridden by `SMOKESTATS_DATA` and `SMOKESTATS_TOP_N`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = DashboardConfig::default();

        if let Some(path) = lookup(DATA_ENV) {
            config.data_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(TOP_N_ENV) {
            config.top_n = raw.parse().map_err(|_| {
                DashboardError::config(format!(
                    "{} must be a non-negative integer, got '{}'",
                    TOP_N_ENV, raw
                ))
            })?;
        }

        Ok(config)
    }
}
