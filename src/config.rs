// ⚙️ Pipeline Configuration
// Built-in defaults, optionally overlaid by a TOML file, then by CLI flags.

use crate::records::DEFAULT_LOAN_PERIOD;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub loans_input: PathBuf,
    pub members_input: PathBuf,
    pub loans_output: PathBuf,
    pub members_output: PathBuf,
    pub database: PathBuf,
    pub save_to_db: bool,
    /// Days a loan may run before it is overdue
    pub loan_period: i64,
    /// Audit log, appended to on every run
    pub log_file: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            loans_input: PathBuf::from("03_Library Systembook.csv"),
            members_input: PathBuf::from("03_Library SystemCustomers.csv"),
            loans_output: PathBuf::from("03_Library Systembook_cleaned.csv"),
            members_output: PathBuf::from("03_Library SystemCustomers_cleaned.csv"),
            database: PathBuf::from("library_system.db"),
            save_to_db: false,
            loan_period: DEFAULT_LOAN_PERIOD,
            log_file: PathBuf::from("library_cleaning.log"),
        }
    }
}

impl PipelineConfig {
    /// Keys missing from the file keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PipelineConfig =
            toml::from_str(content).context("Failed to parse pipeline configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file '{}'", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.loan_period < 0 {
            anyhow::bail!("loan_period must not be negative, got {}", self.loan_period);
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
