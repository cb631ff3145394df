//! Configuration management for the quality gate
//!
//! Settings come from an optional TOML file: an explicit `--config` path,
//! otherwise `./quality-gate.toml` when present. Nothing outside the working
//! directory is consulted. Command-line flags override whatever the file
//! says.

use crate::error::ValidationError;
use crate::model::{percentage, DEFAULT_COVERAGE_THRESHOLD};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const LOCAL_CONFIG_FILE: &str = "quality-gate.toml";
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";
pub const DEFAULT_INSIGHT_TIMEOUT_SECS: u64 = 60;

pub const JUNIT_FILE: &str = "junit.xml";
pub const COVERAGE_FILE: &str = "coverage.xml";
pub const MARKDOWN_REPORT_FILE: &str = "ai_report.md";
pub const JSON_REPORT_FILE: &str = "ai_report.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub artifacts_dir: PathBuf,
    /// Defaults to `<artifacts_dir>/junit.xml`
    pub junit_path: Option<PathBuf>,
    /// Defaults to `<artifacts_dir>/coverage.xml`
    pub coverage_path: Option<PathBuf>,
    pub coverage_threshold: f64,
    /// Ask the provider for an AI narrative after the deterministic report
    pub insight: bool,
    pub insight_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            junit_path: None,
            coverage_path: None,
            coverage_threshold: DEFAULT_COVERAGE_THRESHOLD,
            insight: true,
            insight_timeout_secs: DEFAULT_INSIGHT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load config relative to the working directory.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        Self::load_in(explicit, Path::new("."))
    }

    /// Load the explicit file, or `quality-gate.toml` in `dir`, or return
    /// defaults. An explicit path must exist; a broken file is always an
    /// error.
    pub fn load_in(explicit: Option<&Path>, dir: &Path) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let local = dir.join(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Self::from_file(&local);
        }
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        percentage("coverage_threshold", self.coverage_threshold)?;
        Ok(())
    }

    pub fn junit_path(&self) -> PathBuf {
        self.junit_path
            .clone()
            .unwrap_or_else(|| self.artifacts_dir.join(JUNIT_FILE))
    }

    pub fn coverage_path(&self) -> PathBuf {
        self.coverage_path
            .clone()
            .unwrap_or_else(|| self.artifacts_dir.join(COVERAGE_FILE))
    }

    pub fn markdown_report_path(&self) -> PathBuf {
        self.artifacts_dir.join(MARKDOWN_REPORT_FILE)
    }

    pub fn json_report_path(&self) -> PathBuf {
        self.artifacts_dir.join(JSON_REPORT_FILE)
    }
}
