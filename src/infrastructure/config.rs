//! Configuration Module
//!
//! Settings come from built-in defaults, then an optional TOML file, then
//! command-line overrides.
//!
//! ```toml
//! [render]
//! max_chain_length = 256
//!
//! [output]
//! format = "json"
//!
//! [batch]
//! jobs = 4
//! ```

use crate::domain::traversal::{RenderOptions, DEFAULT_MAX_CHAIN_LENGTH};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// How rendered lines are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One backtrace line per output line
    #[default]
    Text,
    /// One JSON object per capture
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StackweaveConfig {
    pub render: RenderSection,
    pub output: OutputSection,
    pub batch: BatchSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSection {
    pub max_chain_length: usize,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            max_chain_length: DEFAULT_MAX_CHAIN_LENGTH,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchSection {
    /// Worker threads for batch rendering; `None` picks from the core count.
    pub jobs: Option<usize>,
}

/// Values given on the command line. `None` keeps the configured value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub max_chain_length: Option<usize>,
    pub format: Option<OutputFormat>,
    pub jobs: Option<usize>,
}

impl StackweaveConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: StackweaveConfig = toml::from_str(content).context("Invalid config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load config {}", path.display()))
    }

    /// Defaults, or the file at `path` when given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn apply(mut self, overrides: &ConfigOverrides) -> Result<Self> {
        if let Some(max) = overrides.max_chain_length {
            self.render.max_chain_length = max;
        }
        if let Some(format) = overrides.format {
            self.output.format = format;
        }
        if let Some(jobs) = overrides.jobs {
            self.batch.jobs = Some(jobs);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.render.max_chain_length == 0 {
            anyhow::bail!("render.max_chain_length must be at least 1");
        }
        if self.batch.jobs == Some(0) {
            anyhow::bail!("batch.jobs must be at least 1");
        }
        Ok(())
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            max_chain_length: self.render.max_chain_length,
        }
    }
}
