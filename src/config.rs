//! Configuration file support for firmlens.
//!
//! Provides YAML-based configuration through `firmlens.config.yml` files,
//! including data structures, file loading, and validation. Every field is
//! optional; absent fields fall back to the built-in defaults.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::application::use_cases::{CorrelationSettings, PipelineSettings};
use crate::shared::Result;

const CONFIG_FILENAME: &str = "firmlens.config.yml";

/// Top-level configuration file schema.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub format: Option<String>,
    /// Upload size cap in megabytes.
    pub max_payload_mb: Option<u64>,
    /// Accepted firmware file extensions, without the leading dot.
    pub allowed_extensions: Option<Vec<String>>,
    /// Concurrent advisory lookups.
    pub concurrency: Option<usize>,
    pub lookup_timeout_secs: Option<u64>,
    pub extraction_timeout_secs: Option<u64>,
    pub retry_budget: Option<u32>,
    pub cache_ttl_secs: Option<u64>,
    pub negative_cache_ttl_secs: Option<u64>,
    /// Alternate NVD endpoint (mirrors, testing).
    pub nvd_endpoint: Option<String>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml::Value>,
}

impl ConfigFile {
    /// Pipeline settings with config overrides applied over the defaults.
    pub fn pipeline_settings(&self) -> PipelineSettings {
        let mut settings = PipelineSettings::default();
        if let Some(mb) = self.max_payload_mb {
            settings.limits.max_payload_bytes = mb * 1024 * 1024;
        }
        if let Some(ref extensions) = self.allowed_extensions {
            settings.limits.allowed_extensions = extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect();
        }
        if let Some(secs) = self.extraction_timeout_secs {
            settings.extraction_timeout = Duration::from_secs(secs);
        }
        settings
    }

    /// Correlation settings with config overrides applied over the defaults.
    pub fn correlation_settings(&self) -> CorrelationSettings {
        let mut settings = CorrelationSettings::default();
        if let Some(concurrency) = self.concurrency {
            settings.concurrency = concurrency;
        }
        if let Some(secs) = self.lookup_timeout_secs {
            settings.lookup_timeout = Duration::from_secs(secs);
        }
        if let Some(budget) = self.retry_budget {
            settings.retry_budget = budget;
        }
        settings
    }

    /// (positive, negative) cache TTLs.
    pub fn cache_ttls(&self) -> (Duration, Duration) {
        (
            Duration::from_secs(self.cache_ttl_secs.unwrap_or(3600)),
            Duration::from_secs(self.negative_cache_ttl_secs.unwrap_or(300)),
        )
    }
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display()
        )
    })?;

    let config: ConfigFile = serde_yaml::from_str(&content).with_context(|| {
        format!(
            "Failed to parse config file: {}\n\n💡 Hint: Ensure the file contains valid YAML syntax.",
            path.display()
        )
    })?;

    validate_config(&config)?;
    warn_unknown_fields(&config);

    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

/// Validate the loaded configuration.
fn validate_config(config: &ConfigFile) -> Result<()> {
    if config.concurrency == Some(0) {
        bail!(
            "Invalid config: concurrency must be at least 1.\n\n\
             💡 Hint: Remove the field to use the default worker pool width."
        );
    }
    if config.max_payload_mb == Some(0) {
        bail!(
            "Invalid config: max_payload_mb must be at least 1.\n\n\
             💡 Hint: Remove the field to use the default 256 MB cap."
        );
    }
    if let Some(ref extensions) = config.allowed_extensions {
        if extensions.is_empty() || extensions.iter().any(|e| e.trim_start_matches('.').is_empty())
        {
            bail!(
                "Invalid config: allowed_extensions must list non-empty extensions.\n\n\
                 💡 Hint: Each entry should look like \"bin\" or \".img\"."
            );
        }
    }
    Ok(())
}

/// Warn about unknown fields in the config file.
fn warn_unknown_fields(config: &ConfigFile) {
    for key in config.unknown_fields.keys() {
        eprintln!(
            "⚠️  Warning: Unknown config field '{}' will be ignored.",
            key
        );
    }
}
