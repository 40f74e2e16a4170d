// src/config.rs
//! Pipeline settings: TOML file with env overrides.
//!
//! The similarity threshold and summary cap come from the original tuning
//! of the pipeline; they are surfaced here instead of being hardcoded, but
//! the defaults are left untouched.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "config/pipeline.toml";
pub const ENV_CONFIG_PATH: &str = "PIPELINE_CONFIG_PATH";
pub const ENV_SIMILARITY_THRESHOLD: &str = "SIMILARITY_THRESHOLD";
pub const ENV_SUMMARY_MAX_CHARS: &str = "SUMMARY_MAX_CHARS";

fn default_similarity_threshold() -> f32 {
    crate::dedup::semantic::DEFAULT_SIMILARITY_THRESHOLD
}
fn default_summary_max_chars() -> usize {
    500
}
fn default_store_capacity() -> usize {
    2_000
}
fn default_ingest_interval_secs() -> u64 {
    0
}

#[derive(Debug, Clone, Deserialize)]
pub struct HarvestSettings {
    /// Cosine similarity at or above which two articles are the same story.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
    /// Description truncation cap, in characters.
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,
    #[serde(default = "default_store_capacity")]
    pub store_capacity: usize,
    /// Scheduler tick in seconds; 0 disables the background runner.
    #[serde(default = "default_ingest_interval_secs")]
    pub ingest_interval_secs: u64,
    /// JSON fixture the scheduler reads emails from, when set.
    #[serde(default)]
    pub fixture_mailbox_path: Option<String>,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            summary_max_chars: default_summary_max_chars(),
            store_capacity: default_store_capacity(),
            ingest_interval_secs: default_ingest_interval_secs(),
            fixture_mailbox_path: None,
        }
    }
}

// Parse an optional float env value and clamp it to <0.0..=1.0>.
fn parse_threshold_env(raw: Option<String>) -> Option<f32> {
    raw.and_then(|v| v.trim().parse::<f32>().ok())
        .map(|v| v.clamp(0.0, 1.0))
}

impl HarvestSettings {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing pipeline settings TOML")
    }

    /// Load from `$PIPELINE_CONFIG_PATH` (or `config/pipeline.toml`),
    /// falling back to defaults when no file exists, then apply env
    /// overrides for the two tuning knobs.
    pub fn load() -> Result<Self> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut settings = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading settings from {}", path.display()))?;
            Self::from_toml_str(&content)?
        } else {
            Self::default()
        };

        if let Some(t) = parse_threshold_env(std::env::var(ENV_SIMILARITY_THRESHOLD).ok()) {
            settings.similarity_threshold = t;
        }
        if let Some(n) = std::env::var(ENV_SUMMARY_MAX_CHARS)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            settings.summary_max_chars = n;
        }

        Ok(settings)
    }
}
