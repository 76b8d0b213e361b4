//! Configuration loading for PharmLens.
//! Reads pharmlens.toml from the current directory or the path in PHARMLENS_CONFIG.
//! The Gemini credential is only ever taken from the environment (GEMINI_API_KEY).

use std::path::Path;

use anyhow::Context;
use pharmlens_llm::gemini::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

pub const CONFIG_PATH_ENV: &str = "PHARMLENS_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "pharmlens.toml";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const MODEL_ENV: &str = "PHARMLENS_GEMINI_MODEL";

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(skip, default = "empty_secret")]
    pub api_key: SecretString,
}

fn empty_secret() -> SecretString { SecretString::from(String::new()) }

impl Default for Config {
    fn default() -> Self {
        Self { llm: LlmConfig::default(), api_key: empty_secret() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model()        -> String { DEFAULT_GEMINI_MODEL.to_string() }
fn default_base_url()     -> String { DEFAULT_GEMINI_BASE_URL.to_string() }
fn default_timeout_secs() -> u64    { 30 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}


impl Config {
    /// Load configuration for the current process.
    /// Reads `.env` if present, then the TOML file (PHARMLENS_CONFIG, else
    /// ./pharmlens.toml when it exists, else defaults), then environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let explicit = std::env::var(CONFIG_PATH_ENV).ok();
        let path = explicit.clone().unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        let mut config = if Path::new(&path).exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {path}"))?;
            Self::from_toml_str(&content).with_context(|| format!("parsing {path}"))?
        } else if explicit.is_some() {
            anyhow::bail!("Config file not found: {} (set by {})", path, CONFIG_PATH_ENV);
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment, no file.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-style overrides from `lookup`.
    /// A missing credential is not an error: calls are still attempted and fall back.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(model) = lookup(MODEL_ENV).filter(|m| !m.trim().is_empty()) {
            self.llm.model = model;
        }

        let key = lookup(API_KEY_ENV).unwrap_or_default();
        if key.is_empty() {
            tracing::warn!("{} is not set; explanations will use the fallback templates", API_KEY_ENV);
        }
        self.api_key = SecretString::from(key);
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.llm.model.trim().is_empty() {
            anyhow::bail!("llm.model must not be empty");
        }
        if self.llm.base_url.trim().is_empty() {
            anyhow::bail!("llm.base_url must not be empty");
        }
        if self.llm.timeout_secs == 0 {
            anyhow::bail!("llm.timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.expose_secret().is_empty()
    }
}
