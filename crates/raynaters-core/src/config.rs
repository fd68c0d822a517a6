use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::{Context, Result, anyhow};

use crate::ai::{GeminiClient, ModelBackend, OllamaClient, DEFAULT_OLLAMA_URL};
use crate::provider::Provider;

/// Environment variables checked for a Gemini key, in order.
pub const GEMINI_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub provider: Option<String>,
    pub default_model: Option<String>,
    pub gemini_api_key: Option<String>,
    pub ollama_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// A ready-to-use backend plus the model to ask for.
#[derive(Clone)]
pub struct Connection {
    pub provider: Provider,
    pub backend: Arc<dyn ModelBackend>,
    pub model: String,
}

impl Config {
    pub fn new() -> Self {
        Self {
            provider: Some(Provider::Gemini.as_str().to_string()),
            default_model: None,
            gemini_api_key: None,
            ollama_url: None,
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    /// Load the saved settings, apply `change` and write them back.
    ///
    /// A file that exists but cannot be parsed is an error and is left
    /// untouched.
    pub fn update(change: impl FnOnce(&mut Config) -> Result<()>) -> Result<Config> {
        Self::update_at(&Self::get_config_path()?, change)
    }

    pub fn update_at(config_path: &Path, change: impl FnOnce(&mut Config) -> Result<()>) -> Result<Config> {
        let mut config = Self::load_from(config_path)
            .with_context(|| format!("Could not read {}; fix or remove it first", config_path.display()))?;
        change(&mut config)?;
        config.save_to(config_path)?;
        Ok(config)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("raynaters").join("config.json"))
    }

    pub fn provider(&self) -> Result<Provider> {
        match &self.provider {
            None => Ok(Provider::Gemini),
            Some(name) => Provider::from_str(name)
                .ok_or_else(|| anyhow!("Unknown provider '{}' in config", name)),
        }
    }

    /// Gemini key from the environment first, then the config file.
    pub fn gemini_key(&self) -> Option<String> {
        self.gemini_key_with(|var| std::env::var(var).ok())
    }

    fn gemini_key_with(&self, env: impl Fn(&str) -> Option<String>) -> Option<String> {
        GEMINI_KEY_VARS
            .iter()
            .find_map(|var| env(var))
            .or_else(|| self.gemini_api_key.clone())
            .filter(|key| !key.trim().is_empty())
    }

    /// Pick the model: explicit override, then the saved default when it
    /// belongs to the selected provider, then the provider's default.
    pub fn model_for(&self, provider: Provider, model_override: Option<&str>) -> String {
        if let Some(model) = model_override {
            return model.to_string();
        }
        let configured_provider = self.provider().ok();
        match &self.default_model {
            Some(model) if configured_provider == Some(provider) => model.clone(),
            _ => provider.default_model().to_string(),
        }
    }

    pub fn connect(&self, provider_override: Option<Provider>, model_override: Option<&str>) -> Result<Connection> {
        let provider = match provider_override {
            Some(provider) => provider,
            None => self.provider()?,
        };
        let model = self.model_for(provider, model_override);

        let backend: Arc<dyn ModelBackend> = match provider {
            Provider::Gemini => {
                let key = self.gemini_key().ok_or_else(|| {
                    anyhow!("Gemini API key not configured. Set GEMINI_API_KEY or run: raynaters config set-key <KEY>")
                })?;
                Arc::new(GeminiClient::new(&key))
            }
            Provider::Ollama => {
                let url = self.ollama_url.as_deref().unwrap_or(DEFAULT_OLLAMA_URL);
                Arc::new(OllamaClient::new(url))
            }
        };

        Ok(Connection {
            provider,
            backend,
            model,
        })
    }
}
