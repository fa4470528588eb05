use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::PriceAgentError;

/// Main configuration structure, built once at process start and shared by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    /// Backend used for filter synthesis (function calling).
    pub filter_llm: LlmBackendConfig,
    /// Backend used for the grounded answer.
    pub answer_llm: LlmBackendConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub base_url: String,
    pub api_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmBackendConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    #[serde(default)]
    pub api_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub connect_timeout_seconds: u64,
}

impl Config {
    /// Load configuration from file with environment variable overrides.
    /// Always returns a config; problems are logged and reported by `validate`.
    pub fn load() -> Self {
        for path in [".env", "../.env"] {
            if dotenvy::from_path(path).is_ok() {
                tracing::info!("Loaded .env from: {}", path);
                break;
            }
        }

        let config_path =
            env::var("PRICE_AGENT_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            match fs::read_to_string(&config_path) {
                Ok(contents) => match serde_yaml::from_str::<Config>(&contents) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from {}", config_path);
                        config
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to parse config file {}: {} - using defaults",
                            config_path,
                            e
                        );
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::error!(
                        "Failed to read config file {}: {} - using defaults",
                        config_path,
                        e
                    );
                    Self::default()
                }
            }
        } else {
            tracing::debug!("Config file not found at {} - using defaults", config_path);
            Self::default()
        };

        config.apply_overrides(|key| env::var(key).ok());

        if let Err(e) = config.validate() {
            tracing::warn!("Config validation warnings: {} - continuing anyway", e);
        }

        config
    }

    /// Apply overrides from a variable lookup (the process environment in `load`).
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("PRICE_AGENT_BIND") {
            self.server.bind = bind;
        }

        if let Some(url) = lookup("PRICE_CATALOG_URL") {
            self.catalog.base_url = url;
        }
        if let Some(version) = lookup("PRICE_CATALOG_API_VERSION") {
            self.catalog.api_version = version;
        }

        // Shared settings first so the per-stage variables win
        for backend in [&mut self.filter_llm, &mut self.answer_llm] {
            if let Some(url) = lookup("OPENAI_API_BASE_URL") {
                backend.base_url = url;
            }
            if let Some(key) = lookup("GITHUB_TOKEN") {
                backend.api_key = key;
            }
            if let Some(model) = lookup("MODEL_NAME") {
                backend.model = model;
            }
        }
        Self::apply_backend_overrides(&mut self.filter_llm, "FILTER_LLM", &lookup);
        Self::apply_backend_overrides(&mut self.answer_llm, "ANSWER_LLM", &lookup);

        if let Some(timeout) = lookup("HTTP_CONNECT_TIMEOUT_SECONDS") {
            if let Ok(secs) = timeout.parse() {
                self.http.connect_timeout_seconds = secs;
            }
        }
    }

    fn apply_backend_overrides<F>(backend: &mut LlmBackendConfig, prefix: &str, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(&format!("{prefix}_BASE_URL")) {
            backend.base_url = url;
        }
        if let Some(key) = lookup(&format!("{prefix}_API_KEY")) {
            backend.api_key = key;
        }
        if let Some(model) = lookup(&format!("{prefix}_MODEL")) {
            backend.model = model;
        }
        if let Some(version) = lookup(&format!("{prefix}_API_VERSION")) {
            backend.api_version = Some(version).filter(|v| !v.is_empty());
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), PriceAgentError> {
        if self.server.bind.parse::<SocketAddr>().is_err() {
            return Err(PriceAgentError::Config(format!(
                "server.bind '{}' is not a host:port address",
                self.server.bind
            )));
        }
        if self.catalog.base_url.is_empty() {
            return Err(PriceAgentError::Config(
                "catalog.base_url must be set".to_string(),
            ));
        }
        for (name, backend) in [("filter_llm", &self.filter_llm), ("answer_llm", &self.answer_llm)]
        {
            if backend.base_url.is_empty() {
                return Err(PriceAgentError::Config(format!(
                    "{name}.base_url must be set"
                )));
            }
            if backend.api_key.is_empty() {
                return Err(PriceAgentError::Config(format!(
                    "{name}.api_key must be set"
                )));
            }
            if backend.model.is_empty() {
                return Err(PriceAgentError::Config(format!("{name}.model must be set")));
            }
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.http.connect_timeout_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind: "127.0.0.1:3000".to_string(),
            },
            catalog: CatalogConfig {
                base_url: "https://prices.azure.com/api/retail/prices".to_string(),
                api_version: "2023-01-01-preview".to_string(),
            },
            filter_llm: LlmBackendConfig {
                base_url: "https://models.inference.ai.azure.com".to_string(),
                api_key: String::new(),
                model: "gpt-4o".to_string(),
                api_version: None,
            },
            answer_llm: LlmBackendConfig {
                base_url: "https://models.inference.ai.azure.com".to_string(),
                api_key: String::new(),
                model: "gpt-4o-mini".to_string(),
                api_version: None,
            },
            http: HttpConfig {
                connect_timeout_seconds: 10,
            },
        }
    }
}
