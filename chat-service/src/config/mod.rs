use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub openai: OpenAiSettings,
    pub backend: BackendSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiSettings {
    pub api_key: String,
    /// Model for tool selection and reply generation (e.g., gpt-4-turbo-preview)
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    /// Base URL of the task backend.
    pub base_url: String,
    /// Request timeout for backend calls, in seconds.
    pub timeout_seconds: u64,
}

impl ChatConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(ChatConfig {
            common,
            openai: OpenAiSettings {
                api_key: get_env("OPENAI_API_KEY", None, is_prod)?,
                model: get_env("OPENAI_MODEL", Some("gpt-4-turbo-preview"), is_prod)?,
            },
            backend: BackendSettings {
                base_url: get_env("BACKEND_API_URL", Some("http://localhost:8000"), is_prod)?,
                timeout_seconds: get_env("BACKEND_API_TIMEOUT", Some("30"), is_prod)?
                    .parse()
                    .unwrap_or(30),
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
