//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or an explicit `-f` path), then applies `VOLNL_LOG_LEVEL` and
//! `VOLNL_BACKEND` env overrides. The OpenAI API key comes only from the
//! `VOLNL_API_KEY` env var — never from TOML.

use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::AppError;

// ── Resolved types ───────────────────────────────────────────────────────────

/// Ollama backend configuration (`[backend.ollama]`).
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Daemon base URL, no trailing slash.
    pub endpoint: String,
    pub model: String,
}

/// OpenAI backend configuration (`[backend.openai]`).
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat-completions endpoint URL.
    pub endpoint: String,
    pub model: String,
}

/// Backend selection and per-backend settings.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Which backend is active (`"ollama"` or `"openai"`). Named `default`
    /// in the TOML to signal that both sections can coexist.
    pub default: String,
    pub ollama: OllamaConfig,
    pub openai: OpenAiConfig,
}

/// Fully-resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub backend: BackendConfig,
    /// API key from `VOLNL_API_KEY` — `None` for the keyless local backend.
    /// Never sourced from TOML.
    pub api_key: Option<String>,
}

// ── Raw TOML shape ───────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    interpreter: RawInterpreter,
    #[serde(default)]
    backend: RawBackend,
}

#[derive(Deserialize)]
struct RawInterpreter {
    #[serde(default = "default_log_level")]
    log_level: String,
}

impl Default for RawInterpreter {
    fn default() -> Self {
        Self { log_level: default_log_level() }
    }
}

#[derive(Deserialize)]
struct RawBackend {
    #[serde(default = "default_backend")]
    default: String,
    #[serde(default)]
    ollama: RawOllama,
    #[serde(default)]
    openai: RawOpenAi,
}

impl Default for RawBackend {
    fn default() -> Self {
        Self {
            default: default_backend(),
            ollama: RawOllama::default(),
            openai: RawOpenAi::default(),
        }
    }
}

#[derive(Deserialize)]
struct RawOllama {
    #[serde(default = "default_ollama_endpoint")]
    endpoint: String,
    #[serde(default = "default_ollama_model")]
    model: String,
}

impl Default for RawOllama {
    fn default() -> Self {
        Self {
            endpoint: default_ollama_endpoint(),
            model: default_ollama_model(),
        }
    }
}

#[derive(Deserialize)]
struct RawOpenAi {
    #[serde(default = "default_openai_endpoint")]
    endpoint: String,
    #[serde(default = "default_openai_model")]
    model: String,
}

impl Default for RawOpenAi {
    fn default() -> Self {
        Self {
            endpoint: default_openai_endpoint(),
            model: default_openai_model(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_backend() -> String {
    "ollama".to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

// ── Loading ──────────────────────────────────────────────────────────────────

/// Load config from `config_path`, or `config/default.toml`, then apply
/// env-var overrides. A missing default file yields built-in defaults.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let raw = match config_path {
        Some(path) => parse_file(Path::new(path))?,
        None => {
            let default_path = Path::new("config/default.toml");
            if default_path.exists() {
                parse_file(default_path)?
            } else {
                RawConfig::default()
            }
        }
    };
    Ok(resolve(raw))
}

fn parse_file(path: &Path) -> Result<RawConfig, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
    toml::from_str(&text)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))
}

fn resolve(raw: RawConfig) -> Config {
    let log_level = env::var("VOLNL_LOG_LEVEL").unwrap_or(raw.interpreter.log_level);
    let backend_default = env::var("VOLNL_BACKEND").unwrap_or(raw.backend.default);
    let api_key = env::var("VOLNL_API_KEY").ok().filter(|k| !k.is_empty());

    Config {
        log_level,
        backend: BackendConfig {
            default: backend_default,
            ollama: OllamaConfig {
                endpoint: raw.backend.ollama.endpoint,
                model: raw.backend.ollama.model,
            },
            openai: OpenAiConfig {
                endpoint: raw.backend.openai.endpoint,
                model: raw.backend.openai.model,
            },
        },
        api_key,
    }
}

#[cfg(test)]
impl Config {
    /// Safe `Config` for unit tests — local backend, no API key.
    pub fn test_default() -> Self {
        Self {
            log_level: "info".into(),
            backend: BackendConfig {
                default: "ollama".into(),
                ollama: OllamaConfig {
                    endpoint: default_ollama_endpoint(),
                    model: default_ollama_model(),
                },
                openai: OpenAiConfig {
                    endpoint: default_openai_endpoint(),
                    model: default_openai_model(),
                },
            },
            api_key: None,
        }
    }
}
