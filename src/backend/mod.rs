//! AI backend abstraction.
//!
//! `Backend` is an enum over concrete client implementations — enum dispatch
//! avoids `dyn` trait objects and the `async-trait` dependency. Adding a
//! backend = new module + new variant + new match arms.
//!
//! `build(config, api_key)` is the registry: it constructs the variant the
//! config selects, and the OpenAI variant simply does not exist without a
//! credential — there is no runtime "is the key set" flag downstream.
//!
//! Failure kinds are distinguished for logging only; the pipeline collapses
//! every [`BackendFailure`] to the Unknown response sentinel.

pub mod ollama;
pub mod openai;

use thiserror::Error;

use crate::config::BackendConfig;

// ── Errors ───────────────────────────────────────────────────────────────────

/// Why a backend call produced no usable text.
#[derive(Debug, Error)]
pub enum BackendFailure {
    #[error("backend unreachable: {0}")]
    Unreachable(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("malformed reply: {0}")]
    Malformed(String),
}

/// Why the registry could not construct a backend.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("unknown backend: {0}")]
    UnknownBackend(String),
    #[error("openai backend requires an API key (set VOLNL_API_KEY)")]
    MissingCredential,
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

// ── Backend enum ─────────────────────────────────────────────────────────────

/// All available backend clients.
#[derive(Debug, Clone)]
pub enum Backend {
    Ollama(ollama::OllamaClient),
    OpenAi(openai::OpenAiClient),
}

impl Backend {
    /// Send `prompt` to the backend and return its raw text reply.
    pub async fn interpret(&self, prompt: &str) -> Result<String, BackendFailure> {
        match self {
            Backend::Ollama(c) => c.interpret(prompt).await,
            Backend::OpenAi(c) => c.interpret(prompt).await,
        }
    }

    /// Lightweight reachability probe of the configured endpoint.
    pub async fn ping(&self) -> Result<(), BackendFailure> {
        match self {
            Backend::Ollama(c) => c.ping().await,
            Backend::OpenAi(c) => c.ping().await,
        }
    }

    /// Backend name as selected in config.
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Ollama(_) => "ollama",
            Backend::OpenAi(_) => "openai",
        }
    }
}

/// Construct a [`Backend`] from config and an optional API key.
///
/// `api_key` is sourced from the `VOLNL_API_KEY` env (never TOML) and is
/// `None` for the keyless local backend.
pub fn build(config: &BackendConfig, api_key: Option<String>) -> Result<Backend, BuildError> {
    match config.default.as_str() {
        "ollama" => {
            let c = &config.ollama;
            Ok(Backend::Ollama(ollama::OllamaClient::new(
                c.endpoint.clone(),
                c.model.clone(),
            )?))
        }
        "openai" => {
            let key = api_key.ok_or(BuildError::MissingCredential)?;
            let c = &config.openai;
            Ok(Backend::OpenAi(openai::OpenAiClient::new(
                c.endpoint.clone(),
                c.model.clone(),
                key,
            )?))
        }
        other => Err(BuildError::UnknownBackend(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn builds_ollama_without_key() {
        let config = Config::test_default();
        let backend = build(&config.backend, None).unwrap();
        assert_eq!(backend.name(), "ollama");
    }

    #[test]
    fn openai_without_key_is_absent_from_registry() {
        let mut config = Config::test_default();
        config.backend.default = "openai".into();
        assert!(matches!(
            build(&config.backend, None),
            Err(BuildError::MissingCredential)
        ));
    }

    #[test]
    fn openai_with_key_builds() {
        let mut config = Config::test_default();
        config.backend.default = "openai".into();
        let backend = build(&config.backend, Some("sk-test".into())).unwrap();
        assert_eq!(backend.name(), "openai");
    }

    #[test]
    fn unknown_backend_rejected() {
        let mut config = Config::test_default();
        config.backend.default = "claude".into();
        assert!(matches!(
            build(&config.backend, None),
            Err(BuildError::UnknownBackend(name)) if name == "claude"
        ));
    }
}
