//! OpenAI chat-completions client.
//!
//! Single-turn request: the rendered prompt is the sole user message.
//! Temperature is pinned low (determinism over creativity) and the output
//! token budget is capped — the reply is one small JSON object, anything
//! longer is waste. All wire types are private to this module.
//!
//! Connectivity, auth/rate-limit, and malformed-reply failures are told
//! apart here so the log says what actually happened; the caller treats
//! them all the same.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{BackendFailure, BuildError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Fixed sampling temperature for command translation.
const TEMPERATURE: f32 = 0.3;

/// Output budget — the reply contract is one short JSON object.
const MAX_TOKENS: u32 = 500;

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl OpenAiClient {
    /// Build a client for a chat-completions `endpoint`. The key is sent as
    /// `Authorization: Bearer <key>` on every request.
    pub fn new(endpoint: String, model: String, api_key: String) -> Result<Self, BuildError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BuildError::Client(e.to_string()))?;
        Ok(Self { client, endpoint, model, api_key })
    }

    /// One chat round-trip; returns the first choice's message content.
    pub async fn interpret(&self, prompt: &str) -> Result<String, BackendFailure> {
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages: vec![Message { role: "user", content: prompt }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "sending openai request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(url = %self.endpoint, error = %e, "openai request failed (transport)");
                BackendFailure::Unreachable(e.to_string())
            })?;

        let response = check_status(response).await?;

        let parsed = response.json::<ChatCompletionResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize openai response");
            BackendFailure::Malformed(format!("failed to parse response body: {e}"))
        })?;

        debug!(choices = parsed.choices.len(), "received openai response");

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| BackendFailure::Malformed("empty or missing content in response".into()))
    }

    /// Probe the endpoint with a short timeout. Any HTTP reply (including
    /// 4xx) means the server is reachable.
    pub async fn ping(&self) -> Result<(), BackendFailure> {
        let client = Client::builder()
            .timeout(PING_TIMEOUT)
            .build()
            .map_err(|e| BackendFailure::Unreachable(e.to_string()))?;
        client
            .head(&self.endpoint)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| BackendFailure::Unreachable(e.to_string()))
    }
}

// ── Private wire types ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// Error envelope used by OpenAI and compatible APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Consume the response and return it if successful, or classify the HTTP
/// error by status: 401/403 → Auth, 429 → RateLimited, anything else →
/// Malformed.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());
    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(env) => format!("HTTP {status}: {}", env.error.message),
        Err(_) => format!("HTTP {status}: {body}"),
    };
    error!(%status, %message, "openai request returned HTTP error");

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendFailure::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => BackendFailure::RateLimited(message),
        _ => BackendFailure::Malformed(message),
    })
}
