//! Ollama client (`/api/generate`).
//!
//! Non-streaming generation against a local inference daemon. The command
//! JSON the pipeline wants is embedded in the `response` text field; the
//! extraction layer deals with it, this client only moves text.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{BackendFailure, BuildError};

/// Hard bound on one generation round-trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const PING_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaClient {
    /// Build a client for `endpoint` (e.g. `http://localhost:11434`).
    pub fn new(endpoint: String, model: String) -> Result<Self, BuildError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BuildError::Client(e.to_string()))?;
        Ok(Self { client, endpoint, model })
    }

    /// One non-streaming generation request; returns the raw reply text.
    pub async fn interpret(&self, prompt: &str) -> Result<String, BackendFailure> {
        let url = format!("{}/api/generate", self.endpoint);
        let payload = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "sending ollama request");

        let response = self.client.post(&url).json(&payload).send().await.map_err(|e| {
            error!(url = %url, error = %e, "ollama request failed (transport)");
            BackendFailure::Unreachable(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, "ollama returned HTTP error");
            return Err(BackendFailure::Malformed(format!("HTTP {status}: {body}")));
        }

        let parsed = response.json::<GenerateResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize ollama response");
            BackendFailure::Malformed(format!("failed to parse response body: {e}"))
        })?;

        debug!(reply_len = parsed.response.len(), "received ollama response");
        Ok(parsed.response)
    }

    /// Probe `/api/tags` with a short timeout. Any HTTP reply counts as
    /// reachable; only transport failures do not.
    pub async fn ping(&self) -> Result<(), BackendFailure> {
        let client = Client::builder()
            .timeout(PING_TIMEOUT)
            .build()
            .map_err(|e| BackendFailure::Unreachable(e.to_string()))?;
        let url = format!("{}/api/tags", self.endpoint);
        client
            .get(&url)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| BackendFailure::Unreachable(e.to_string()))
    }
}

// ── Private wire types ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_wire_shape() {
        let payload = GenerateRequest {
            model: "llama3",
            prompt: "hello",
            stream: false,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["model"], "llama3");
        assert_eq!(json["prompt"], "hello");
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn response_field_is_optional() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.response.is_empty());
        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"response": "text", "done": true}"#).unwrap();
        assert_eq!(parsed.response, "text");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_failure() {
        // Reserved TEST-NET-1 address — nothing listens there.
        let c = OllamaClient::new("http://192.0.2.1:11434".into(), "llama3".into()).unwrap();
        let client = Client::builder()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let c = OllamaClient { client, ..c };
        match c.interpret("prompt").await {
            Err(BackendFailure::Unreachable(_)) => {}
            other => panic!("expected Unreachable, got {other:?}"),
        }
    }
}
