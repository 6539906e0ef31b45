//! AI response model and JSON extraction.
//!
//! Backends return free text that should contain one JSON object matching
//! the reply contract from [`crate::prompt`]. [`extract`] pulls the first
//! balanced `{...}` span out of that text and parses it; anything that goes
//! wrong collapses to the [`AiResponse::unknown`] sentinel so the pipeline
//! never has to distinguish "no reply" from "garbled reply".

use serde::Deserialize;
use tracing::warn;

/// Backend's self-reported certainty about its suggested command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    High,
    Low,
}

/// Parsed command suggestion from the AI backend.
///
/// Produced once per pipeline run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiResponse {
    /// Volatility version the backend claims the command targets.
    pub volatility_version: String,
    /// Suggested command, usually containing the `<MEMORY_FILE>` placeholder.
    pub command: String,
    pub confidence: Confidence,
}

impl AiResponse {
    /// Sentinel for any extraction, parsing, or network failure.
    pub fn unknown() -> Self {
        Self {
            volatility_version: "unknown".to_string(),
            command: String::new(),
            confidence: Confidence::Low,
        }
    }
}

// Wire shape — field absence degrades to the sentinel values rather than
// failing the whole parse.
#[derive(Deserialize)]
struct RawAiResponse {
    #[serde(default = "default_version")]
    volatility_version: String,
    #[serde(default)]
    command: String,
    #[serde(default = "default_confidence")]
    confidence: String,
}

fn default_version() -> String {
    "unknown".to_string()
}

fn default_confidence() -> String {
    "low".to_string()
}

impl From<RawAiResponse> for AiResponse {
    fn from(raw: RawAiResponse) -> Self {
        // Only the exact string "high" counts; everything else is Low.
        let confidence = if raw.confidence == "high" {
            Confidence::High
        } else {
            Confidence::Low
        };
        Self {
            volatility_version: raw.volatility_version,
            command: raw.command,
            confidence,
        }
    }
}

/// Extract the first balanced JSON object from `raw` and parse it.
///
/// Locates the first `{` and the last `}`; if both exist in that order the
/// inclusive substring is parsed as JSON. No lenient repair is attempted —
/// any failure yields [`AiResponse::unknown`].
pub fn extract(raw: &str) -> AiResponse {
    let Some(start) = raw.find('{') else {
        warn!("backend reply contained no JSON object");
        return AiResponse::unknown();
    };
    let Some(end) = raw.rfind('}') else {
        warn!("backend reply contained no closing brace");
        return AiResponse::unknown();
    };
    if end < start {
        warn!("backend reply braces out of order");
        return AiResponse::unknown();
    }

    // A type-mismatched field (e.g. a numeric "confidence") fails the whole
    // parse and collapses to the sentinel, dropping the suggested command.
    // Deliberate: a reply that breaks the contract's types gets no partial
    // salvage.
    match serde_json::from_str::<RawAiResponse>(&raw[start..=end]) {
        Ok(parsed) => parsed.into(),
        Err(e) => {
            warn!(error = %e, "failed to parse JSON span from backend reply");
            AiResponse::unknown()
        }
    }
}
