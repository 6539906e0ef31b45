//! Host-supplied configuration tree.
//!
//! The pipeline does not own any of this data — in a real deployment the
//! plugin framework hands over its layer table and flat dotted-key config
//! tree. The binary stands in for that framework by loading a session TOML
//! with the same shape:
//!
//! ```toml
//! primary = "primary"
//!
//! [config]
//! "layers.primary.location" = "file:///cases/mem.raw"
//!
//! [layers.primary.config]
//! memory_layer = "memory_layer"
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::AppError;

/// One translation or file layer as the host exposes it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayerObject {
    /// Layer-local configuration entries.
    #[serde(default)]
    pub config: HashMap<String, String>,
    /// Internal location attribute — present on file layers only.
    #[serde(default)]
    pub location: Option<String>,
}

/// Snapshot of the host configuration consumed by one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct HostContext {
    /// Name of the active (primary) memory layer.
    pub primary_layer: String,
    /// Layer objects keyed by layer name.
    pub layers: HashMap<String, LayerObject>,
    /// Flat dotted-key configuration tree.
    pub config: HashMap<String, String>,
}

#[derive(Deserialize)]
struct RawSession {
    primary: String,
    #[serde(default)]
    layers: HashMap<String, LayerObject>,
    #[serde(default)]
    config: HashMap<String, String>,
}

impl HostContext {
    /// Parse a session context from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, AppError> {
        let raw: RawSession = toml::from_str(text)
            .map_err(|e| AppError::Session(format!("session parse error: {e}")))?;
        if raw.primary.is_empty() {
            return Err(AppError::Session("primary layer name is empty".into()));
        }
        Ok(Self {
            primary_layer: raw.primary,
            layers: raw.layers,
            config: raw.config,
        })
    }

    /// Load a session context from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path)
            .map_err(|e| AppError::Session(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_full_session() {
        let text = r#"
primary = "primary"

[config]
"layers.primary.location" = "file:///tmp/mem.raw"
"plugins.AIInterpreter.memory_layer.location" = "/cases/mem.raw"

[layers.primary.config]
memory_layer = "memory_layer"

[layers.primary_file_layer]
location = "file:///tmp/other.raw"
"#;
        let ctx = HostContext::from_toml_str(text).unwrap();
        assert_eq!(ctx.primary_layer, "primary");
        assert_eq!(
            ctx.config.get("layers.primary.location").unwrap(),
            "file:///tmp/mem.raw"
        );
        assert_eq!(
            ctx.layers["primary"].config.get("memory_layer").unwrap(),
            "memory_layer"
        );
        assert_eq!(
            ctx.layers["primary_file_layer"].location.as_deref(),
            Some("file:///tmp/other.raw")
        );
    }

    #[test]
    fn empty_primary_rejected() {
        assert!(HostContext::from_toml_str("primary = \"\"").is_err());
    }

    #[test]
    fn missing_tables_default_empty() {
        let ctx = HostContext::from_toml_str("primary = \"p\"").unwrap();
        assert!(ctx.layers.is_empty());
        assert!(ctx.config.is_empty());
    }

    #[test]
    fn loads_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "primary = \"p\"").unwrap();
        let ctx = HostContext::from_path(f.path()).unwrap();
        assert_eq!(ctx.primary_layer, "p");
    }

    #[test]
    fn unreadable_file_is_session_error() {
        let err = HostContext::from_path(Path::new("/nonexistent/session.toml")).unwrap_err();
        assert!(err.to_string().contains("session error"));
    }
}
