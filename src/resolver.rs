//! Memory-image location resolution.
//!
//! The host exposes the image path in several places depending on how the
//! layer stack was built. Resolution is an ordered chain of independent
//! strategies over [`HostContext`]; the first non-empty hit wins and later
//! strategies are never consulted. No caching — the chain runs fresh on
//! every pipeline invocation.

use thiserror::Error;
use tracing::debug;

use crate::host::HostContext;

/// Plugin key used in conventional dotted config paths. Matches the plugin
/// class name the host registers, so existing session trees resolve as-is.
const PLUGIN_KEY: &str = "AIInterpreter";

const FILE_SCHEME: &str = "file://";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("could not find location for layer {0}")]
    NotFound(String),
}

/// Resolve the on-disk memory-image path for the active layer.
///
/// Strategy order (load-bearing, first non-empty wins):
/// 1. nested memory-layer reference via the plugin config tree
/// 2. `memory_layer.location` in the layer's own config
/// 3. conventional dotted-path templates
/// 4. the paired `<primary>_file_layer` object's internal location
pub fn resolve(ctx: &HostContext) -> Result<String, ResolveError> {
    let strategies: [(&str, fn(&HostContext) -> Option<String>); 4] = [
        ("nested-memory-layer", nested_memory_layer),
        ("layer-config-direct", layer_config_direct),
        ("conventional-paths", conventional_paths),
        ("file-layer-attribute", file_layer_attribute),
    ];

    for (name, strategy) in strategies {
        if let Some(found) = strategy(ctx).filter(|v| !v.is_empty()) {
            debug!(strategy = name, location = %found, "memory image location resolved");
            return Ok(strip_file_scheme(found));
        }
    }

    Err(ResolveError::NotFound(ctx.primary_layer.clone()))
}

/// Strip a leading `file://` exactly once; other values pass through.
fn strip_file_scheme(location: String) -> String {
    match location.strip_prefix(FILE_SCHEME) {
        Some(rest) => rest.to_string(),
        None => location,
    }
}

/// The layer's config names a backing memory layer; its resolved location
/// lives in the plugin's branch of the host config tree.
fn nested_memory_layer(ctx: &HostContext) -> Option<String> {
    let layer = ctx.layers.get(&ctx.primary_layer)?;
    let memory_layer = layer.config.get("memory_layer")?;
    let path = format!("plugins.{PLUGIN_KEY}.{memory_layer}.location");
    ctx.config.get(&path).cloned()
}

/// Some stacks inline the location under the layer's own config.
fn layer_config_direct(ctx: &HostContext) -> Option<String> {
    let layer = ctx.layers.get(&ctx.primary_layer)?;
    layer.config.get("memory_layer.location").cloned()
}

/// Probe the small set of conventional dotted paths built from the layer name.
fn conventional_paths(ctx: &HostContext) -> Option<String> {
    let candidates = [
        format!("plugins.{PLUGIN_KEY}.primary.memory_layer.location"),
        format!("layers.{}.location", ctx.primary_layer),
    ];
    candidates
        .iter()
        .find_map(|path| ctx.config.get(path).cloned())
}

/// Last resort: the conventionally-named paired file layer carries the
/// location as an internal attribute.
fn file_layer_attribute(ctx: &HostContext) -> Option<String> {
    let file_layer_name = format!("{}_file_layer", ctx.primary_layer);
    ctx.layers.get(&file_layer_name)?.location.clone()
}
