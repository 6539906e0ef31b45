//! Prompt rendering for the command-translation request.
//!
//! The instruction template is fixed; only the user query varies. The
//! template pins down the reply contract the rest of the pipeline depends
//! on: a single JSON object, version claim "3", the `<MEMORY_FILE>`
//! placeholder, and an explicit high/low confidence field.

/// Literal marker the model must use in place of the memory-image path.
pub const MEMORY_FILE_PLACEHOLDER: &str = "<MEMORY_FILE>";

/// Render the full prompt for `query`. Pure — no I/O, no failure modes.
pub fn render(query: &str) -> String {
    format!(
        r#"You are a Volatility memory forensics expert. You are integrated into a Volatility 3 plugin.
The user's request is: {query}

Based on this request, generate the EXACT Volatility 3 command that achieves the goal.
You must ONLY respond with a JSON object in the following format:
{{
    "volatility_version": "3",
    "command": "volatility command with placeholders",
    "confidence": "high" or "low"
}}

Important instructions:
1. ONLY use standard, well-known Volatility 3 plugins.
2. ALWAYS specify volatility_version as "3".
3. Use "{MEMORY_FILE_PLACEHOLDER}" as a placeholder for the memory file path.
4. ONLY respond with the JSON, nothing else.
5. Set "confidence" to "low" if you are not highly confident.
6. Example command format: "vol -f {MEMORY_FILE_PLACEHOLDER} windows.pslist.PsList"

Generate the command now:
"#
    )
}
