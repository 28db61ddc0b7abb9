//! JSON arguments that may be given inline or as a file path.

use std::path::Path;

use anyhow::{anyhow, bail, Context};
use serde_json::Value;

/// Parse a `--schema` / `--example` argument.
///
/// Text that starts with `{` or `[` is parsed inline. Anything else is
/// treated as a path first, then tried inline once more before giving up.
pub fn parse_json_input(input: &str) -> anyhow::Result<Value> {
    let trimmed = input.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("Invalid JSON string");
    }

    let path = Path::new(trimmed);
    if path.exists() {
        if !path.is_file() {
            bail!("'{}' exists but is not a file", path.display());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        return serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON in file '{}'", path.display()));
    }

    serde_json::from_str(trimmed).map_err(|_| {
        anyhow!("Input is neither a valid JSON string nor an existing file: {trimmed}")
    })
}

/// Where [`parse_json_input`] will take `input` from: `"file"` or `"string"`.
pub fn json_input_source(input: &str) -> &'static str {
    let trimmed = input.trim();
    if !trimmed.starts_with('{') && !trimmed.starts_with('[') && Path::new(trimmed).is_file() {
        "file"
    } else {
        "string"
    }
}
