//! Settings resolution: explicit flag > environment > default.

use anyhow::Context;
use websense::search::DUCKDUCKGO_HTML_URL;
use websense::ExtractionConfig;

/// Overrides the search endpoint used by `websense search`.
pub const ENV_SEARCH_URL: &str = "WEBSENSE_SEARCH_URL";

/// Environment lookup backed by the process environment.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Resolve the generation-service settings from `lookup`.
///
/// `model` comes from `--model` and wins over `OPENAI_MODEL`.
pub fn resolve_extraction_config(
    model: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ExtractionConfig> {
    let config = ExtractionConfig::from_lookup(lookup)
        .context("cannot configure the extraction service")?;

    let config = match model.map(str::trim).filter(|m| !m.is_empty()) {
        Some(model) => config.with_model(model),
        None => config,
    };
    tracing::debug!("Extraction service: {} at {}", config.model, config.base_url);
    Ok(config)
}

/// Search endpoint from `WEBSENSE_SEARCH_URL`, or DuckDuckGo.
pub fn resolve_search_endpoint(lookup: impl Fn(&str) -> Option<String>) -> String {
    lookup(ENV_SEARCH_URL)
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DUCKDUCKGO_HTML_URL.to_string())
}
