//! Core data types shared by every pipeline stage.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON-schema-shaped description of the data to extract.
pub type SchemaSpec = Value;

/// A sample of the data to extract, used to infer a [`SchemaSpec`].
pub type ExampleSpec = Value;

/// The structured data returned by the generation service.
pub type ExtractedData = Value;

/// Raw response captured by the fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResult {
    /// Requested URL.
    pub url: String,
    /// HTTP status code of the successful attempt.
    pub status_code: u16,
    /// Raw response body.
    pub body: String,
    /// Response headers.
    pub headers: HashMap<String, String>,
}

/// A single candidate returned by a search provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Errors that can occur anywhere in the WebSense pipeline.
#[derive(thiserror::Error, Debug)]
pub enum WebSenseError {
    #[error("Failed to fetch {url} after {attempts} attempt(s): {cause}")]
    Fetch {
        url: String,
        attempts: u32,
        cause: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Extraction service error: {0}")]
    ExtractionService(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type.
pub type WebSenseResult<T> = Result<T, WebSenseError>;
