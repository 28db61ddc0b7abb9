//! Prompt assembly and delegation to the generation service.

use std::sync::Arc;

use crate::llm::{ExtractionConfig, OpenAiCompatibleClient, StructuredGenerator};
use crate::schema;
use crate::types::{ExampleSpec, ExtractedData, SchemaSpec, WebSenseResult};

/// Prompt used when the caller does not supply one.
pub const DEFAULT_PROMPT: &str = "Extract structured data from the following webpage content.";

/// Default character budget for page content.
pub const DEFAULT_TRUNCATE_LENGTH: usize = 12_000;

/// Per-call extraction options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Cut the content to `truncate_length` characters before prompting.
    pub truncate: bool,
    pub truncate_length: usize,
    /// Replaces [`DEFAULT_PROMPT`] when set and non-empty.
    pub prompt: Option<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            truncate: true,
            truncate_length: DEFAULT_TRUNCATE_LENGTH,
            prompt: None,
        }
    }
}

impl ExtractOptions {
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_truncate_length(mut self, length: usize) -> Self {
        self.truncate_length = length;
        self
    }

    pub fn without_truncation(mut self) -> Self {
        self.truncate = false;
        self
    }
}

/// Build the prompt: instruction, blank line, then the (possibly cut) content.
///
/// Truncation counts characters, not bytes, and ignores word boundaries.
pub fn build_prompt(content: &str, options: &ExtractOptions) -> String {
    let content = if options.truncate {
        truncate_chars(content, options.truncate_length)
    } else {
        content
    };

    let instruction = options
        .prompt
        .as_deref()
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PROMPT);

    format!("{instruction}\n\n{content}")
}

fn truncate_chars(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &content[..byte_idx],
        None => content,
    }
}

/// Turns cleaned page content into structured data.
#[derive(Clone)]
pub struct Extractor {
    generator: Arc<dyn StructuredGenerator>,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor").finish_non_exhaustive()
    }
}

impl Extractor {
    /// Extractor backed by an OpenAI-compatible chat API.
    pub fn new(config: ExtractionConfig) -> WebSenseResult<Self> {
        Ok(Self::with_generator(Arc::new(OpenAiCompatibleClient::new(
            config,
        )?)))
    }

    /// Extractor configured from the `OPENAI_*` environment variables.
    pub fn from_env() -> WebSenseResult<Self> {
        Self::new(ExtractionConfig::from_env()?)
    }

    /// Extractor backed by any generation service.
    pub fn with_generator(generator: Arc<dyn StructuredGenerator>) -> Self {
        Self { generator }
    }

    /// Resolve the schema, assemble the prompt and delegate.
    ///
    /// Service failures propagate unchanged; nothing is retried here.
    pub async fn extract(
        &self,
        content: &str,
        schema: Option<&SchemaSpec>,
        example: Option<&ExampleSpec>,
        options: &ExtractOptions,
    ) -> WebSenseResult<ExtractedData> {
        let resolved = schema::resolve(schema, example)?;
        let prompt = build_prompt(content, options);
        tracing::debug!(
            "Extracting with a {}-character prompt (content {} characters)",
            prompt.chars().count(),
            content.chars().count()
        );
        self.generator.generate(&prompt, &resolved).await
    }
}
