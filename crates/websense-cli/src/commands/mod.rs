//! Subcommand arguments and handlers.

pub mod content;
pub mod scrape;
pub mod search;

use std::time::Duration;

use anyhow::bail;
use clap::Args;
use websense::extractor::DEFAULT_TRUNCATE_LENGTH;
use websense::fetcher::{DEFAULT_RETRIES, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use websense::{ExtractOptions, FetcherConfig, ScrapeOptions};

use crate::input::{json_input_source, parse_json_input};

/// HTTP settings shared by every command that fetches a page.
#[derive(Debug, Clone, Args)]
pub struct FetchArgs {
    /// Request timeout in seconds.
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Number of retries for failed requests.
    #[arg(short, long, default_value_t = DEFAULT_RETRIES)]
    pub retries: u32,

    /// User-Agent header sent with every request.
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,
}

impl FetchArgs {
    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig::default()
            .with_timeout(Duration::from_secs(self.timeout))
            .with_retries(self.retries)
            .with_user_agent(self.user_agent.clone())
    }
}

/// What to extract and how to prompt for it.
#[derive(Debug, Clone, Args)]
pub struct ExtractArgs {
    /// Model to use (overrides OPENAI_MODEL).
    #[arg(short, long)]
    pub model: Option<String>,

    /// JSON schema, inline or as a file path.
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Example of the expected output, inline or as a file path.
    #[arg(short, long)]
    pub example: Option<String>,

    /// Instruction placed before the page content.
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Maximum number of content characters sent to the model.
    #[arg(long, default_value_t = DEFAULT_TRUNCATE_LENGTH)]
    pub truncate_length: usize,

    /// Send the whole page regardless of length.
    #[arg(long)]
    pub no_truncate: bool,
}

impl ExtractArgs {
    /// Parse and validate the schema or example. Runs before any network
    /// traffic so bad input fails fast.
    pub fn scrape_options(&self, convert_markdown: bool) -> anyhow::Result<ScrapeOptions> {
        if self.schema.is_none() && self.example.is_none() {
            bail!("either --schema or --example must be provided");
        }

        let schema = self.schema.as_deref().map(parse_json_input).transpose()?;
        let example = self.example.as_deref().map(parse_json_input).transpose()?;
        websense::schema::resolve(schema.as_ref(), example.as_ref())?;

        let mut extract = ExtractOptions::default().with_truncate_length(self.truncate_length);
        if self.no_truncate {
            extract = extract.without_truncation();
        }
        if let Some(prompt) = &self.prompt {
            extract = extract.with_prompt(prompt.clone());
        }

        Ok(ScrapeOptions {
            schema,
            example,
            convert_markdown,
            extract,
        })
    }

    /// Verbose notes on where the schema and example were read from.
    pub fn input_notes(&self) -> Vec<String> {
        [("schema", &self.schema), ("example", &self.example)]
            .into_iter()
            .filter_map(|(name, value)| {
                let value = value.as_deref()?;
                Some(format!("Using {name} from {}", json_input_source(value)))
            })
            .collect()
    }
}
