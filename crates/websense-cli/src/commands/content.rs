//! `websense content`: print the cleaned page without extraction.

use std::path::PathBuf;

use clap::Args;
use websense::{Cleaner, Fetcher};

use super::FetchArgs;
use crate::output;

#[derive(Debug, Clone, Args)]
pub struct ContentArgs {
    /// URL of the page to fetch.
    pub url: String,

    #[command(flatten)]
    pub fetch: FetchArgs,

    /// Print plain text instead of markdown.
    #[arg(long)]
    pub no_markdown: bool,

    /// Write the content to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print progress details.
    #[arg(short, long)]
    pub verbose: bool,
}

/// No extraction happens here, so no API key is needed.
pub async fn run(args: ContentArgs) -> anyhow::Result<()> {
    if args.verbose {
        output::header();
        output::info(&format!("Fetching: {}", args.url));
    }

    let fetcher = Fetcher::new(args.fetch.fetcher_config())?;
    let page = fetcher.fetch(&args.url).await?;

    let cleaner = Cleaner::new();
    let content = if args.no_markdown {
        cleaner.to_text(&page.body)
    } else {
        cleaner.to_markdown(&page.body)
    };

    if args.verbose {
        output::success(&format!(
            "Fetched {} ({} characters)",
            args.url,
            content.chars().count()
        ));
    }
    output::write_output(&content, args.output.as_deref(), args.verbose)
}
