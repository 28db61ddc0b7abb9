//! `websense scrape`: extract structured data from one page.

use std::path::PathBuf;

use clap::Args;
use websense::{Extractor, Fetcher, Scraper};

use super::{ExtractArgs, FetchArgs};
use crate::config::resolve_extraction_config;
use crate::output;

#[derive(Debug, Clone, Args)]
pub struct ScrapeArgs {
    /// URL of the page to scrape.
    pub url: String,

    #[command(flatten)]
    pub extract: ExtractArgs,

    #[command(flatten)]
    pub fetch: FetchArgs,

    /// Send plain text instead of markdown to the model.
    #[arg(long)]
    pub no_markdown: bool,

    /// Write the JSON result to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print progress details.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Settings not given as flags are read through `env`.
pub async fn run(args: ScrapeArgs, env: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
    let options = args.extract.scrape_options(!args.no_markdown)?;
    let config = resolve_extraction_config(args.extract.model.as_deref(), env)?;

    if args.verbose {
        output::header();
        for note in args.extract.input_notes() {
            output::info(&note);
        }
        output::info(&format!("Target: {}", args.url));
        output::info(&format!("Model: {}", config.model));
        output::info(&format!(
            "Timeout: {}s, retries: {}",
            args.fetch.timeout, args.fetch.retries
        ));
    }

    let scraper = Scraper::builder()
        .fetcher(Fetcher::new(args.fetch.fetcher_config())?)
        .extractor(Extractor::new(config)?)
        .build()?;

    let data = scraper.scrape(&args.url, &options).await?;
    let rendered = serde_json::to_string_pretty(&data)?;

    if args.verbose {
        output::success("Extraction complete");
    }
    output::write_output(&rendered, args.output.as_deref(), args.verbose)
}
