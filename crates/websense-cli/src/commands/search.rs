//! `websense search`: search the web and scrape the first good result.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use websense::pipeline::DEFAULT_MAX_RESULTS;
use websense::{DuckDuckGoSearch, Extractor, Fetcher, Scraper};

use super::{ExtractArgs, FetchArgs};
use crate::config::{resolve_extraction_config, resolve_search_endpoint};
use crate::output;

#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    /// Search query.
    pub query: String,

    #[command(flatten)]
    pub extract: ExtractArgs,

    #[command(flatten)]
    pub fetch: FetchArgs,

    /// Number of search results to try.
    #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
    pub max_results: usize,

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
pub async fn run(args: SearchArgs, env: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
    let options = args.extract.scrape_options(!args.no_markdown)?;
    let config = resolve_extraction_config(args.extract.model.as_deref(), &env)?;
    let endpoint = resolve_search_endpoint(&env);

    if args.verbose {
        output::header();
        for note in args.extract.input_notes() {
            output::info(&note);
        }
        output::info(&format!("Query: {}", args.query));
        output::info(&format!("Model: {}", config.model));
        output::info(&format!("Trying up to {} result(s)", args.max_results));
    }

    let scraper = Scraper::builder()
        .fetcher(Fetcher::new(args.fetch.fetcher_config())?)
        .extractor(Extractor::new(config)?)
        .search(Arc::new(DuckDuckGoSearch::with_endpoint(endpoint)?))
        .build()?;

    let data = scraper
        .search_and_scrape(&args.query, &options, args.max_results)
        .await?;
    let rendered = serde_json::to_string_pretty(&data)?;

    if args.verbose {
        output::success("Found a good result");
    }
    output::write_output(&rendered, args.output.as_deref(), args.verbose)
}
