//! WebSense command line entry point.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use websense_cli::commands::{content, scrape, search};
use websense_cli::{output, process_env};

#[derive(Parser)]
#[command(
    name = "websense",
    about = "Making sense of the web: turn any webpage into structured JSON",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract structured data from a webpage.
    ///
    /// Examples:
    ///   websense scrape https://example.com -e '{"title": "Example"}'
    ///   websense scrape https://example.com -s schema.json -o out.json
    Scrape(scrape::ScrapeArgs),

    /// Fetch a webpage and print its cleaned content.
    Content(content::ContentArgs),

    /// Search the web and extract data from the first good result.
    Search(search::SearchArgs),

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   websense completions bash > ~/.local/share/bash-completion/completions/websense
    ///   websense completions zsh > ~/.zfunc/_websense
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Commands::Scrape(args) => args.verbose,
            Commands::Content(args) => args.verbose,
            Commands::Search(args) => args.verbose,
            Commands::Completions { .. } => false,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let directives = if cli.command.verbose() {
        format!("{},websense=debug,websense_cli=debug", cli.log_level)
    } else {
        cli.log_level.clone()
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directives));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli.command).await {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Scrape(args) => scrape::run(args, process_env).await,
        Commands::Content(args) => content::run(args).await,
        Commands::Search(args) => search::run(args, process_env).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "websense", &mut std::io::stdout());
            Ok(())
        }
    }
}
