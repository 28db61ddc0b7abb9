//! Styled terminal messages and result output.
//!
//! Status messages go to stderr; results go to stdout or a file.

use std::path::Path;

use anyhow::Context;
use colored::Colorize;

const RULE_WIDTH: usize = 50;

pub fn header() {
    let rule = "━".repeat(RULE_WIDTH);
    eprintln!("{}", rule.cyan());
    eprintln!("{}", "  WebSense".cyan().bold());
    eprintln!("{}", "  \"Making sense of the web.\"".cyan());
    eprintln!("{}", rule.cyan());
}

pub fn info(message: &str) {
    eprintln!("{}", format_info(message));
}

pub fn success(message: &str) {
    eprintln!("{}", format_success(message));
}

pub fn error(message: &str) {
    eprintln!("{}", format_error(message));
}

pub fn format_info(message: &str) -> String {
    format!("ℹ {message}").blue().to_string()
}

pub fn format_success(message: &str) -> String {
    format!("✓ {message}").green().to_string()
}

pub fn format_error(message: &str) -> String {
    format!("✗ Error: {message}").red().bold().to_string()
}

/// Write `content` to `path`, or print it to stdout when no path is given.
/// The saved path is reported in verbose mode only.
pub fn write_output(content: &str, path: Option<&Path>, verbose: bool) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            if let Some(notice) = saved_notice(path, verbose) {
                eprintln!("{notice}");
            }
        }
        None => println!("{content}"),
    }
    Ok(())
}

pub fn saved_notice(path: &Path, verbose: bool) -> Option<String> {
    verbose.then(|| format_success(&format!("Results saved to {}", path.display())))
}
