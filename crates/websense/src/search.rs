//! Web search used to find candidate pages for `search_and_scrape`.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::fetcher::DEFAULT_USER_AGENT;
use crate::types::{SearchHit, WebSenseError, WebSenseResult};

/// DuckDuckGo's JavaScript-free results page.
pub const DUCKDUCKGO_HTML_URL: &str = "https://html.duckduckgo.com/html/";

/// A source of ranked candidate URLs for a query.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Return at most `max_results` hits, best first.
    async fn search(&self, query: &str, max_results: usize) -> WebSenseResult<Vec<SearchHit>>;
}

/// Searches through the DuckDuckGo HTML endpoint.
#[derive(Debug, Clone)]
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    endpoint: String,
}

impl DuckDuckGoSearch {
    pub fn new() -> WebSenseResult<Self> {
        Self::with_endpoint(DUCKDUCKGO_HTML_URL)
    }

    /// Point the provider at another endpoint serving the same markup.
    pub fn with_endpoint(endpoint: impl Into<String>) -> WebSenseResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| WebSenseError::Search(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    async fn search(&self, query: &str, max_results: usize) -> WebSenseResult<Vec<SearchHit>> {
        tracing::debug!("Searching for '{query}' (max {max_results})");

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("q", query)])
            .header("Accept", "text/html")
            .send()
            .await
            .map_err(|e| WebSenseError::Search(format!("search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebSenseError::Search(format!(
                "search endpoint returned HTTP status {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| WebSenseError::Search(format!("failed to read search results: {e}")))?;

        Ok(parse_results(&body, max_results))
    }
}

/// Parse DuckDuckGo result blocks. `Html` is not `Send`, so this stays
/// synchronous and never lives across an await.
fn parse_results(body: &str, max_results: usize) -> Vec<SearchHit> {
    let (Ok(result_sel), Ok(link_sel), Ok(snippet_sel)) = (
        Selector::parse(".result"),
        Selector::parse("a.result__a"),
        Selector::parse(".result__snippet"),
    ) else {
        return Vec::new();
    };

    let document = Html::parse_document(body);
    document
        .select(&result_sel)
        .filter_map(|result| {
            let link = result.select(&link_sel).next()?;
            let url = decode_result_url(link.value().attr("href")?)?;
            let title = link.text().collect::<String>().trim().to_string();
            let snippet = result
                .select(&snippet_sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .unwrap_or_default();
            Some(SearchHit {
                title,
                url,
                snippet,
            })
        })
        .take(max_results)
        .collect()
}

/// Result links look like `//duckduckgo.com/l/?uddg=<encoded>&rut=...`.
fn decode_result_url(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };

    let parsed = url::Url::parse(&absolute).ok()?;
    if let Some((_, target)) = parsed.query_pairs().find(|(key, _)| key == "uddg") {
        return Some(target.into_owned());
    }

    matches!(parsed.scheme(), "http" | "https").then_some(absolute)
}
