//! The scraping pipeline: fetch, clean, resolve schema, extract.
//!
//! Stages run strictly one after another and any failure aborts the call
//! with the stage's own error. No partial results are returned.

use std::sync::Arc;

use serde_json::Value;

use crate::cleaner::Cleaner;
use crate::extractor::{ExtractOptions, Extractor};
use crate::fetcher::{Fetcher, FetcherConfig};
use crate::llm::ExtractionConfig;
use crate::search::{DuckDuckGoSearch, SearchProvider};
use crate::types::{ExampleSpec, ExtractedData, SchemaSpec, WebSenseError, WebSenseResult};

/// Default number of search candidates tried by `search_and_scrape`.
pub const DEFAULT_MAX_RESULTS: usize = 3;

/// What to extract from a page, and how to present the page to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeOptions {
    pub schema: Option<SchemaSpec>,
    pub example: Option<ExampleSpec>,
    /// Render markdown (true) or flattened text (false).
    pub convert_markdown: bool,
    pub extract: ExtractOptions,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            schema: None,
            example: None,
            convert_markdown: true,
            extract: ExtractOptions::default(),
        }
    }
}

impl ScrapeOptions {
    pub fn with_schema(schema: SchemaSpec) -> Self {
        Self {
            schema: Some(schema),
            ..Self::default()
        }
    }

    pub fn with_example(example: ExampleSpec) -> Self {
        Self {
            example: Some(example),
            ..Self::default()
        }
    }

    pub fn plain_text(mut self) -> Self {
        self.convert_markdown = false;
        self
    }

    pub fn extract_options(mut self, extract: ExtractOptions) -> Self {
        self.extract = extract;
        self
    }
}

/// Composes one fetcher, one cleaner and one extractor.
#[derive(Clone)]
pub struct Scraper {
    fetcher: Fetcher,
    cleaner: Cleaner,
    extractor: Extractor,
    search: Arc<dyn SearchProvider>,
}

impl std::fmt::Debug for Scraper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scraper")
            .field("fetcher", &self.fetcher)
            .field("cleaner", &self.cleaner)
            .finish_non_exhaustive()
    }
}

impl Scraper {
    /// Scraper with default fetcher, cleaner and search, extracting through
    /// the service described by `config`.
    pub fn new(config: ExtractionConfig) -> WebSenseResult<Self> {
        Self::builder().extractor(Extractor::new(config)?).build()
    }

    pub fn builder() -> ScraperBuilder {
        ScraperBuilder::default()
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn cleaner(&self) -> &Cleaner {
        &self.cleaner
    }

    /// Fetch `url` and return its cleaned content without extraction.
    pub async fn get_content(&self, url: &str, convert_markdown: bool) -> WebSenseResult<String> {
        let page = self.fetcher.fetch(url).await?;
        let content = if convert_markdown {
            self.cleaner.to_markdown(&page.body)
        } else {
            self.cleaner.to_text(&page.body)
        };
        tracing::info!(
            "Cleaned {url}: {} bytes of HTML -> {} characters of {}",
            page.body.len(),
            content.chars().count(),
            if convert_markdown { "markdown" } else { "text" }
        );
        Ok(content)
    }

    /// Run the full pipeline for one URL.
    pub async fn scrape(
        &self,
        url: &str,
        options: &ScrapeOptions,
    ) -> WebSenseResult<ExtractedData> {
        let content = self.get_content(url, options.convert_markdown).await?;
        let data = self
            .extractor
            .extract(
                &content,
                options.schema.as_ref(),
                options.example.as_ref(),
                &options.extract,
            )
            .await?;
        tracing::info!("Extracted structured data from {url}");
        Ok(data)
    }

    /// Search for `query` and scrape candidates in rank order, returning the
    /// first result judged good. Failed candidates are skipped.
    pub async fn search_and_scrape(
        &self,
        query: &str,
        options: &ScrapeOptions,
        max_results: usize,
    ) -> WebSenseResult<ExtractedData> {
        let hits = self.search.search(query, max_results).await?;
        if hits.is_empty() {
            return Err(WebSenseError::Search(format!("no results for '{query}'")));
        }

        for hit in &hits {
            match self.scrape(&hit.url, options).await {
                Ok(data) if is_good_result(&data) => {
                    tracing::info!("Using result from {}", hit.url);
                    return Ok(data);
                }
                Ok(_) => tracing::info!("Result from {} judged poor; trying next", hit.url),
                // Misconfiguration fails identically for every candidate.
                Err(e @ WebSenseError::Configuration(_)) => return Err(e),
                Err(e) => tracing::warn!("Skipping {}: {e}", hit.url),
            }
        }

        Err(WebSenseError::Search(format!(
            "none of {} candidate page(s) produced a good result for '{query}'",
            hits.len()
        )))
    }
}

/// Good unless a `quality` field says otherwise. The first `quality` field
/// found (depth-first, document order) decides.
pub fn is_good_result(data: &Value) -> bool {
    match find_quality(data) {
        Some(Value::String(quality)) => quality.trim().eq_ignore_ascii_case("good"),
        Some(_) => false,
        None => true,
    }
}

fn find_quality(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(map) => map
            .get("quality")
            .or_else(|| map.values().find_map(find_quality)),
        Value::Array(items) => items.iter().find_map(find_quality),
        _ => None,
    }
}

/// Assembles a [`Scraper`] from explicitly supplied parts.
#[derive(Default)]
pub struct ScraperBuilder {
    fetcher: Option<Fetcher>,
    cleaner: Option<Cleaner>,
    extractor: Option<Extractor>,
    search: Option<Arc<dyn SearchProvider>>,
}

impl ScraperBuilder {
    pub fn fetcher(mut self, fetcher: Fetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn cleaner(mut self, cleaner: Cleaner) -> Self {
        self.cleaner = Some(cleaner);
        self
    }

    pub fn extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(search);
        self
    }

    /// Fill in defaults for fetcher, cleaner and search. The extractor has
    /// no default because it needs credentials.
    pub fn build(self) -> WebSenseResult<Scraper> {
        let extractor = self.extractor.ok_or_else(|| {
            WebSenseError::Configuration("scraper requires an extractor".to_string())
        })?;
        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Fetcher::new(FetcherConfig::default())?,
        };
        let search: Arc<dyn SearchProvider> = match self.search {
            Some(search) => search,
            None => Arc::new(DuckDuckGoSearch::new()?),
        };

        Ok(Scraper {
            fetcher,
            cleaner: self.cleaner.unwrap_or_default(),
            extractor,
            search,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quality_judgement() {
        assert!(is_good_result(&json!({ "title": "x" })));
        assert!(is_good_result(&json!({ "page": { "quality": "Good" } })));
        assert!(!is_good_result(&json!({ "page": { "quality": "poor" } })));
        assert!(!is_good_result(&json!({ "items": [{ "quality": 3 }] })));
        assert!(is_good_result(&json!({ "quality": "good", "nested": { "quality": "poor" } })));
    }

    #[test]
    fn builder_requires_extractor() {
        let err = Scraper::builder().build().unwrap_err();
        assert!(matches!(err, WebSenseError::Configuration(_)));
    }

    #[test]
    fn scrape_options_defaults() {
        let options = ScrapeOptions::with_schema(json!({ "type": "object" }));
        assert!(options.convert_markdown);
        assert!(options.example.is_none());
        assert_eq!(options.extract, ExtractOptions::default());
        assert!(!options.plain_text().convert_markdown);
    }
}
