//! WebSense: fetch a webpage, strip it to readable text or markdown, and
//! extract structured data matching a schema or example with an LLM.

pub mod cleaner;
pub mod extractor;
pub mod fetcher;
pub mod llm;
pub mod pipeline;
pub mod schema;
pub mod search;
pub mod types;

pub use cleaner::{Cleaner, CleanerConfig, DEFAULT_NOISY_ELEMENTS};
pub use extractor::{build_prompt, ExtractOptions, Extractor, DEFAULT_PROMPT};
pub use fetcher::{Fetcher, FetcherConfig};
pub use llm::{ExtractionConfig, OpenAiCompatibleClient, StructuredGenerator};
pub use pipeline::{is_good_result, ScrapeOptions, Scraper, ScraperBuilder};
pub use search::{DuckDuckGoSearch, SearchProvider};
pub use types::*;
