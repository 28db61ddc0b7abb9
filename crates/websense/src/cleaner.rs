//! Reduce raw HTML to readable text or markdown.
//!
//! Non-content elements (scripts, navigation, chrome) are dropped together
//! with everything inside them. Parsing goes through `scraper`, which
//! tolerates malformed markup, so neither rendering can fail.

use std::collections::BTreeSet;

use scraper::{Html, Node};

/// Elements removed by default before rendering.
pub const DEFAULT_NOISY_ELEMENTS: [&str; 9] = [
    "script", "style", "nav", "footer", "header", "aside", "noscript", "iframe", "svg",
];

/// The set of element names the cleaner strips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanerConfig {
    pub noisy_element_names: BTreeSet<String>,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            noisy_element_names: DEFAULT_NOISY_ELEMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// HTML cleaner, stateless beyond its noisy-element set.
#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    config: CleanerConfig,
}

impl Cleaner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cleaner that strips exactly `names`.
    pub fn with_noisy_elements<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            config: CleanerConfig {
                noisy_element_names: names
                    .into_iter()
                    .map(|s| s.as_ref().trim().to_ascii_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
        }
    }

    /// Build a cleaner that strips the default set plus `extra`.
    pub fn with_extra_noise<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = DEFAULT_NOISY_ELEMENTS
            .iter()
            .map(|s| s.to_string())
            .chain(extra.into_iter().map(|s| s.as_ref().to_string()))
            .collect::<Vec<_>>();
        Self::with_noisy_elements(names)
    }

    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    fn is_noisy(&self, name: &str) -> bool {
        self.config.noisy_element_names.contains(name)
    }

    /// Flatten `html` to plain text: one text run per line, each line
    /// trimmed, blank lines dropped.
    pub fn to_text(&self, html: &str) -> String {
        if html.trim().is_empty() {
            return String::new();
        }

        let document = Html::parse_document(html);
        let mut runs: Vec<&str> = Vec::new();

        for node in document.tree.root().descendants() {
            let Node::Text(text) = node.value() else {
                continue;
            };
            let inside_noise = node.ancestors().any(|ancestor| match ancestor.value() {
                Node::Element(el) => self.is_noisy(el.name()),
                _ => false,
            });
            if !inside_noise {
                runs.push(text);
            }
        }

        normalize_lines(&runs.join("\n"))
    }

    /// Render `html` to markdown after removing noisy elements.
    pub fn to_markdown(&self, html: &str) -> String {
        if html.trim().is_empty() {
            return String::new();
        }

        let skip: Vec<&str> = self
            .config
            .noisy_element_names
            .iter()
            .map(String::as_str)
            .collect();
        let converter = htmd::HtmlToMarkdown::builder().skip_tags(skip).build();

        match converter.convert(html) {
            Ok(markdown) => markdown.trim().to_string(),
            Err(e) => {
                // htmd only fails on writer errors; fall back to flat text.
                tracing::warn!("Markdown conversion failed, using plain text: {e}");
                self.to_text(html)
            }
        }
    }
}

/// Trim every line and drop the empty ones.
fn normalize_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_tags() {
        let html = "<div><p>Hello <b>World</b></p></div>";
        assert_eq!(Cleaner::new().to_text(html), "Hello\nWorld");
    }

    #[test]
    fn removes_noise() {
        let html = r#"
        <html>
            <body>
                <script>console.log('remove me');</script>
                <style>.css { color: red; }</style>
                <nav>Menu</nav>
                <p>Content</p>
                <footer>Footer</footer>
            </body>
        </html>
        "#;
        assert_eq!(Cleaner::new().to_text(html), "Content");
    }

    #[test]
    fn only_noise_yields_empty() {
        let html = "<script>x()</script><nav><a href='/'>Home</a></nav><aside>Ad</aside><svg><text>logo</text></svg>";
        assert_eq!(Cleaner::new().to_text(html), "");
        assert_eq!(Cleaner::new().to_markdown(html), "");
    }

    #[test]
    fn handles_empty_and_whitespace() {
        let cleaner = Cleaner::new();
        assert_eq!(cleaner.to_text(""), "");
        assert_eq!(cleaner.to_text("   \n\t   "), "");
        assert_eq!(cleaner.to_markdown(""), "");
        assert_eq!(cleaner.to_markdown(" \n "), "");
    }

    #[test]
    fn handles_nested_structure() {
        let html = r#"
        <div>
            <h1>Header</h1>
            <section>
                <p>Paragraph 1</p>
                <br>
                <p>Paragraph 2</p>
            </section>
        </div>
        "#;
        assert_eq!(
            Cleaner::new().to_text(html),
            "Header\nParagraph 1\nParagraph 2"
        );
    }

    #[test]
    fn tolerates_malformed_html() {
        let html = "<main><h1>Broken<h1><p>Still readable";
        let text = Cleaner::new().to_text(html);
        assert!(text.contains("Broken"));
        assert!(text.contains("Still readable"));
    }

    #[test]
    fn extra_noise_is_removed() {
        let cleaner = Cleaner::with_extra_noise(["Banner"]);
        let html = "<div><banner>Buy now</banner><p>Article</p></div>";
        assert_eq!(cleaner.to_text(html), "Article");
        assert!(cleaner.config().noisy_element_names.contains("script"));
    }

    #[test]
    fn custom_set_replaces_defaults() {
        let cleaner = Cleaner::with_noisy_elements(["footer"]);
        let html = "<nav>Menu</nav><p>Body</p><footer>Foot</footer>";
        assert_eq!(cleaner.to_text(html), "Menu\nBody");
    }

    #[test]
    fn markdown_keeps_structure() {
        let html = "<header>Site</header><h1>Title</h1><p>Some <strong>bold</strong> text with a <a href=\"https://example.com\">link</a>.</p><ul><li>One</li><li>Two</li></ul>";
        let markdown = Cleaner::new().to_markdown(html);
        assert!(markdown.contains("# Title"));
        assert!(markdown.contains("**bold**"));
        assert!(markdown.contains("[link](https://example.com)"));
        assert!(markdown.contains("One"));
        assert!(!markdown.contains("Site"));
    }

    #[test]
    fn output_is_deterministic() {
        let html = "<div><p>A</p><script>b</script><p>C</p></div>";
        let cleaner = Cleaner::new();
        assert_eq!(cleaner.to_text(html), cleaner.to_text(html));
        assert_eq!(cleaner.to_markdown(html), cleaner.to_markdown(html));
    }
}
