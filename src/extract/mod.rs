//! Article content extraction
//!
//! This module turns fetched HTML into `Article` records:
//! - `ContentExtractor` trait so tests and alternate layouts can plug in
//! - `SelectorExtractor`, the CSS-selector implementation driven by the
//!   `[extract]` config section
//!
//! A page with no usable body text extracts to `None` rather than an
//! empty article; the orchestrator logs and skips those.

use crate::config::ExtractConfig;
use crate::{ConfigError, ConfigResult};
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// One extracted article, ready to persist
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    /// Canonical URL the article was fetched from
    pub url: String,

    /// Headline text, when the title selector matched something non-empty
    pub title: Option<String>,

    /// Paragraph texts joined with blank lines
    pub body: String,

    /// Whitespace-separated token count of the body
    pub word_count: usize,
}

/// Strategy for turning page HTML into an article
pub trait ContentExtractor: Send + Sync {
    /// Extracts an article from `html` fetched at `url`
    ///
    /// Returns `None` when the page has no usable body text.
    fn extract(&self, html: &str, url: &str) -> Option<Article>;
}

/// CSS-selector-driven extractor configured per site layout
///
/// The body is collected from elements matching the paragraph selector
/// inside the body container. Paragraphs are dropped when they sit inside
/// a skip container (related-links boxes, ad slots) or contain an inline
/// image, since those are captions rather than running text.
pub struct SelectorExtractor {
    title: Selector,
    container: Selector,
    paragraph: Selector,
    skip: Option<Selector>,
}

impl SelectorExtractor {
    /// Compiles the configured selectors
    ///
    /// # Arguments
    ///
    /// * `extract` - The `[extract]` section of the site config
    ///
    /// # Returns
    ///
    /// * `Ok(SelectorExtractor)` - All selectors compiled
    /// * `Err(ConfigError)` - A selector failed to parse
    pub fn new(extract: &ExtractConfig) -> ConfigResult<Self> {
        let skip = match &extract.skip_selector {
            Some(selector) => Some(compile_selector("skip-selector", selector)?),
            None => None,
        };

        Ok(Self {
            title: compile_selector("title-selector", &extract.title_selector)?,
            container: compile_selector("body-selector", &extract.body_selector)?,
            paragraph: compile_selector("paragraph-selector", &extract.paragraph_selector)?,
            skip,
        })
    }

    fn extract_title(&self, document: &Html) -> Option<String> {
        document
            .select(&self.title)
            .next()
            .map(element_text)
            .filter(|text| !text.is_empty())
    }

    /// Collects paragraph texts from every body container in document order
    fn extract_body(&self, document: &Html) -> Option<String> {
        let img_selector = Selector::parse("img").ok()?;
        let mut paragraphs = Vec::new();

        for container in document.select(&self.container) {
            let skipped = self.skipped_nodes(container);

            for element in container.select(&self.paragraph) {
                if skipped.contains(&element.id()) {
                    continue;
                }
                if element.select(&img_selector).next().is_some() {
                    continue;
                }
                let text = element_text(element);
                if !text.is_empty() {
                    paragraphs.push(text);
                }
            }
        }

        if paragraphs.is_empty() {
            None
        } else {
            Some(paragraphs.join("\n\n"))
        }
    }

    /// Node ids of paragraph elements sitting inside a skip container
    fn skipped_nodes(&self, container: ElementRef) -> HashSet<NodeId> {
        let mut skipped = HashSet::new();
        if let Some(skip) = &self.skip {
            for boxed in container.select(skip) {
                for element in boxed.select(&self.paragraph) {
                    skipped.insert(element.id());
                }
            }
        }
        skipped
    }
}

impl ContentExtractor for SelectorExtractor {
    fn extract(&self, html: &str, url: &str) -> Option<Article> {
        let document = Html::parse_document(html);

        let title = self.extract_title(&document);
        let body = self.extract_body(&document)?;
        let word_count = body.split_whitespace().count();

        Some(Article {
            url: url.to_string(),
            title,
            body,
            word_count,
        })
    }
}

fn compile_selector(field: &str, selector: &str) -> ConfigResult<Selector> {
    Selector::parse(selector).map_err(|e| {
        ConfigError::Validation(format!("invalid CSS selector for {}: {:?}", field, e))
    })
}

/// Concatenated text of an element, with surrounding whitespace trimmed
fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
