//! Hyperlink extraction from crawled pages
//!
//! The discovery engine only needs `href` targets resolved to absolute
//! URLs; everything beyond that (article matching, dedupe) happens in the
//! engine. Extraction is behind a trait so tests and alternative page
//! formats can plug in their own.

use scraper::{Html, Selector};
use url::Url;

/// Pulls hyperlink targets out of a fetched page body
pub trait LinkExtractor: Send + Sync {
    /// Returns absolute URLs for every usable link in `html`
    ///
    /// Relative hrefs are resolved against `base_url`.
    fn extract(&self, html: &str, base_url: &Url) -> Vec<String>;
}

/// Extractor for ordinary HTML anchor tags
#[derive(Debug, Default)]
pub struct HtmlLinkExtractor;

impl LinkExtractor for HtmlLinkExtractor {
    fn extract(&self, html: &str, base_url: &Url) -> Vec<String> {
        let document = Html::parse_document(html);
        let mut links = Vec::new();

        if let Ok(anchor_selector) = Selector::parse("a[href]") {
            for element in document.select(&anchor_selector) {
                // Skip file-download anchors
                if element.value().attr("download").is_some() {
                    continue;
                }

                if let Some(href) = element.value().attr("href") {
                    if let Some(absolute_url) = resolve_link(href, base_url) {
                        links.push(absolute_url);
                    }
                }
            }
        }

        links
    }
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only anchors
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.net/local-news/city").unwrap()
    }

    fn extract(html: &str) -> Vec<String> {
        HtmlLinkExtractor.extract(html, &base_url())
    }

    #[test]
    fn test_extract_absolute_link() {
        let html = r#"<html><body><a href="https://other.com/page">Link</a></body></html>"#;
        let links = extract(html);
        assert_eq!(links, vec!["https://other.com/page".to_string()]);
    }

    #[test]
    fn test_extract_relative_link() {
        let html = r#"<html><body><a href="/local-news/a/b/1/2">Link</a></body></html>"#;
        let links = extract(html);
        assert_eq!(
            links,
            vec!["https://example.net/local-news/a/b/1/2".to_string()]
        );
    }

    #[test]
    fn test_extract_relative_path_link() {
        let html = r#"<html><body><a href="other">Link</a></body></html>"#;
        let links = extract(html);
        assert_eq!(links, vec!["https://example.net/local-news/other".to_string()]);
    }

    #[test]
    fn test_skip_special_schemes() {
        let html = r#"
            <html><body>
                <a href="javascript:void(0)">Js</a>
                <a href="mailto:desk@example.net">Email</a>
                <a href="tel:+1234567890">Call</a>
                <a href="data:text/html,<h1>x</h1>">Data</a>
            </body></html>
        "#;
        assert!(extract(html).is_empty());
    }

    #[test]
    fn test_skip_fragment_only() {
        let html = r##"<html><body><a href="#comments">Jump</a></body></html>"##;
        assert!(extract(html).is_empty());
    }

    #[test]
    fn test_skip_download_link() {
        let html = r#"<html><body><a href="/epaper.pdf" download>Download</a></body></html>"#;
        assert!(extract(html).is_empty());
    }

    #[test]
    fn test_preserves_document_order() {
        let html = r#"
            <html><body>
                <a href="/first">1</a>
                <a href="/second">2</a>
                <a href="/third">3</a>
            </body></html>
        "#;
        let links = extract(html);
        assert_eq!(
            links,
            vec![
                "https://example.net/first".to_string(),
                "https://example.net/second".to_string(),
                "https://example.net/third".to_string(),
            ]
        );
    }

    #[test]
    fn test_duplicates_are_reported_as_found() {
        // The engine dedupes; the extractor reports what the page says.
        let html = r#"<html><body><a href="/a">1</a><a href="/a">2</a></body></html>"#;
        assert_eq!(extract(html).len(), 2);
    }
}
