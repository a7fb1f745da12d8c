//! Link enrichment: fetch a URL and pull title/description metadata.

use crate::config::LinkSettings;
use crate::error::{Result, VaultError};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, instrument};

/// Metadata fetched for a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Fetches page metadata for extracted links.
pub struct LinkEnricher {
    client: reqwest::Client,
}

fn title_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("Invalid regex"))
}

fn description_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?is)<meta[^>]+(?:name|property)\s*=\s*["'](?:description|og:description)["'][^>]+content\s*=\s*["']([^"']*)["']"#,
        )
        .expect("Invalid regex")
    })
}

impl LinkEnricher {
    pub fn new(settings: &LinkSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.fetch_timeout_seconds))
            .user_agent("podvault/0.1")
            .build()
            .unwrap_or_default();

        Self { client }
    }

    /// Fetch a URL and extract its title and meta description.
    ///
    /// Returns `EnrichmentUnavailable` if the page cannot be fetched or
    /// yields no usable metadata; callers treat that as non-fatal.
    #[instrument(skip(self))]
    pub async fn enrich(&self, url: &str) -> Result<LinkMetadata> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| VaultError::EnrichmentUnavailable(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(VaultError::EnrichmentUnavailable(format!(
                "{}: HTTP {}",
                url,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| VaultError::EnrichmentUnavailable(format!("{}: {}", url, e)))?;

        let metadata = Self::parse_metadata(&body);

        if metadata.title.is_none() && metadata.description.is_none() {
            return Err(VaultError::EnrichmentUnavailable(format!(
                "{}: no title or description found",
                url
            )));
        }

        debug!("Enriched {} (title: {:?})", url, metadata.title);
        Ok(metadata)
    }

    fn parse_metadata(html: &str) -> LinkMetadata {
        let title = title_regex()
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| collapse_whitespace(m.as_str()))
            .filter(|t| !t.is_empty());

        let description = description_regex()
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| collapse_whitespace(m.as_str()))
            .filter(|d| !d.is_empty());

        LinkMetadata { title, description }
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_title_and_description() {
        let html = r#"<html><head>
            <title>  Example
            Page </title>
            <meta name="description" content="A useful page.">
        </head><body></body></html>"#;

        let meta = LinkEnricher::parse_metadata(html);
        assert_eq!(meta.title.as_deref(), Some("Example Page"));
        assert_eq!(meta.description.as_deref(), Some("A useful page."));
    }

    #[test]
    fn test_parse_og_description() {
        let html = r#"<meta property="og:description" content="Open graph text"/>"#;
        let meta = LinkEnricher::parse_metadata(html);
        assert_eq!(meta.description.as_deref(), Some("Open graph text"));
    }

    #[test]
    fn test_parse_empty_page() {
        let meta = LinkEnricher::parse_metadata("<html><body>nothing</body></html>");
        assert!(meta.title.is_none());
        assert!(meta.description.is_none());
    }
}
