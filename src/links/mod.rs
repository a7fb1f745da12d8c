//! Link extraction and enrichment.
//!
//! URL-shaped substrings are mined from episode descriptions and segment
//! text; enrichment fetches each URL for title/description metadata and
//! is non-fatal when the page cannot be reached.

mod enricher;

pub use enricher::LinkEnricher;

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn url_regex() -> &'static Regex {
    static URL_RE: OnceLock<Regex> = OnceLock::new();
    URL_RE.get_or_init(|| {
        Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#).expect("Invalid regex")
    })
}

/// Extract unique URLs from text, preserving order of first appearance.
///
/// Trailing sentence punctuation is trimmed so "see https://x.dev." yields
/// a clean URL.
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for m in url_regex().find_iter(text) {
        let url = m.as_str().trim_end_matches(['.', ',', ';', ':', ')', '!', '?']);
        if url::Url::parse(url).is_err() {
            continue;
        }
        if seen.insert(url.to_string()) {
            urls.push(url.to_string());
        }
    }

    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_urls_order_and_dedup() {
        let text = "Links: https://vercel.com and https://supabase.com, \
                    then https://vercel.com again.";
        let urls = extract_urls(text);
        assert_eq!(urls, vec!["https://vercel.com", "https://supabase.com"]);
    }

    #[test]
    fn test_trailing_punctuation_trimmed() {
        let urls = extract_urls("Read https://example.com/docs.");
        assert_eq!(urls, vec!["https://example.com/docs"]);

        let urls = extract_urls("(see https://example.com/a)");
        assert_eq!(urls, vec!["https://example.com/a"]);
    }

    #[test]
    fn test_no_urls() {
        assert!(extract_urls("no links in here").is_empty());
    }

    #[test]
    fn test_query_strings_preserved() {
        let urls = extract_urls("watch https://youtube.com/watch?v=abc123xyz_- now");
        assert_eq!(urls, vec!["https://youtube.com/watch?v=abc123xyz_-"]);
    }
}
