//! Web search fallback: a prioritized chain of search providers.
//!
//! Providers are tried strictly in order; the first success short-circuits
//! the chain. Heterogeneous provider responses are normalized into
//! [`SearchResult`] records before anything downstream sees them.

pub mod duckduckgo;
pub mod perplexity;
pub mod provider;
pub mod tavily;

use crate::config::Config;
use provider::SearchProvider;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use duckduckgo::DuckDuckGoProvider;
pub use perplexity::PerplexityProvider;
pub use tavily::TavilyProvider;

/// One normalized search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub content: String,
}

/// Uniform outcome of a provider call or of the whole chain.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub success: bool,
    pub results: Vec<SearchResult>,
    /// Tag of the provider that produced (or failed) this outcome.
    pub source: String,
    pub error: Option<String>,
}

impl SearchOutcome {
    pub fn ok(source: &str, results: Vec<SearchResult>) -> Self {
        Self {
            success: true,
            results,
            source: source.to_string(),
            error: None,
        }
    }

    pub fn failed(source: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            results: Vec::new(),
            source: source.to_string(),
            error: Some(error.into()),
        }
    }
}

/// Ordered chain of search providers.
pub struct SearchChain {
    providers: Vec<Box<dyn SearchProvider>>,
}

impl SearchChain {
    pub fn new(providers: Vec<Box<dyn SearchProvider>>) -> Self {
        Self { providers }
    }

    /// Build the chain from configured credentials: Perplexity when keyed,
    /// then Tavily when keyed, then the free DuckDuckGo fallback.
    pub fn from_config(config: &Config) -> Self {
        let mut providers: Vec<Box<dyn SearchProvider>> = Vec::new();

        if let Some(key) = &config.perplexity_api_key {
            providers.push(Box::new(PerplexityProvider::new(
                key.clone(),
                config.search_timeout_secs,
            )));
        }
        if let Some(key) = &config.tavily_api_key {
            providers.push(Box::new(TavilyProvider::new(
                key.clone(),
                config.search_timeout_secs,
            )));
        }
        providers.push(Box::new(DuckDuckGoProvider::new(config.search_timeout_secs)));

        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Try each provider in priority order until one succeeds. Returns the
    /// last failure when every provider fails, or a chain-level failure
    /// when no provider is configured at all.
    pub async fn search_math_solution(&self, query: &str) -> SearchOutcome {
        let search_query = format!("mathematics {} step by step solution", query);

        let mut last_failure: Option<SearchOutcome> = None;

        for provider in &self.providers {
            info!("Trying {} search", provider.name());
            let outcome = provider.search(&search_query).await;

            if outcome.success {
                info!("{} search successful", provider.name());
                return outcome;
            }

            warn!(
                "{} search failed: {}",
                provider.name(),
                outcome.error.as_deref().unwrap_or("unknown error")
            );
            last_failure = Some(outcome);
        }

        last_failure
            .unwrap_or_else(|| SearchOutcome::failed("none", "no search providers configured"))
    }
}

/// Source-aware extraction of solution content from normalized results.
///
/// Perplexity already answers in prose, so its content is used directly.
/// Everything else gets up to the first two results as labeled blocks
/// under a fixed scaffold.
pub fn extract_solution_content(results: &[SearchResult], source: &str) -> String {
    if results.is_empty() {
        return "No relevant solutions found online.".to_string();
    }

    if source == "perplexity" {
        return format!("**Perplexity AI Response:**\n\n{}\n", results[0].content);
    }

    let mut content =
        String::from("Based on online resources, here are some hints and reasoning steps:\n\n");

    for (i, result) in results.iter().take(2).enumerate() {
        content.push_str(&format!("**Source {}: {}**\n", i + 1, result.title));
        if let Some(url) = &result.url {
            if !url.is_empty() {
                content.push_str(&format!("URL: {}\n", url));
            }
        }
        content.push_str(&format!("Content: {}\n\n", result.content));
    }

    content
}

/// Char-boundary-safe truncation with an ellipsis marker.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}...", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(title: &str, url: Option<&str>, content: &str) -> SearchResult {
        SearchResult {
            title: title.to_string(),
            url: url.map(String::from),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_extract_empty_results() {
        assert_eq!(
            extract_solution_content(&[], "tavily"),
            "No relevant solutions found online."
        );
    }

    #[test]
    fn test_extract_perplexity_uses_content_directly() {
        let results = vec![result("Perplexity Mathematical Solution", None, "x = -2 and x = -3")];
        let content = extract_solution_content(&results, "perplexity");
        assert!(content.starts_with("**Perplexity AI Response:**"));
        assert!(content.contains("x = -2 and x = -3"));
    }

    #[test]
    fn test_extract_labels_first_two_results() {
        let results = vec![
            result("Khan Academy", Some("https://khanacademy.org"), "factor the quadratic"),
            result("MathWorld", Some("https://mathworld.wolfram.com"), "use the formula"),
            result("Third", None, "should not appear"),
        ];
        let content = extract_solution_content(&results, "duckduckgo");
        assert!(content.contains("**Source 1: Khan Academy**"));
        assert!(content.contains("URL: https://khanacademy.org"));
        assert!(content.contains("**Source 2: MathWorld**"));
        assert!(!content.contains("should not appear"));
    }

    #[test]
    fn test_extract_skips_empty_url() {
        let results = vec![result("No Link", Some(""), "content only")];
        let content = extract_solution_content(&results, "duckduckgo");
        assert!(!content.contains("URL:"));
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        // Multibyte content must not panic.
        let truncated = truncate_chars("∫∫∫∫∫", 2);
        assert_eq!(truncated, "∫∫...");
    }
}
