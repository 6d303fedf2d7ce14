//! Perplexity search provider (primary).
//!
//! Perplexity is an answer engine rather than a link index: one chat
//! completion with web access returns prose plus citations. The response
//! is normalized into result records: one per citation, or a single
//! full-response record when no usable citations come back.

use super::provider::SearchProvider;
use super::{truncate_chars, SearchOutcome, SearchResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

const PERPLEXITY_URL: &str = "https://api.perplexity.ai/chat/completions";
const SEARCH_MODEL: &str = "llama-3.1-sonar-small-128k-online";
const MAX_RESULTS: usize = 3;

/// Trusted math reference sites the search is steered toward.
const MATH_DOMAINS: [&str; 4] = [
    "wolframalpha.com",
    "khanacademy.org",
    "mathworld.wolfram.com",
    "brilliant.org",
];

pub struct PerplexityProvider {
    client: reqwest::Client,
    api_key: String,
}

impl PerplexityProvider {
    pub fn new(api_key: String, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key,
        }
    }

    /// Turn citations (objects or bare URL strings, depending on API
    /// vintage) into normalized results carrying the answer content.
    fn normalize(&self, content: &str, citations: &[Value]) -> Vec<SearchResult> {
        let snippet = truncate_chars(content, 500);
        let mut results = Vec::new();

        for (i, citation) in citations.iter().take(MAX_RESULTS).enumerate() {
            if let Some(obj) = citation.as_object() {
                results.push(SearchResult {
                    title: obj
                        .get("title")
                        .and_then(|t| t.as_str())
                        .unwrap_or(&format!("Mathematical Resource {}", i + 1))
                        .to_string(),
                    url: obj.get("url").and_then(|u| u.as_str()).map(String::from),
                    content: snippet.clone(),
                });
            } else if let Some(url) = citation.as_str() {
                results.push(SearchResult {
                    title: format!("Mathematical Resource {}", i + 1),
                    url: Some(url.to_string()),
                    content: snippet.clone(),
                });
            }
        }

        if results.is_empty() {
            results.push(SearchResult {
                title: "Perplexity Mathematical Solution".to_string(),
                url: Some("https://perplexity.ai".to_string()),
                content: content.to_string(),
            });
        }

        results
    }
}

#[async_trait]
impl SearchProvider for PerplexityProvider {
    fn name(&self) -> &'static str {
        "perplexity"
    }

    async fn search(&self, query: &str) -> SearchOutcome {
        let payload = json!({
            "model": SEARCH_MODEL,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a helpful assistant that provides detailed mathematical \
                                solutions with step-by-step explanations. Always cite sources when \
                                providing information from the web."
                },
                {
                    "role": "user",
                    "content": format!(
                        "Find comprehensive information about: {}. Provide step-by-step \
                         mathematical solution if applicable. Include relevant formulas and examples.",
                        query
                    )
                }
            ],
            "max_tokens": 1000,
            "temperature": 0.2,
            "top_p": 0.9,
            "search_domain_filter": MATH_DOMAINS,
            "return_citations": true,
            "return_images": false
        });

        let response = match self
            .client
            .post(PERPLEXITY_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return SearchOutcome::failed(self.name(), format!("Network error: {}", e)),
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return SearchOutcome::failed(
                self.name(),
                format!("Perplexity API error: {} - {}", status, body),
            );
        }

        let data: Value = match response.json().await {
            Ok(data) => data,
            Err(e) => {
                return SearchOutcome::failed(self.name(), format!("JSON decode error: {}", e))
            }
        };

        let content = match data
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
        {
            Some(content) => content,
            None => return SearchOutcome::failed(self.name(), "No choices in response"),
        };

        let citations = data
            .get("citations")
            .and_then(|c| c.as_array())
            .cloned()
            .unwrap_or_default();

        SearchOutcome::ok(self.name(), self.normalize(content, &citations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> PerplexityProvider {
        PerplexityProvider::new("test-key".to_string(), 30)
    }

    #[test]
    fn test_normalize_object_citations() {
        let citations = vec![json!({"title": "Khan Academy", "url": "https://khanacademy.org"})];
        let results = provider().normalize("the answer is x = 2", &citations);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Khan Academy");
        assert_eq!(results[0].url.as_deref(), Some("https://khanacademy.org"));
        assert_eq!(results[0].content, "the answer is x = 2");
    }

    #[test]
    fn test_normalize_string_citations() {
        let citations = vec![json!("https://mathworld.wolfram.com")];
        let results = provider().normalize("content", &citations);
        assert_eq!(results[0].title, "Mathematical Resource 1");
        assert_eq!(
            results[0].url.as_deref(),
            Some("https://mathworld.wolfram.com")
        );
    }

    #[test]
    fn test_normalize_without_citations_yields_single_result() {
        let results = provider().normalize("full answer text", &[]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Perplexity Mathematical Solution");
        assert_eq!(results[0].content, "full answer text");
    }

    #[test]
    fn test_normalize_truncates_long_content_for_citations() {
        let long = "x".repeat(600);
        let citations = vec![json!({"title": "T", "url": "https://example.com"})];
        let results = provider().normalize(&long, &citations);
        assert!(results[0].content.len() < long.len());
        assert!(results[0].content.ends_with("..."));
    }
}
