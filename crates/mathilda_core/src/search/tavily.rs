//! Tavily search provider (secondary).

use super::provider::SearchProvider;
use super::{SearchOutcome, SearchResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

const TAVILY_URL: &str = "https://api.tavily.com/search";
const MAX_RESULTS: usize = 3;

pub struct TavilyProvider {
    client: reqwest::Client,
    api_key: String,
}

impl TavilyProvider {
    pub fn new(api_key: String, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key,
        }
    }

    fn normalize(results: &[Value]) -> Vec<SearchResult> {
        results
            .iter()
            .take(MAX_RESULTS)
            .map(|r| SearchResult {
                title: r
                    .get("title")
                    .and_then(|t| t.as_str())
                    .unwrap_or("Unknown Title")
                    .to_string(),
                url: r.get("url").and_then(|u| u.as_str()).map(String::from),
                content: r
                    .get("content")
                    .and_then(|c| c.as_str())
                    .unwrap_or("No content available")
                    .to_string(),
            })
            .collect()
    }
}

#[async_trait]
impl SearchProvider for TavilyProvider {
    fn name(&self) -> &'static str {
        "tavily"
    }

    async fn search(&self, query: &str) -> SearchOutcome {
        let payload = json!({
            "api_key": self.api_key,
            "query": query,
            "search_depth": "advanced",
            "max_results": MAX_RESULTS,
        });

        let response = match self.client.post(TAVILY_URL).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => return SearchOutcome::failed(self.name(), format!("Network error: {}", e)),
        };

        if !response.status().is_success() {
            return SearchOutcome::failed(
                self.name(),
                format!("Tavily API error: {}", response.status()),
            );
        }

        let data: Value = match response.json().await {
            Ok(data) => data,
            Err(e) => {
                return SearchOutcome::failed(self.name(), format!("JSON decode error: {}", e))
            }
        };

        let raw = data
            .get("results")
            .and_then(|r| r.as_array())
            .cloned()
            .unwrap_or_default();

        if raw.is_empty() {
            return SearchOutcome::failed(self.name(), "Tavily returned no results");
        }

        SearchOutcome::ok(self.name(), Self::normalize(&raw))
    }
}
