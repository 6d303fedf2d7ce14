//! DuckDuckGo search provider (free fallback, always available).
//!
//! No API key, so this backend scrapes the HTML results page. Selectors
//! target the lite result markup, which has been stable for years; a
//! markup change degrades into an ordinary provider failure and the
//! synthesizer falls through to the next stage.

use super::provider::SearchProvider;
use super::{SearchOutcome, SearchResult};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;

const DDG_HTML_URL: &str = "https://html.duckduckgo.com/html/";
const MAX_RESULTS: usize = 3;
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";

pub struct DuckDuckGoProvider {
    client: reqwest::Client,
}

impl DuckDuckGoProvider {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Parse the results page into normalized records.
    fn parse_results(html: &str) -> Result<Vec<SearchResult>, String> {
        let document = Html::parse_document(html);

        let result_selector =
            Selector::parse("div.result").map_err(|e| format!("selector error: {:?}", e))?;
        let title_selector =
            Selector::parse("a.result__a").map_err(|e| format!("selector error: {:?}", e))?;
        let snippet_selector =
            Selector::parse("a.result__snippet").map_err(|e| format!("selector error: {:?}", e))?;

        let mut results = Vec::new();

        for element in document.select(&result_selector).take(MAX_RESULTS) {
            let title_el = element.select(&title_selector).next();
            let title = title_el
                .map(|t| t.text().collect::<String>().trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Unknown Title".to_string());

            let url = title_el
                .and_then(|t| t.value().attr("href"))
                .map(String::from);

            let content = element
                .select(&snippet_selector)
                .next()
                .map(|s| s.text().collect::<String>().trim().to_string())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "No content available".to_string());

            results.push(SearchResult {
                title,
                url,
                content,
            });
        }

        Ok(results)
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    fn name(&self) -> &'static str {
        "duckduckgo"
    }

    async fn search(&self, query: &str) -> SearchOutcome {
        let response = match self
            .client
            .get(DDG_HTML_URL)
            .query(&[("q", query)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return SearchOutcome::failed(self.name(), format!("Network error: {}", e)),
        };

        if !response.status().is_success() {
            return SearchOutcome::failed(
                self.name(),
                format!("DuckDuckGo returned HTTP {}", response.status()),
            );
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return SearchOutcome::failed(self.name(), format!("Body read error: {}", e))
            }
        };

        let results = match Self::parse_results(&body) {
            Ok(results) => results,
            Err(e) => return SearchOutcome::failed(self.name(), e),
        };

        if results.is_empty() {
            return SearchOutcome::failed(self.name(), "No DuckDuckGo results found");
        }

        SearchOutcome::ok(self.name(), results)
    }
}
