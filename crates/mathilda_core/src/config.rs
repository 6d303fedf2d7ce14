//! Runtime configuration for the routing core.
//!
//! Built once at process start (usually via [`Config::from_env`]) and passed
//! by reference into component constructors. Components never read the
//! environment themselves.

use std::path::PathBuf;

/// Environment variable names for provider credentials.
pub const ENV_PERPLEXITY_API_KEY: &str = "PERPLEXITY_API_KEY";
pub const ENV_TAVILY_API_KEY: &str = "TAVILY_API_KEY";
pub const ENV_HF_API_TOKEN: &str = "HF_API_TOKEN";
pub const ENV_FAST_MODE: &str = "MATHILDA_FAST_MODE";

/// Core configuration: provider credentials, guardrail limits, retrieval
/// threshold and storage paths.
#[derive(Debug, Clone)]
pub struct Config {
    /// Perplexity credential. `None` means the provider is unconfigured and
    /// skipped by both the search chain and the synthesizer.
    pub perplexity_api_key: Option<String>,
    /// Tavily credential.
    pub tavily_api_key: Option<String>,
    /// Hugging Face inference token.
    pub hf_api_token: Option<String>,
    /// Maximum accepted query length in characters.
    pub max_query_length: usize,
    /// Minimum cosine similarity for a knowledge-base hit.
    pub similarity_threshold: f32,
    /// Skip the slower search-backed synthesis stages.
    pub fast_mode: bool,
    /// Knowledge dataset location. A missing file is not an error.
    pub dataset_path: PathBuf,
    /// Append-only feedback log location.
    pub feedback_path: PathBuf,
    /// Timeout for each search provider call.
    pub search_timeout_secs: u64,
    /// Timeout for each generation provider call.
    pub generate_timeout_secs: u64,
}

fn default_max_query_length() -> usize {
    500
}

fn default_similarity_threshold() -> f32 {
    0.7
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("data/math_dataset.json")
}

fn default_feedback_path() -> PathBuf {
    PathBuf::from("data/feedback.jsonl")
}

fn default_search_timeout() -> u64 {
    30
}

fn default_generate_timeout() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            perplexity_api_key: None,
            tavily_api_key: None,
            hf_api_token: None,
            max_query_length: default_max_query_length(),
            similarity_threshold: default_similarity_threshold(),
            fast_mode: true,
            dataset_path: default_dataset_path(),
            feedback_path: default_feedback_path(),
            search_timeout_secs: default_search_timeout(),
            generate_timeout_secs: default_generate_timeout(),
        }
    }
}

impl Config {
    /// Build a configuration from the process environment.
    ///
    /// Absent credentials leave the matching provider unconfigured; empty
    /// strings count as absent so `FOO=` in a unit file does not enable a
    /// provider with a blank key.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.perplexity_api_key = non_empty_env(ENV_PERPLEXITY_API_KEY);
        config.tavily_api_key = non_empty_env(ENV_TAVILY_API_KEY);
        config.hf_api_token = non_empty_env(ENV_HF_API_TOKEN);
        if let Some(v) = non_empty_env(ENV_FAST_MODE) {
            config.fast_mode = !matches!(v.as_str(), "0" | "false" | "off");
        }
        config
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_query_length, 500);
        assert!((config.similarity_threshold - 0.7).abs() < f32::EPSILON);
        assert!(config.fast_mode);
        assert!(config.perplexity_api_key.is_none());
        assert_eq!(config.search_timeout_secs, 30);
        assert_eq!(config.generate_timeout_secs, 60);
    }
}
