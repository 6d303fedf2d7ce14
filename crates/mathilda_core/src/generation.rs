//! Text-generation providers.
//!
//! One narrow capability: `generate(system_instruction, user_prompt)` under
//! a caller-visible timeout. Failures surface as errors, never as partial
//! successes; the synthesizer decides what to do next.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

const PERPLEXITY_URL: &str = "https://api.perplexity.ai/chat/completions";
const GENERATION_MODEL: &str = "llama-3.1-sonar-large-128k-online";

const HF_BASE_URL: &str = "https://api-inference.huggingface.co/models";

/// Hosted models tried in order by the Hugging Face generator.
const HF_MODELS: [&str; 4] = [
    "microsoft/DialoGPT-medium",
    "facebook/blenderbot_small-90M",
    "distilgpt2",
    "gpt2",
];

/// Retry policy for the Hugging Face inference API. This is the only
/// retry loop in the system; every other failure falls through to the
/// next pipeline stage instead of repeating.
const HF_MAX_RETRIES: usize = 3;
const MODEL_LOADING_BACKOFF: Duration = Duration::from_secs(15);
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(10);

/// Minimum length for a Hugging Face completion to count as usable.
const HF_MIN_OUTPUT_LEN: usize = 50;

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Short tag, e.g. `"perplexity"`.
    fn name(&self) -> &'static str;

    /// Human-readable label used in solution provenance lines.
    fn label(&self) -> &'static str;

    /// Produce text for the given instruction and prompt.
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Perplexity chat-completions generator. Low temperature: precise math
/// over creative prose.
pub struct PerplexityGenerator {
    client: reqwest::Client,
    api_key: String,
}

impl PerplexityGenerator {
    pub fn new(api_key: String, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key,
        }
    }
}

#[async_trait]
impl GenerationProvider for PerplexityGenerator {
    fn name(&self) -> &'static str {
        "perplexity"
    }

    fn label(&self) -> &'static str {
        "Perplexity AI"
    }

    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: GENERATION_MODEL.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            max_tokens: 2000,
            temperature: 0.1,
            top_p: 0.9,
        };

        let response = self
            .client
            .post(PERPLEXITY_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Perplexity")?;

        if !response.status().is_success() {
            bail!("Perplexity API error: {}", response.status());
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("Failed to parse Perplexity response")?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .context("Perplexity response contained no choices")?;

        Ok(content)
    }
}

/// Hugging Face inference-API generator. Tries a list of hosted models in
/// order; retries with fixed backoff when a model is loading (503) or
/// rate-limited (429).
pub struct HuggingFaceGenerator {
    client: reqwest::Client,
    token: String,
}

impl HuggingFaceGenerator {
    pub fn new(token: String, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            token,
        }
    }

    async fn call_model(&self, model: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/{}", HF_BASE_URL, model);

        let payload = serde_json::json!({
            "inputs": prompt,
            "parameters": {
                "max_length": 1000,
                "temperature": 0.3,
                "do_sample": true,
                "top_p": 0.9,
                "return_full_text": false
            },
            "options": {
                "use_cache": false,
                "wait_for_model": true
            }
        });

        for attempt in 1..=HF_MAX_RETRIES {
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.token)
                .json(&payload)
                .send()
                .await
                .context("Failed to send request to Hugging Face")?;

            match response.status().as_u16() {
                200 => {
                    let data: Value = response
                        .json()
                        .await
                        .context("Failed to parse Hugging Face response")?;
                    return Ok(extract_generated_text(&data));
                }
                503 => {
                    info!("Model {} is loading, waiting (attempt {})", model, attempt);
                    tokio::time::sleep(MODEL_LOADING_BACKOFF).await;
                }
                429 => {
                    info!("Rate limited on {}, waiting (attempt {})", model, attempt);
                    tokio::time::sleep(RATE_LIMIT_BACKOFF).await;
                }
                status => {
                    let body = response.text().await.unwrap_or_default();
                    bail!("HTTP {}: {}", status, body);
                }
            }
        }

        bail!("Max retries exceeded for model {}", model)
    }
}

/// The inference API answers either `[{"generated_text": ..}]` or a bare
/// object, depending on the model pipeline.
fn extract_generated_text(data: &Value) -> String {
    let text = match data {
        Value::Array(items) => items
            .first()
            .and_then(|item| item.get("generated_text"))
            .and_then(|t| t.as_str())
            .unwrap_or(""),
        other => other
            .get("generated_text")
            .and_then(|t| t.as_str())
            .unwrap_or(""),
    };
    text.trim().to_string()
}

#[async_trait]
impl GenerationProvider for HuggingFaceGenerator {
    fn name(&self) -> &'static str {
        "huggingface"
    }

    fn label(&self) -> &'static str {
        "Hugging Face"
    }

    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        // The inference API takes a single prompt; fold the instruction in.
        let prompt = format!("{}\n\n{}", system_prompt, user_prompt);

        for model in HF_MODELS {
            match self.call_model(model, &prompt).await {
                Ok(text) if text.len() >= HF_MIN_OUTPUT_LEN => {
                    info!("Model {} produced a usable completion", model);
                    return Ok(text);
                }
                Ok(_) => warn!("Model {} returned a trivial completion, trying next", model),
                Err(e) => warn!("Model {} failed: {:#}", model, e),
            }
        }

        bail!("All Hugging Face models failed or returned trivial output")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_generated_text_from_array() {
        let data = json!([{"generated_text": "  Step 1: factor  "}]);
        assert_eq!(extract_generated_text(&data), "Step 1: factor");
    }

    #[test]
    fn test_extract_generated_text_from_object() {
        let data = json!({"generated_text": "x = 2"});
        assert_eq!(extract_generated_text(&data), "x = 2");
    }

    #[test]
    fn test_extract_generated_text_missing_field() {
        let data = json!({"error": "model overloaded"});
        assert_eq!(extract_generated_text(&data), "");
    }

    #[test]
    fn test_chat_request_serializes_messages_in_order() {
        let request = ChatRequest {
            model: GENERATION_MODEL.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: "be precise".to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: "solve x".to_string(),
                },
            ],
            max_tokens: 2000,
            temperature: 0.1,
            top_p: 0.9,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "solve x");
        assert_eq!(value["model"], GENERATION_MODEL);
    }
}
