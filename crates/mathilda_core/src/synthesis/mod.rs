//! Solution synthesizer: a staged fallback machine.
//!
//! Stage order per call: primary generation provider, then (outside fast
//! mode) the search-backed secondary and tertiary paths, then the
//! deterministic templated scaffold. Each generated candidate must pass
//! the completeness policy or the pipeline falls through to the next
//! stage. The presentation wrapper is applied exactly once, at the stage
//! that produced the accepted text.

pub mod completeness;
pub mod template;

use crate::config::Config;
use crate::generation::{GenerationProvider, HuggingFaceGenerator, PerplexityGenerator};
use crate::search::provider::SearchProvider;
use crate::search::{truncate_chars, DuckDuckGoProvider, TavilyProvider};
use completeness::{looks_complete, CompletenessPolicy};
use tracing::{info, warn};

/// Instruction for the direct-generation stage.
const SOLUTION_SYSTEM_PROMPT: &str = "You are an expert mathematics professor. Provide complete, detailed step-by-step \
solutions to mathematical problems.

IMPORTANT: Always include:
1. Problem identification and approach
2. All mathematical steps with clear explanations
3. Intermediate calculations shown
4. Final answer clearly stated
5. Verification when applicable

Use proper mathematical notation and be thorough.";

/// Instruction for synthesizing a solution out of search results.
const SEARCH_SYNTHESIS_SYSTEM_PROMPT: &str = "You are a mathematics expert. Using the provided search results, create a complete \
step-by-step solution to the mathematical problem.

Extract the relevant mathematical information from the search results and present it \
as a clear, organized solution with:
1. Problem analysis
2. Step-by-step solution process
3. All calculations shown
4. Final answer
5. Verification if possible";

/// Instruction for the feedback-driven refinement pass.
const SIMPLIFY_SYSTEM_PROMPT: &str = "You are a patient mathematics tutor. Rewrite the given solution so it is easier to \
follow, directly addressing the student's feedback. Keep every step mathematically \
correct, show all working, and state the final answer clearly.";

/// How much search content is handed to the generation provider.
const MAX_SEARCH_CONTEXT_CHARS: usize = 1500;

/// Multi-stage solution generator.
pub struct SolutionSynthesizer {
    primary: Option<Box<dyn GenerationProvider>>,
    processor: Option<Box<dyn GenerationProvider>>,
    secondary_search: Option<Box<dyn SearchProvider>>,
    tertiary_search: Option<Box<dyn SearchProvider>>,
    fast_mode: bool,
    completeness: CompletenessPolicy,
}

impl SolutionSynthesizer {
    /// Bare synthesizer: no providers, template fallback only. Useful for
    /// offline operation and tests.
    pub fn new(fast_mode: bool) -> Self {
        Self {
            primary: None,
            processor: None,
            secondary_search: None,
            tertiary_search: None,
            fast_mode,
            completeness: looks_complete,
        }
    }

    /// Wire up providers from the configuration: Perplexity as the primary
    /// generator, Hugging Face as the search-content processor, Tavily and
    /// DuckDuckGo as the search-backed fallback stages.
    pub fn from_config(config: &Config) -> Self {
        let mut synthesizer = Self::new(config.fast_mode);

        if let Some(key) = &config.perplexity_api_key {
            synthesizer.primary = Some(Box::new(PerplexityGenerator::new(
                key.clone(),
                config.generate_timeout_secs,
            )));
        }
        if let Some(token) = &config.hf_api_token {
            synthesizer.processor = Some(Box::new(HuggingFaceGenerator::new(
                token.clone(),
                config.generate_timeout_secs,
            )));
        }
        if let Some(key) = &config.tavily_api_key {
            synthesizer.secondary_search = Some(Box::new(TavilyProvider::new(
                key.clone(),
                config.search_timeout_secs,
            )));
        }
        synthesizer.tertiary_search =
            Some(Box::new(DuckDuckGoProvider::new(config.search_timeout_secs)));

        synthesizer
    }

    pub fn with_primary(mut self, provider: Box<dyn GenerationProvider>) -> Self {
        self.primary = Some(provider);
        self
    }

    pub fn with_processor(mut self, provider: Box<dyn GenerationProvider>) -> Self {
        self.processor = Some(provider);
        self
    }

    pub fn with_secondary_search(mut self, provider: Box<dyn SearchProvider>) -> Self {
        self.secondary_search = Some(provider);
        self
    }

    pub fn with_tertiary_search(mut self, provider: Box<dyn SearchProvider>) -> Self {
        self.tertiary_search = Some(provider);
        self
    }

    pub fn with_completeness_policy(mut self, policy: CompletenessPolicy) -> Self {
        self.completeness = policy;
        self
    }

    /// Produce a formatted step-by-step solution. Never fails: the
    /// templated scaffold is the floor.
    pub async fn generate_step_by_step_solution(
        &self,
        query: &str,
        web_content: Option<&str>,
    ) -> String {
        info!("Starting multi-source solution generation");

        // Stage 1: direct generation.
        if let Some(primary) = &self.primary {
            let user_prompt = build_user_prompt(query, web_content);
            match primary.generate(SOLUTION_SYSTEM_PROMPT, &user_prompt).await {
                Ok(body) if (self.completeness)(&body) => {
                    info!("{} provided a complete solution", primary.label());
                    return format_solution(&body, query, primary.label());
                }
                Ok(_) => warn!(
                    "{} returned an incomplete solution, falling through",
                    primary.label()
                ),
                Err(e) => warn!("{} generation failed: {:#}", primary.label(), e),
            }
        }

        // Stages 2 and 3: search-backed generation, skipped in fast mode.
        if !self.fast_mode {
            if let Some(provider) = &self.secondary_search {
                if let Some(solution) = self.search_backed_solution(provider.as_ref(), query).await
                {
                    return solution;
                }
            }
            if let Some(provider) = &self.tertiary_search {
                if let Some(solution) = self.search_backed_solution(provider.as_ref(), query).await
                {
                    return solution;
                }
            }
        }

        // Stage 4: deterministic scaffold. Cannot fail.
        info!("Falling back to templated scaffold");
        template::comprehensive_fallback(query)
    }

    /// Run one search-backed stage: search, merge results, synthesize.
    async fn search_backed_solution(
        &self,
        provider: &dyn SearchProvider,
        query: &str,
    ) -> Option<String> {
        let outcome = provider
            .search(&format!("step by step solution {} mathematics", query))
            .await;

        if !outcome.success || outcome.results.is_empty() {
            warn!(
                "{} search stage failed: {}",
                provider.name(),
                outcome.error.as_deref().unwrap_or("no results")
            );
            return None;
        }

        let search_content = merge_search_content(&outcome.results);

        let body = match self.primary.as_ref().or(self.processor.as_ref()) {
            Some(generator) => {
                let user_prompt = format!(
                    "Based on these search results:\n\n{}\n\nCreate a complete step-by-step \
                     solution for: {}",
                    truncate_chars(&search_content, MAX_SEARCH_CONTEXT_CHARS),
                    query
                );
                match generator
                    .generate(SEARCH_SYNTHESIS_SYSTEM_PROMPT, &user_prompt)
                    .await
                {
                    Ok(body) => body,
                    Err(e) => {
                        warn!(
                            "Failed to process {} results with {}: {:#}",
                            outcome.source,
                            generator.label(),
                            e
                        );
                        return None;
                    }
                }
            }
            // No generator at all: present the research findings directly.
            None => {
                let document = format_search_findings(query, &search_content, &outcome.source);
                return (self.completeness)(&document).then_some(document);
            }
        };

        if !(self.completeness)(&body) {
            warn!("Search-backed candidate from {} was incomplete", outcome.source);
            return None;
        }

        Some(format_solution(&body, query, &outcome.source))
    }

    /// Refine a solution based on user feedback. Guaranteed never worse
    /// than the input: any provider failure or incomplete candidate
    /// returns the original unchanged.
    pub async fn simplify_solution(&self, previous: &str, feedback: &str) -> String {
        let Some(generator) = self.primary.as_ref().or(self.processor.as_ref()) else {
            info!("No generation provider available, keeping original solution");
            return previous.to_string();
        };

        let user_prompt = format!(
            "Here is a mathematical solution a student found hard to follow:\n\n{}\n\n\
             Student feedback:\n{}\n\n\
             Rewrite the solution addressing this feedback.",
            previous, feedback
        );

        match generator.generate(SIMPLIFY_SYSTEM_PROMPT, &user_prompt).await {
            Ok(body) if (self.completeness)(&body) => body,
            Ok(_) => {
                warn!("Refinement candidate was incomplete, keeping original");
                previous.to_string()
            }
            Err(e) => {
                warn!("Refinement failed ({:#}), keeping original", e);
                previous.to_string()
            }
        }
    }
}

fn build_user_prompt(query: &str, web_content: Option<&str>) -> String {
    match web_content {
        Some(content) => format!(
            "Solve this mathematical problem with complete step-by-step solution:\n\n{}\n\n\
             Supporting material gathered from the web:\n\n{}\n\n\
             Please provide a detailed mathematical solution showing every step of the work.",
            query,
            truncate_chars(content, MAX_SEARCH_CONTEXT_CHARS)
        ),
        None => format!(
            "Solve this mathematical problem with complete step-by-step solution:\n\n{}\n\n\
             Please provide a detailed mathematical solution showing every step of the work.",
            query
        ),
    }
}

/// Flatten normalized results into one labeled text block.
fn merge_search_content(results: &[crate::search::SearchResult]) -> String {
    let mut parts = Vec::new();
    for result in results {
        parts.push(format!("Title: {}", result.title));
        parts.push(format!("Content: {}", result.content));
        parts.push("---".to_string());
    }
    parts.join("\n")
}

/// The single presentation wrapper: header naming the problem, provenance
/// line, body between rules, provenance footnote.
pub fn format_solution(body: &str, query: &str, source: &str) -> String {
    format!(
        "## 🧮 Mathematical Solution\n\n\
         **Problem:** {}\n\n\
         **Solution Source:** {}\n\n\
         ---\n\n\
         {}\n\n\
         ---\n\n\
         *✨ Solution generated using advanced AI with mathematical reasoning*\n\
         *🔍 Source: {}*",
        query,
        source,
        body.trim(),
        source
    )
}

/// Research-based presentation used when no generator is configured to
/// process search results.
fn format_search_findings(query: &str, search_content: &str, source: &str) -> String {
    format!(
        "## 🔍 Mathematical Solution (Research-Based)\n\n\
         **Problem:** {}\n\n\
         **Research Source:** {}\n\n\
         ---\n\n\
         ### 📚 Research Findings:\n\n\
         {}\n\n\
         ---\n\n\
         ### 💡 Solution Approach:\n\n\
         Based on the research above, here's how to approach this problem:\n\n\
         1. **Identify the Problem Type**: Analyze the mathematical concept involved\n\
         2. **Extract Key Information**: Use the research findings to understand the method\n\
         3. **Apply the Method**: Follow the step-by-step process indicated in the research\n\
         4. **Calculate**: Perform the necessary mathematical operations\n\
         5. **Verify**: Check your answer using the verification methods mentioned\n\n\
         ---\n\n\
         *🔍 Solution compiled from {} research results*",
        query,
        source,
        truncate_chars(search_content, 1200),
        source
    )
}
