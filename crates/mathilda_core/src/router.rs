//! Routing orchestrator: one pass per query, graceful degradation at
//! every stage.
//!
//! Pipeline: input guardrails → knowledge-base lookup → web search or
//! AI generation → output guardrails → envelope. Component failures are
//! absorbed locally (a failed KB search is a miss, a failed search chain
//! means AI-only generation); anything unexpected is converted into a
//! `system_error` envelope at the boundary. `process_query` never
//! propagates an error to its caller.

use crate::config::Config;
use crate::error::MathildaError;
use crate::feedback::{FeedbackEntry, FeedbackLog};
use crate::guardrails::GuardrailsValidator;
use crate::knowledge::{KnowledgeBase, MathRecord};
use crate::response::{FeedbackResponse, SolutionEnvelope, Source, DEFAULT_CONFIDENCE};
use crate::search::{extract_solution_content, SearchChain};
use crate::synthesis::SolutionSynthesizer;
use tracing::{error, info, warn};

/// Top-level routing agent. Owns every pipeline component; the
/// presentation layer only ever calls [`process_query`] and
/// [`process_feedback`].
///
/// [`process_query`]: MathRouter::process_query
/// [`process_feedback`]: MathRouter::process_feedback
pub struct MathRouter {
    guardrails: GuardrailsValidator,
    knowledge: KnowledgeBase,
    search: SearchChain,
    synthesizer: SolutionSynthesizer,
    feedback_log: FeedbackLog,
}

impl MathRouter {
    /// Build the full pipeline from configuration. Dataset loading is
    /// best-effort: a missing file leaves the knowledge base empty.
    pub fn new(config: &Config) -> Self {
        let mut knowledge = KnowledgeBase::new(config);
        knowledge.load_dataset(&config.dataset_path);

        Self {
            guardrails: GuardrailsValidator::new(config.max_query_length),
            knowledge,
            search: SearchChain::from_config(config),
            synthesizer: SolutionSynthesizer::from_config(config),
            feedback_log: FeedbackLog::new(&config.feedback_path),
        }
    }

    pub fn with_knowledge(mut self, knowledge: KnowledgeBase) -> Self {
        self.knowledge = knowledge;
        self
    }

    pub fn with_search_chain(mut self, search: SearchChain) -> Self {
        self.search = search;
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: SolutionSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn with_feedback_log(mut self, feedback_log: FeedbackLog) -> Self {
        self.feedback_log = feedback_log;
        self
    }

    /// Route one query to a solution envelope. Infallible at the
    /// signature level: internal errors become `system_error` envelopes.
    pub async fn process_query(&self, query: &str) -> SolutionEnvelope {
        match self.route(query).await {
            Ok(envelope) => envelope,
            Err(e) => {
                error!("Query processing failed: {}", e);
                SolutionEnvelope::system_error(format!("Processing failed: {}", e))
            }
        }
    }

    async fn route(&self, query: &str) -> Result<SolutionEnvelope, MathildaError> {
        // Step 1: input guardrails.
        let verdict = self.guardrails.validate_input(query);
        if !verdict.accepted {
            info!("Query rejected by guardrails: {}", verdict.message);
            return Ok(SolutionEnvelope::rejected(Source::Guardrails, verdict.message));
        }

        // Step 2: knowledge-base lookup. An index error is a miss.
        let kb_hit = match self.knowledge.search(query) {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Knowledge base search failed: {}", e);
                None
            }
        };

        // Step 3: pick the solution source.
        let (solution, source, confidence) = match kb_hit {
            Some(hit) => {
                info!("Knowledge base hit with confidence {:.2}", hit.confidence);
                (
                    format_kb_solution(&hit.record),
                    Source::KnowledgeBase,
                    hit.confidence,
                )
            }
            None => {
                let outcome = self.search.search_math_solution(query).await;
                if outcome.success {
                    let web_content = extract_solution_content(&outcome.results, &outcome.source);
                    let solution = self
                        .synthesizer
                        .generate_step_by_step_solution(query, Some(&web_content))
                        .await;
                    (
                        solution,
                        Source::WebSearch(outcome.source),
                        DEFAULT_CONFIDENCE,
                    )
                } else {
                    if let Some(e) = &outcome.error {
                        info!("Web search unavailable ({}), generating without context", e);
                    }
                    let solution = self
                        .synthesizer
                        .generate_step_by_step_solution(query, None)
                        .await;
                    (solution, Source::AiGenerated, DEFAULT_CONFIDENCE)
                }
            }
        };

        // Step 4: output guardrails.
        let output_verdict = self.guardrails.validate_output(&solution);
        if !output_verdict.accepted {
            info!("Solution rejected by output guardrails: {}", output_verdict.message);
            return Ok(SolutionEnvelope::rejected(
                Source::OutputGuardrails,
                output_verdict.message,
            ));
        }

        // Step 5: success.
        Ok(SolutionEnvelope::success(solution, source, confidence))
    }

    /// Ingest human feedback. A rating below 3 triggers a refinement pass;
    /// the entry is always appended to the log. Soft failures only.
    pub async fn process_feedback(
        &self,
        query: &str,
        solution: &str,
        feedback: &str,
        rating: u8,
    ) -> FeedbackResponse {
        let refined = if rating < 3 {
            info!("Low rating ({}), refining solution", rating);
            self.synthesizer.simplify_solution(solution, feedback).await
        } else {
            solution.to_string()
        };

        let entry = FeedbackEntry::new(query, solution, &refined, feedback, rating);
        if let Err(e) = self.feedback_log.append(&entry) {
            warn!("Failed to persist feedback: {}", e);
            return FeedbackResponse::failure(format!("Feedback processing failed: {}", e));
        }

        FeedbackResponse::success(refined)
    }

    /// Most recent feedback entries, oldest first. A missing or unreadable
    /// log reads as empty.
    pub fn feedback_history(&self, limit: usize) -> Vec<FeedbackEntry> {
        match self.feedback_log.recent(limit) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Could not read feedback log: {}", e);
                Vec::new()
            }
        }
    }

    /// Number of records in the knowledge index.
    pub fn knowledge_size(&self) -> usize {
        self.knowledge.len()
    }

    /// Configured search provider tags, in priority order.
    pub fn search_providers(&self) -> Vec<&'static str> {
        self.search.provider_names()
    }
}

/// Standard rendering for a knowledge-base record.
fn format_kb_solution(record: &MathRecord) -> String {
    format!(
        "**Topic:** {}\n\
         **Difficulty:** {}\n\n\
         **Question:** {}\n\n\
         **Solution:**\n{}\n\n\
         *Source: Knowledge Base*",
        record.topic, record.difficulty, record.question, record.solution
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_kb_solution() {
        let record = MathRecord {
            question: "Solve x^2 = 4".to_string(),
            solution: "x = 2 or x = -2".to_string(),
            topic: "algebra".to_string(),
            difficulty: "easy".to_string(),
        };
        let text = format_kb_solution(&record);
        assert!(text.contains("**Topic:** algebra"));
        assert!(text.contains("**Difficulty:** easy"));
        assert!(text.contains("**Question:** Solve x^2 = 4"));
        assert!(text.contains("x = 2 or x = -2"));
        assert!(text.ends_with("*Source: Knowledge Base*"));
    }
}
