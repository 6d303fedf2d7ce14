//! Result envelopes returned by the routing orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Confidence reported when no real similarity score is available, i.e.
/// for anything other than a knowledge-base hit.
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

/// Which stage produced (or rejected) a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    KnowledgeBase,
    /// Web search via the named provider, e.g. `web_search_tavily`.
    WebSearch(String),
    AiGenerated,
    Guardrails,
    OutputGuardrails,
    SystemError,
}

impl Source {
    /// Stable string tag carried on the envelope.
    pub fn tag(&self) -> String {
        match self {
            Self::KnowledgeBase => "knowledge_base".to_string(),
            Self::WebSearch(provider) => format!("web_search_{}", provider),
            Self::AiGenerated => "ai_generated".to_string(),
            Self::Guardrails => "guardrails".to_string(),
            Self::OutputGuardrails => "output_guardrails".to_string(),
            Self::SystemError => "system_error".to_string(),
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Response to one routed query. Built once, never mutated; re-generation
/// after feedback produces a fresh envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    /// Provenance tag: `knowledge_base`, `web_search_<provider>`,
    /// `ai_generated`, or one of the rejection/error tags.
    pub source: String,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl SolutionEnvelope {
    pub fn success(solution: String, source: Source, confidence: f32) -> Self {
        Self {
            success: true,
            solution: Some(solution),
            source: source.tag(),
            confidence,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn rejected(source: Source, message: String) -> Self {
        Self {
            success: false,
            solution: None,
            source: source.tag(),
            confidence: 0.0,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }

    pub fn system_error(message: String) -> Self {
        Self::rejected(Source::SystemError, message)
    }
}

/// Response to a feedback submission. Soft failures only; the feedback
/// path never raises to its caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refined_solution: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FeedbackResponse {
    pub fn success(refined_solution: String) -> Self {
        Self {
            success: true,
            refined_solution: Some(refined_solution),
            message: "Thank you for your feedback! The solution has been improved.".to_string(),
            error: None,
        }
    }

    pub fn failure(error: String) -> Self {
        Self {
            success: false,
            refined_solution: None,
            message: "Sorry, we couldn't process your feedback right now.".to_string(),
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_tags() {
        assert_eq!(Source::KnowledgeBase.tag(), "knowledge_base");
        assert_eq!(
            Source::WebSearch("duckduckgo".to_string()).tag(),
            "web_search_duckduckgo"
        );
        assert_eq!(Source::AiGenerated.tag(), "ai_generated");
        assert_eq!(Source::Guardrails.tag(), "guardrails");
        assert_eq!(Source::OutputGuardrails.tag(), "output_guardrails");
        assert_eq!(Source::SystemError.tag(), "system_error");
    }

    #[test]
    fn test_success_envelope() {
        let e = SolutionEnvelope::success("x = 2".to_string(), Source::KnowledgeBase, 0.85);
        assert!(e.success);
        assert_eq!(e.source, "knowledge_base");
        assert!(e.error.is_none());
        assert!((e.confidence - 0.85).abs() < f32::EPSILON);
    }

    #[test]
    fn test_rejected_envelope() {
        let e = SolutionEnvelope::rejected(Source::Guardrails, "off topic".to_string());
        assert!(!e.success);
        assert!(e.solution.is_none());
        assert_eq!(e.error.as_deref(), Some("off topic"));
    }

    #[test]
    fn test_envelope_serialization_omits_absent_fields() {
        let e = SolutionEnvelope::rejected(Source::Guardrails, "nope".to_string());
        let json = serde_json::to_string(&e).unwrap();
        assert!(!json.contains("\"solution\""));
        assert!(json.contains("\"error\""));
    }
}
