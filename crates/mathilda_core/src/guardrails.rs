//! Input and output guardrails.
//!
//! Pure, stateless validation: query length, topic vocabulary, blocked
//! terms, and a minimal output length. Matching is case-insensitive
//! *substring* matching, not tokenized, so "mode" matches inside "model".
//! That quirk is intentional; callers depend on the permissive topic gate.

/// Mathematics-domain vocabulary. A query must contain at least one of
/// these (as a substring) to be accepted.
const MATH_KEYWORDS: [&str; 51] = [
    "solve",
    "equation",
    "algebra",
    "calculus",
    "geometry",
    "trigonometry",
    "statistics",
    "probability",
    "derivative",
    "integral",
    "limit",
    "function",
    "graph",
    "matrix",
    "vector",
    "scalar",
    "logarithm",
    "exponent",
    "inequality",
    "polynomial",
    "quadratic",
    "linear",
    "mean",
    "median",
    "mode",
    "variance",
    "standard deviation",
    "binomial",
    "permutation",
    "combination",
    "series",
    "sequence",
    "differential",
    "area",
    "volume",
    "angle",
    "radius",
    "theorem",
    "proof",
    "identity",
    "domain",
    "range",
    "asymptote",
    "factor",
    "intercept",
    "transformation",
    "complex",
    "imaginary",
    "real",
    "root",
    "zero",
];

/// Terms associated with academic dishonesty. Any match rejects the query
/// even when it otherwise looks mathematical.
const BLOCKED_TERMS: [&str; 5] = [
    "hack",
    "cheat",
    "answer key",
    "exam paper",
    "test solutions",
];

/// Minimum length for a solution to count as educational content.
const MIN_RESPONSE_LENGTH: usize = 10;

/// Outcome of a validation check.
#[derive(Debug, Clone)]
pub struct Validation {
    pub accepted: bool,
    pub message: String,
}

impl Validation {
    fn accept() -> Self {
        Self {
            accepted: true,
            message: "Valid query".to_string(),
        }
    }

    fn reject(message: &str) -> Self {
        Self {
            accepted: false,
            message: message.to_string(),
        }
    }
}

/// Stateless validator for queries and generated solutions.
#[derive(Debug, Clone)]
pub struct GuardrailsValidator {
    max_query_length: usize,
}

impl GuardrailsValidator {
    pub fn new(max_query_length: usize) -> Self {
        Self { max_query_length }
    }

    /// Validate a raw user query.
    ///
    /// Order matters: the length check runs first, then the topic gate,
    /// then the blocklist, so a blocked term dominates topic acceptance.
    pub fn validate_input(&self, query: &str) -> Validation {
        if query.chars().count() > self.max_query_length {
            return Validation::reject(&format!(
                "Query too long. Please keep it under {} characters.",
                self.max_query_length
            ));
        }

        let query_lower = query.to_lowercase();

        let has_math_content = MATH_KEYWORDS.iter().any(|k| query_lower.contains(k));
        if !has_math_content {
            return Validation::reject("Please ask mathematics-related questions only.");
        }

        let has_blocked_terms = BLOCKED_TERMS.iter().any(|t| query_lower.contains(t));
        if has_blocked_terms {
            return Validation::reject("Cannot assist with exam cheating or unauthorized solutions.");
        }

        Validation::accept()
    }

    /// Validate a produced solution. Only a minimal length check; the step
    /// structure itself is not inspected.
    pub fn validate_output(&self, response: &str) -> Validation {
        if response.chars().count() < MIN_RESPONSE_LENGTH {
            return Validation::reject("Response too brief for educational content.");
        }
        Validation::accept()
    }
}

impl Default for GuardrailsValidator {
    fn default() -> Self {
        Self::new(500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_math_query() {
        let g = GuardrailsValidator::default();
        let v = g.validate_input("Solve the equation 2x + 3 = 11");
        assert!(v.accepted);
    }

    #[test]
    fn test_rejects_long_query() {
        let g = GuardrailsValidator::default();
        let query = "solve ".repeat(100);
        let v = g.validate_input(&query);
        assert!(!v.accepted);
        assert!(v.message.contains("too long"));
    }

    #[test]
    fn test_rejects_off_topic_query() {
        let g = GuardrailsValidator::default();
        let v = g.validate_input("What is the capital of France");
        assert!(!v.accepted);
        assert_eq!(v.message, "Please ask mathematics-related questions only.");
    }

    #[test]
    fn test_blocked_term_dominates_topic_acceptance() {
        let g = GuardrailsValidator::default();
        let v = g.validate_input("give me the exam answer key for calculus");
        assert!(!v.accepted);
        assert_eq!(
            v.message,
            "Cannot assist with exam cheating or unauthorized solutions."
        );
    }

    #[test]
    fn test_substring_matching_accepts_embedded_keywords() {
        // "mode" inside "model" passes the topic gate. Substring semantics
        // are deliberate.
        let g = GuardrailsValidator::default();
        let v = g.validate_input("what does this model predict");
        assert!(v.accepted);
    }

    #[test]
    fn test_case_insensitive_matching() {
        let g = GuardrailsValidator::default();
        assert!(g.validate_input("SOLVE X^2 = 4").accepted);
        assert!(!g.validate_input("Tell me how to CHEAT on my calculus exam").accepted);
    }

    #[test]
    fn test_output_too_short() {
        let g = GuardrailsValidator::default();
        let v = g.validate_output("x = 2");
        assert!(!v.accepted);
        assert_eq!(v.message, "Response too brief for educational content.");
    }

    #[test]
    fn test_output_accepted() {
        let g = GuardrailsValidator::default();
        let v = g.validate_output("Step 1: factor the quadratic into (x+2)(x+3).");
        assert!(v.accepted);
    }
}
