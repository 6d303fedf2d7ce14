//! Synthesizer stage gating: completeness heuristic, fast mode, and the
//! never-worse refinement guarantee.

use anyhow::bail;
use async_trait::async_trait;
use mathilda_core::generation::GenerationProvider;
use mathilda_core::search::provider::SearchProvider;
use mathilda_core::search::{SearchOutcome, SearchResult};
use mathilda_core::synthesis::SolutionSynthesizer;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A worked solution that clears the completeness heuristic.
const COMPLETE_BODY: &str = "Step 1: Write the equation x + 1 = 2.\n\
    Step 2: Subtract 1 from both sides to solve for x.\n\
    Step 3: Therefore the final answer is x = 1, which we verify by substitution.";

struct FakeGenerator {
    response: Option<&'static str>,
    calls: Arc<AtomicUsize>,
}

impl FakeGenerator {
    fn new(response: Option<&'static str>) -> (Box<dyn GenerationProvider>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = Box::new(Self {
            response,
            calls: calls.clone(),
        });
        (provider, calls)
    }
}

#[async_trait]
impl GenerationProvider for FakeGenerator {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn label(&self) -> &'static str {
        "Fake Generator"
    }

    async fn generate(&self, _system_prompt: &str, _user_prompt: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.response {
            Some(text) => Ok(text.to_string()),
            None => bail!("simulated generation failure"),
        }
    }
}

struct FakeSearch {
    calls: Arc<AtomicUsize>,
}

impl FakeSearch {
    fn new() -> (Box<dyn SearchProvider>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = Box::new(Self {
            calls: calls.clone(),
        });
        (provider, calls)
    }
}

#[async_trait]
impl SearchProvider for FakeSearch {
    fn name(&self) -> &'static str {
        "fakesearch"
    }

    async fn search(&self, _query: &str) -> SearchOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        SearchOutcome::ok(
            self.name(),
            vec![SearchResult {
                title: "Worked example".to_string(),
                url: None,
                content: "factor and substitute".to_string(),
            }],
        )
    }
}

#[tokio::test]
async fn complete_primary_output_is_wrapped_and_returned() {
    let (generator, calls) = FakeGenerator::new(Some(COMPLETE_BODY));
    let synthesizer = SolutionSynthesizer::new(true).with_primary(generator);

    let solution = synthesizer
        .generate_step_by_step_solution("solve x + 1 = 2", None)
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(solution.contains("**Solution Source:** Fake Generator"));
    assert!(solution.contains("Therefore the final answer is x = 1"));
    // Wrapper applied exactly once.
    assert_eq!(solution.matches("## 🧮 Mathematical Solution").count(), 1);
}

#[tokio::test]
async fn short_output_never_survives_the_completeness_gate() {
    let (generator, _) = FakeGenerator::new(Some("x = 1"));
    let synthesizer = SolutionSynthesizer::new(true).with_primary(generator);

    let solution = synthesizer
        .generate_step_by_step_solution("solve x + 1 = 2", None)
        .await;

    // Fell through to the templated scaffold.
    assert!(solution.contains("**Problem Type:**"));
    assert!(!solution.contains("Fake Generator"));
}

#[tokio::test]
async fn indicator_poor_output_never_survives_the_completeness_gate() {
    let (generator, _) = FakeGenerator::new(Some(
        "Mathematics has a long and storied history across many ancient cultures, \
         from Babylon to Alexandria, and remains a living discipline today.",
    ));
    let synthesizer = SolutionSynthesizer::new(true).with_primary(generator);

    let solution = synthesizer
        .generate_step_by_step_solution("solve x + 1 = 2", None)
        .await;

    assert!(solution.contains("**Problem Type:**"));
}

#[tokio::test]
async fn failing_primary_falls_back_to_template() {
    let (generator, calls) = FakeGenerator::new(None);
    let synthesizer = SolutionSynthesizer::new(true).with_primary(generator);

    let solution = synthesizer
        .generate_step_by_step_solution("Solve x^2 + 5x + 6 = 0", None)
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(solution.contains("Quadratic Equation"));
}

#[tokio::test]
async fn fast_mode_skips_search_backed_stages() {
    let (search, search_calls) = FakeSearch::new();
    let synthesizer = SolutionSynthesizer::new(true).with_secondary_search(search);

    let solution = synthesizer
        .generate_step_by_step_solution("solve x + 1 = 2", None)
        .await;

    assert_eq!(search_calls.load(Ordering::SeqCst), 0);
    assert!(solution.contains("**Problem Type:**"));
}

#[tokio::test]
async fn search_backed_stage_runs_outside_fast_mode() {
    let (search, search_calls) = FakeSearch::new();
    let (processor, _) = FakeGenerator::new(Some(COMPLETE_BODY));
    let synthesizer = SolutionSynthesizer::new(false)
        .with_processor(processor)
        .with_secondary_search(search);

    let solution = synthesizer
        .generate_step_by_step_solution("solve x + 1 = 2", None)
        .await;

    assert_eq!(search_calls.load(Ordering::SeqCst), 1);
    // Provenance names the search source that backed the synthesis.
    assert!(solution.contains("**Solution Source:** fakesearch"));
}

#[tokio::test]
async fn template_floor_is_deterministic() {
    let synthesizer = SolutionSynthesizer::new(true);
    let a = synthesizer
        .generate_step_by_step_solution("Solve x^2 + 5x + 6 = 0", None)
        .await;
    let b = synthesizer
        .generate_step_by_step_solution("Solve x^2 + 5x + 6 = 0", None)
        .await;
    assert_eq!(a, b);
}

#[tokio::test]
async fn simplify_keeps_original_on_provider_failure() {
    let (generator, calls) = FakeGenerator::new(None);
    let synthesizer = SolutionSynthesizer::new(true).with_primary(generator);

    let refined = synthesizer
        .simplify_solution("the original solution", "too hard")
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(refined, "the original solution");
}

#[tokio::test]
async fn simplify_keeps_original_on_incomplete_candidate() {
    let (generator, _) = FakeGenerator::new(Some("shorter"));
    let synthesizer = SolutionSynthesizer::new(true).with_primary(generator);

    let refined = synthesizer
        .simplify_solution("the original solution", "too hard")
        .await;

    assert_eq!(refined, "the original solution");
}

#[tokio::test]
async fn simplify_returns_complete_candidate() {
    let (generator, _) = FakeGenerator::new(Some(COMPLETE_BODY));
    let synthesizer = SolutionSynthesizer::new(true).with_primary(generator);

    let refined = synthesizer
        .simplify_solution("the original solution", "too hard")
        .await;

    assert_eq!(refined, COMPLETE_BODY);
}
