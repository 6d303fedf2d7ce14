//! Mathilda core: routing pipeline for mathematics questions.
//!
//! Each query runs through a cascade of solution sources: input
//! guardrails, a similarity-indexed knowledge base of worked problems, a
//! prioritized chain of web-search providers, and a multi-stage solution
//! synthesizer whose floor is a deterministic templated scaffold. Human
//! feedback is appended to a persistent log and can trigger a single
//! refinement pass.
//!
//! The presentation layer needs exactly two operations:
//! [`MathRouter::process_query`] and [`MathRouter::process_feedback`].

pub mod config;
pub mod error;
pub mod feedback;
pub mod generation;
pub mod guardrails;
pub mod knowledge;
pub mod response;
pub mod router;
pub mod search;
pub mod synthesis;

pub use config::Config;
pub use error::MathildaError;
pub use response::{FeedbackResponse, SolutionEnvelope};
pub use router::MathRouter;
