//! Search provider capability trait.
//!
//! Each backend implements the same narrow interface so the chain can hold
//! an ordered list of capability instances and iterate, instead of
//! branching on which credential happens to be configured. Providers catch
//! their own network and parse errors and report them as a uniform failure
//! outcome; they never panic or propagate.

use super::SearchOutcome;
use async_trait::async_trait;

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Short tag used in provenance labels, e.g. `"tavily"`.
    fn name(&self) -> &'static str;

    /// Run one search under the provider's own timeout. Infallible at the
    /// signature level; failures come back as `SearchOutcome::failed`.
    async fn search(&self, query: &str) -> SearchOutcome;
}
