//! In-memory vector store over the embedding seam.
//!
//! Bulk inserts at startup, cosine top-k at query time. Reads take no lock:
//! the store is loaded once and never mutated while serving queries.

use super::embedding::{cosine_similarity, Embedder};
use super::MathRecord;
use std::cmp::Ordering;
use uuid::Uuid;

struct StoredPoint {
    id: Uuid,
    vector: Vec<f32>,
    payload: MathRecord,
}

/// A scored retrieval hit.
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    pub id: Uuid,
    pub score: f32,
    pub payload: MathRecord,
}

/// Nearest-neighbor store for knowledge records.
pub struct VectorStore {
    embedder: Box<dyn Embedder>,
    points: Vec<StoredPoint>,
}

impl VectorStore {
    pub fn new(embedder: Box<dyn Embedder>) -> Self {
        Self {
            embedder,
            points: Vec::new(),
        }
    }

    /// Bulk-insert records. The question text is what queries are matched
    /// against; the solution rides along as payload.
    pub fn add_records(&mut self, records: Vec<MathRecord>) {
        for record in records {
            let vector = self.embedder.embed(&record.question);
            self.points.push(StoredPoint {
                id: Uuid::new_v4(),
                vector,
                payload: record,
            });
        }
    }

    /// Top-`limit` nearest records by cosine similarity. Negative
    /// similarities clamp to zero so scores stay in [0, 1]. Ordering is
    /// deterministic: score descending, then id ascending.
    pub fn search_similar(&self, query: &str, limit: usize) -> Vec<ScoredPoint> {
        if self.points.is_empty() || limit == 0 {
            return Vec::new();
        }

        let query_vector = self.embedder.embed(query);

        let mut hits: Vec<ScoredPoint> = self
            .points
            .iter()
            .map(|point| ScoredPoint {
                id: point.id,
                score: cosine_similarity(&query_vector, &point.vector).max(0.0),
                payload: point.payload.clone(),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });

        hits.truncate(limit);
        hits
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
