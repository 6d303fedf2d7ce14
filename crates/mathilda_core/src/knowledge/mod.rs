//! Knowledge base: worked math problems behind a similarity index.
//!
//! Records are bulk-loaded at startup and never mutated at request time.
//! A search reports a hit only when the best cosine score clears the
//! configured threshold; everything else is a miss the router falls
//! through on.

pub mod embedding;
pub mod store;

use crate::config::Config;
use crate::error::MathildaError;
use embedding::LexicalEmbedder;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use store::VectorStore;
use tracing::{info, warn};

/// One worked problem from the dataset. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MathRecord {
    pub question: String,
    pub solution: String,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
}

fn default_topic() -> String {
    "general".to_string()
}

fn default_difficulty() -> String {
    "medium".to_string()
}

/// A knowledge-base hit: the matched record and its similarity score.
#[derive(Debug, Clone)]
pub struct KbHit {
    pub record: MathRecord,
    pub confidence: f32,
}

/// Similarity-gated retriever over the vector store.
pub struct KnowledgeBase {
    store: VectorStore,
    similarity_threshold: f32,
}

impl KnowledgeBase {
    pub fn new(config: &Config) -> Self {
        Self {
            store: VectorStore::new(Box::new(LexicalEmbedder::default())),
            similarity_threshold: config.similarity_threshold,
        }
    }

    /// Swap in a pre-built store (tests, alternative embedders).
    pub fn with_store(store: VectorStore, similarity_threshold: f32) -> Self {
        Self {
            store,
            similarity_threshold,
        }
    }

    /// Bulk-load the dataset file. A missing or unparseable file leaves
    /// the index empty with a warning; startup must never fail on this.
    /// Returns the number of records loaded.
    pub fn load_dataset(&mut self, path: &Path) -> usize {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Dataset not found at {}: {}", path.display(), e);
                return 0;
            }
        };

        let records: Vec<MathRecord> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!("Dataset at {} is not valid JSON: {}", path.display(), e);
                return 0;
            }
        };

        let count = records.len();
        self.store.add_records(records);
        info!("Loaded {} math problems into knowledge base", count);
        count
    }

    /// Add records directly (startup seeding, tests).
    pub fn add_records(&mut self, records: Vec<MathRecord>) {
        self.store.add_records(records);
    }

    /// Nearest record above the threshold, or `None` for a miss. The
    /// router treats an `Err` the same as a miss.
    pub fn search(&self, query: &str) -> Result<Option<KbHit>, MathildaError> {
        let hits = self.store.search_similar(query, 1);

        match hits.into_iter().next() {
            Some(hit) if hit.score >= self.similarity_threshold => Ok(Some(KbHit {
                record: hit.payload,
                confidence: hit.score,
            })),
            _ => Ok(None),
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

/// Three worked sample problems, used to seed a fresh install and in
/// tests.
pub fn sample_dataset() -> Vec<MathRecord> {
    vec![
        MathRecord {
            question: "Solve the quadratic equation x^2 + 5x + 6 = 0".to_string(),
            solution: "Step 1: Identify coefficients a=1, b=5, c=6\n\
                       Step 2: Use quadratic formula x = (-b ± √(b²-4ac))/2a\n\
                       Step 3: x = (-5 ± √(25-24))/2 = (-5 ± 1)/2\n\
                       Step 4: Solutions are x = -2 and x = -3"
                .to_string(),
            topic: "algebra".to_string(),
            difficulty: "easy".to_string(),
        },
        MathRecord {
            question: "Find the derivative of f(x) = 3x^2 + 2x + 1".to_string(),
            solution: "Step 1: Apply power rule to each term\n\
                       Step 2: d/dx(3x²) = 6x\n\
                       Step 3: d/dx(2x) = 2\n\
                       Step 4: d/dx(1) = 0\n\
                       Step 5: f'(x) = 6x + 2"
                .to_string(),
            topic: "calculus".to_string(),
            difficulty: "easy".to_string(),
        },
        MathRecord {
            question: "Calculate the area of a circle with radius 5".to_string(),
            solution: "Step 1: Use formula A = πr²\n\
                       Step 2: Substitute r = 5\n\
                       Step 3: A = π × 5² = 25π\n\
                       Step 4: A ≈ 78.54 square units"
                .to_string(),
            topic: "geometry".to_string(),
            difficulty: "easy".to_string(),
        },
    ]
}
