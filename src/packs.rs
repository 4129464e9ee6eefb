//! Context pack generation
//!
//! Turns a usage scenario ("At the dentist", "Ordering pizza") into a grid of
//! phrases through the remote phrase generator.

use std::sync::Arc;

use crate::cloud::PhraseGenerator;
use crate::phrases::{ContextPack, DEFAULT_CONTEXT_PACK, GRID_CAPACITY, PhraseSet};

/// Builds context packs for scenarios
pub struct ContextPackGenerator {
    generator: Arc<dyn PhraseGenerator>,
}

impl ContextPackGenerator {
    /// Create a generator backed by `generator`
    #[must_use]
    pub fn new(generator: Arc<dyn PhraseGenerator>) -> Self {
        Self { generator }
    }

    /// Generate a pack for `scenario`
    ///
    /// Returns `None` for a blank scenario. Generation failures and empty
    /// results resolve to the default pack; results are capped to the grid.
    pub async fn generate(&self, scenario: &str) -> Option<ContextPack> {
        let scenario = scenario.trim();
        if scenario.is_empty() {
            return None;
        }

        let phrases = match self.generator.generate_phrases(&pack_prompt(scenario)).await {
            Ok(phrases) if !phrases.is_empty() => phrases,
            Ok(_) => {
                tracing::warn!(scenario, "context pack came back empty, using defaults");
                default_phrases()
            }
            Err(e) => {
                tracing::warn!(scenario, error = %e, "context pack generation failed, using defaults");
                default_phrases()
            }
        };

        tracing::info!(scenario, count = phrases.len().min(GRID_CAPACITY), "context pack ready");

        Some(ContextPack {
            name: scenario.to_string(),
            phrases: PhraseSet::bounded(phrases, GRID_CAPACITY),
        })
    }
}

fn default_phrases() -> Vec<String> {
    DEFAULT_CONTEXT_PACK.iter().map(ToString::to_string).collect()
}

/// Prompt requesting six phrases for a scenario
#[must_use]
pub fn pack_prompt(scenario: &str) -> String {
    format!(
        "Generate 6 short, useful, spoken phrases (max 5 words each) for a person with speech \
         difficulties in this specific scenario: \"{scenario}\"."
    )
}
