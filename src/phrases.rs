//! Phrases, phrase sets and the fixed phrase lists of the device

use serde::{Deserialize, Serialize};

/// Maximum phrases shown in the device grid
pub const GRID_CAPACITY: usize = 8;

/// Maximum phrases shown in a suggestion list
pub const SUGGESTION_CAPACITY: usize = 4;

/// Phrases on the grid when the device boots
pub const STARTUP_GRID: [&str; 6] = [
    "I need water",
    "Yes",
    "No",
    "Thank you",
    "Bathroom",
    "Pain level 5",
];

/// Substituted when context pack generation fails
pub const DEFAULT_CONTEXT_PACK: [&str; 6] = ["Hello", "Yes", "No", "Help", "Thanks", "Goodbye"];

/// Substituted when a remote-routed query cannot be answered
pub const FALLBACK_CLARIFICATIONS: [&str; 4] = [
    "Can you tell me more?",
    "I need help with this",
    "Let me speak to someone",
    "I have a question",
];

/// Ordered, bounded list of phrases
///
/// Insertion order is display order. A set is built once by truncation and
/// replaced wholesale afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhraseSet(Vec<String>);

impl PhraseSet {
    /// An empty set
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Collect phrases, keeping at most `capacity` in their original order
    pub fn bounded<I, S>(phrases: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(phrases.into_iter().take(capacity).map(Into::into).collect())
    }

    /// Number of phrases
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set has no phrases
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Phrase at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Iterate phrases in display order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Borrow the phrases as a slice
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a PhraseSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A named bundle of phrases for a usage scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextPack {
    /// Scenario the pack was generated for
    pub name: String,
    /// Grid phrases
    pub phrases: PhraseSet,
}

impl ContextPack {
    /// The pack the device boots with
    #[must_use]
    pub fn startup() -> Self {
        Self {
            name: "Everyday".to_string(),
            phrases: PhraseSet::bounded(STARTUP_GRID, GRID_CAPACITY),
        }
    }
}
