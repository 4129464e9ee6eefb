//! On-device keyword → phrase table

use crate::phrases::{PhraseSet, SUGGESTION_CAPACITY};

/// Keyword table the device ships with, in match order
const BUILTIN_TABLE: &[(&str, &[&str])] = &[
    (
        "water",
        &["I need water", "Can I have water?", "I'm thirsty", "Water please"],
    ),
    (
        "pain",
        &["I'm in pain", "It hurts here", "The pain is worse", "Pain level 5"],
    ),
    (
        "bathroom",
        &["I need the bathroom", "Help me to the bathroom", "Where is the bathroom?"],
    ),
    ("help", &["I need help", "Please help me", "Call someone for me"]),
    ("nurse", &["Call the nurse", "I need the nurse", "Where is my nurse?"]),
    ("tired", &["I'm tired", "I need to rest", "Can I lie down?"]),
    ("thank", &["Thank you", "Thanks so much", "I appreciate it"]),
];

/// Fixed keyword → phrases mapping consulted for locally routed queries
///
/// Built once and never mutated.
#[derive(Debug, Clone)]
pub struct LocalSuggestionTable {
    entries: Vec<(String, Vec<String>)>,
}

impl Default for LocalSuggestionTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LocalSuggestionTable {
    /// The table the device ships with
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_entries(BUILTIN_TABLE.iter().map(|(keyword, phrases)| {
            (*keyword, phrases.iter().copied())
        }))
    }

    /// Build a table from ordered `(keyword, phrases)` entries
    ///
    /// Keywords are lowercased; entry order is match order.
    pub fn from_entries<I, K, P, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: AsRef<str>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, phrases)| {
                    (
                        k.as_ref().to_lowercase(),
                        phrases.into_iter().map(Into::into).collect(),
                    )
                })
                .collect(),
        }
    }

    /// Keywords in match order
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Suggestions for `text`
    ///
    /// Every keyword contained in the text (case-insensitively) contributes
    /// its phrases in table order; the result is truncated to the suggestion
    /// capacity without removing duplicates.
    #[must_use]
    pub fn lookup(&self, text: &str) -> PhraseSet {
        let lower = text.to_lowercase();
        let matched = self
            .entries
            .iter()
            .filter(|(keyword, _)| lower.contains(keyword.as_str()))
            .inspect(|(keyword, _)| tracing::trace!(keyword, "local keyword matched"))
            .flat_map(|(_, phrases)| phrases.iter().cloned());

        PhraseSet::bounded(matched, SUGGESTION_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn water_request() {
        let table = LocalSuggestionTable::builtin();
        assert_eq!(
            table.lookup("I need water please").as_slice(),
            &["I need water", "Can I have water?", "I'm thirsty", "Water please"]
        );
    }

    #[test]
    fn keyword_match_ignores_case() {
        let table = LocalSuggestionTable::builtin();
        assert_eq!(table.lookup("NURSE!").get(0), Some("Call the nurse"));
    }

    #[test]
    fn table_order_wins_over_text_order() {
        let table = LocalSuggestionTable::builtin();
        assert_eq!(
            table.lookup("thank you, I'm so tired").as_slice(),
            &["I'm tired", "I need to rest", "Can I lie down?", "Thank you"]
        );
    }

    #[test]
    fn no_keywords_no_suggestions() {
        let table = LocalSuggestionTable::builtin();
        assert!(table.lookup("good morning").is_empty());
    }

    #[test]
    fn duplicates_survive_until_truncation() {
        let table = LocalSuggestionTable::from_entries([("a", ["Yes", "No"]), ("b", ["Yes", "Maybe"])]);
        assert_eq!(table.lookup("a b").as_slice(), &["Yes", "No", "Yes", "Maybe"]);
    }

    #[test]
    fn builtin_keyword_order() {
        let table = LocalSuggestionTable::builtin();
        let keywords: Vec<_> = table.keywords().collect();
        assert_eq!(
            keywords,
            ["water", "pain", "bathroom", "help", "nurse", "tired", "thank"]
        );
    }
}
