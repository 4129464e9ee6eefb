//! Suggestion router
//!
//! Routes free-typed text either to the on-device keyword table or to a
//! remote generation call, and returns at most four candidate phrases.
//! [`SuggestionController`] adds the debounce window and stale-result
//! rejection on top of the stateless [`SuggestionRouter`].

mod classify;
mod debounce;
mod local;

pub use classify::{MIN_QUERY_CHARS, Route, classify, is_routable, matched_topic};
pub use debounce::{SuggestionController, SuggestionState};
pub use local::LocalSuggestionTable;

use std::sync::Arc;

use serde::Serialize;

use crate::cloud::PhraseGenerator;
use crate::phrases::{FALLBACK_CLARIFICATIONS, PhraseSet, SUGGESTION_CAPACITY};

/// Number of clarification phrases requested from the remote service
const REMOTE_PHRASE_COUNT: usize = 4;

/// Routed suggestions for one query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Suggestions {
    /// Where the query was answered
    pub route: Route,
    /// Candidate phrases, at most four
    pub phrases: PhraseSet,
}

/// Stateless query router
pub struct SuggestionRouter {
    generator: Arc<dyn PhraseGenerator>,
    table: LocalSuggestionTable,
}

impl SuggestionRouter {
    /// Create a router with the built-in keyword table
    #[must_use]
    pub fn new(generator: Arc<dyn PhraseGenerator>) -> Self {
        Self::with_table(generator, LocalSuggestionTable::builtin())
    }

    /// Create a router with a custom keyword table
    #[must_use]
    pub fn with_table(generator: Arc<dyn PhraseGenerator>, table: LocalSuggestionTable) -> Self {
        Self { generator, table }
    }

    /// Route a query and produce its suggestions
    ///
    /// Never fails: remote errors resolve to the fixed clarification list.
    pub async fn suggest(&self, text: &str) -> Suggestions {
        if !is_routable(text) {
            return Suggestions::default();
        }

        match classify(text) {
            Route::Local => Suggestions {
                route: Route::Local,
                phrases: self.local_suggestions(text),
            },
            Route::Remote => Suggestions {
                route: Route::Remote,
                phrases: self.remote_suggestions(text).await,
            },
        }
    }

    /// Suggestions from the keyword table, no network involved
    #[must_use]
    pub fn local_suggestions(&self, text: &str) -> PhraseSet {
        self.table.lookup(text)
    }

    /// Clarification phrases from the remote service
    ///
    /// Any failure, including an empty list, yields [`FALLBACK_CLARIFICATIONS`].
    pub async fn remote_suggestions(&self, text: &str) -> PhraseSet {
        let prompt = clarification_prompt(text.trim());

        match self.generator.generate_phrases(&prompt).await {
            Ok(phrases) if !phrases.is_empty() => {
                PhraseSet::bounded(phrases, SUGGESTION_CAPACITY)
            }
            Ok(_) => {
                tracing::warn!("remote suggestions were empty, using fallback");
                fallback_clarifications()
            }
            Err(e) => {
                tracing::warn!(error = %e, "remote suggestions failed, using fallback");
                fallback_clarifications()
            }
        }
    }
}

/// The fixed clarification list
#[must_use]
pub fn fallback_clarifications() -> PhraseSet {
    PhraseSet::bounded(FALLBACK_CLARIFICATIONS, SUGGESTION_CAPACITY)
}

/// Prompt asking for follow-up clarification phrases about a query
#[must_use]
pub fn clarification_prompt(query: &str) -> String {
    format!(
        "A person using a speech-assistance device typed this question: \"{query}\". \
         Suggest {REMOTE_PHRASE_COUNT} short follow-up phrases (max 5 words each) they could \
         say aloud to ask for clarification or more information."
    )
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{Error, Result};

    struct Scripted {
        reply: Option<Vec<&'static str>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PhraseGenerator for Scripted {
        async fn generate_phrases(&self, _prompt: &str) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .as_ref()
                .map(|r| r.iter().map(ToString::to_string).collect())
                .ok_or_else(|| Error::Generation("offline".to_string()))
        }
    }

    fn router(reply: Option<Vec<&'static str>>) -> (SuggestionRouter, Arc<Scripted>) {
        let generator = Arc::new(Scripted {
            reply,
            calls: AtomicUsize::new(0),
        });
        (SuggestionRouter::new(generator.clone()), generator)
    }

    #[tokio::test]
    async fn short_input_is_empty_and_offline() {
        let (router, generator) = router(Some(vec!["x"]));
        let result = router.suggest("hi").await;
        assert_eq!(result, Suggestions::default());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn remote_result_used_verbatim_and_truncated() {
        let (router, generator) = router(Some(vec!["A?", "B?", "C?", "D?", "E?"]));
        let result = router.suggest("Why is this happening").await;
        assert_eq!(result.route, Route::Remote);
        assert_eq!(result.phrases.as_slice(), &["A?", "B?", "C?", "D?"]);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_remote_result_falls_back() {
        let (router, _) = router(Some(vec![]));
        let result = router.suggest("explain the plan").await;
        assert_eq!(result.phrases, fallback_clarifications());
    }

    #[tokio::test]
    async fn local_path_never_calls_out() {
        let (router, generator) = router(None);
        let result = router.suggest("I need water please").await;
        assert_eq!(result.route, Route::Local);
        assert_eq!(result.phrases.len(), 4);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn prompt_mentions_query_and_count() {
        let prompt = clarification_prompt("why now");
        assert!(prompt.contains("\"why now\""));
        assert!(prompt.contains("Suggest 4"));
    }
}
