//! Debounced routing with stale-result rejection
//!
//! Every call to [`SuggestionController::input`] is issued a sequence token.
//! A spawned task waits out the quiet period and gives up if a newer token
//! was issued meanwhile; results of a remote call are applied only while
//! their token is still the newest. In-flight requests are left to finish
//! and their results are dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;

use super::{Route, SuggestionRouter, classify, is_routable};
use crate::phrases::PhraseSet;

/// Observable state of the suggestion list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SuggestionState {
    /// Text the state was computed for
    pub query: String,
    /// Sequence token of the invocation that last wrote this state
    pub token: u64,
    /// Route of the query
    pub route: Route,
    /// A remote request for `query` is outstanding
    pub in_flight: bool,
    /// Current suggestions
    pub suggestions: PhraseSet,
}

/// Debounces query input and publishes suggestion state
pub struct SuggestionController {
    router: Arc<SuggestionRouter>,
    quiet: Duration,
    latest: Arc<AtomicU64>,
    state: Arc<watch::Sender<SuggestionState>>,
}

impl SuggestionController {
    /// Create a controller with the given quiet period
    #[must_use]
    pub fn new(router: Arc<SuggestionRouter>, quiet: Duration) -> Self {
        let (tx, _rx) = watch::channel(SuggestionState::default());
        Self {
            router,
            quiet,
            latest: Arc::new(AtomicU64::new(0)),
            state: Arc::new(tx),
        }
    }

    /// Subscribe to state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SuggestionState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn current(&self) -> SuggestionState {
        self.state.borrow().clone()
    }

    /// Token of the newest invocation
    #[must_use]
    pub fn latest_token(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Feed the current input text
    ///
    /// Text too short to route clears the suggestions immediately and
    /// supersedes anything pending. Otherwise routing happens once the text
    /// has been stable for the quiet period. Returns the invocation's token.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn input(&self, text: &str) -> u64 {
        let token = self.latest.fetch_add(1, Ordering::SeqCst) + 1;

        if !is_routable(text) {
            self.state.send_replace(SuggestionState {
                query: text.to_string(),
                token,
                ..SuggestionState::default()
            });
            tracing::trace!(token, "input too short, suggestions cleared");
            return token;
        }

        let task = Settle {
            router: Arc::clone(&self.router),
            latest: Arc::clone(&self.latest),
            state: Arc::clone(&self.state),
            token,
            text: text.to_string(),
        };
        let quiet = self.quiet;
        tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            task.run().await;
        });

        token
    }

    /// Wait until no invocation is pending and return the settled state
    ///
    /// Resolves once the state carries the newest token and no remote request
    /// is outstanding.
    pub async fn settled(&self) -> SuggestionState {
        let mut rx = self.state.subscribe();
        let latest = Arc::clone(&self.latest);
        let result = rx
            .wait_for(|s| s.token == latest.load(Ordering::SeqCst) && !s.in_flight)
            .await
            .map(|s| s.clone());
        result.unwrap_or_else(|_| self.current())
    }
}

/// One debounced invocation
struct Settle {
    router: Arc<SuggestionRouter>,
    latest: Arc<AtomicU64>,
    state: Arc<watch::Sender<SuggestionState>>,
    token: u64,
    text: String,
}

impl Settle {
    fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.token
    }

    /// Apply `update` only while this invocation is the newest
    fn apply(&self, update: impl FnOnce(&mut SuggestionState)) -> bool {
        self.state.send_if_modified(|s| {
            if !self.is_current() || s.token > self.token {
                return false;
            }
            s.token = self.token;
            s.query.clone_from(&self.text);
            update(s);
            true
        })
    }

    async fn run(self) {
        if !self.is_current() {
            tracing::trace!(token = self.token, "superseded before quiet period ended");
            return;
        }

        match classify(&self.text) {
            Route::Local => {
                let phrases = self.router.local_suggestions(&self.text);
                tracing::debug!(token = self.token, count = phrases.len(), "local suggestions");
                self.apply(|s| {
                    s.route = Route::Local;
                    s.in_flight = false;
                    s.suggestions = phrases;
                });
            }
            Route::Remote => {
                self.apply(|s| {
                    s.route = Route::Remote;
                    s.in_flight = true;
                });

                let phrases = self.router.remote_suggestions(&self.text).await;
                let applied = self.apply(|s| {
                    s.route = Route::Remote;
                    s.in_flight = false;
                    s.suggestions = phrases;
                });

                if applied {
                    tracing::debug!(token = self.token, "remote suggestions applied");
                } else {
                    tracing::debug!(token = self.token, "discarded stale remote suggestions");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;

    use super::*;
    use crate::cloud::PhraseGenerator;
    use crate::{Error, Result};

    /// Records prompts, answers after a delay that depends on the prompt
    struct Slow {
        calls: AtomicUsize,
        prompts: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PhraseGenerator for Slow {
        async fn generate_phrases(&self, prompt: &str) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(prompt.to_string());

            if prompt.contains("first") {
                tokio::time::sleep(Duration::from_millis(900)).await;
                Ok(vec!["from first".to_string()])
            } else if prompt.contains("broken") {
                Err(Error::Generation("boom".to_string()))
            } else {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(vec!["from second".to_string()])
            }
        }
    }

    fn controller() -> (SuggestionController, Arc<Slow>) {
        let generator = Arc::new(Slow {
            calls: AtomicUsize::new(0),
            prompts: std::sync::Mutex::new(Vec::new()),
        });
        let router = Arc::new(SuggestionRouter::new(generator.clone()));
        (
            SuggestionController::new(router, Duration::from_millis(500)),
            generator,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_settle_once() {
        let (ctl, generator) = controller();

        for text in ["why", "why is", "why is it", "why is it second"] {
            ctl.input(text);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        let state = ctl.settled().await;
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.query, "why is it second");
        assert_eq!(state.suggestions.as_slice(), &["from second"]);
        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("why is it second"));
    }

    #[tokio::test(start_paused = true)]
    async fn late_response_does_not_overwrite_newer() {
        let (ctl, generator) = controller();

        ctl.input("why first");
        // Let the first invocation settle and go in flight
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(ctl.current().in_flight);

        ctl.input("why second");
        let state = ctl.settled().await;
        assert_eq!(state.suggestions.as_slice(), &["from second"]);

        // First request resolves after the second one
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
        assert_eq!(ctl.current().suggestions.as_slice(), &["from second"]);
        assert_eq!(ctl.current().query, "why second");
    }

    #[tokio::test(start_paused = true)]
    async fn short_input_clears_and_supersedes() {
        let (ctl, generator) = controller();

        ctl.input("why first");
        tokio::time::sleep(Duration::from_millis(600)).await;
        ctl.input("wh");

        let state = ctl.current();
        assert!(state.suggestions.is_empty());
        assert!(!state.in_flight);
        assert_eq!(state.route, Route::Local);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(ctl.current().suggestions.is_empty());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn remote_failure_uses_fallback() {
        let (ctl, _) = controller();
        ctl.input("explain why it is broken");
        let state = ctl.settled().await;
        assert_eq!(state.route, Route::Remote);
        assert_eq!(state.suggestions, crate::router::fallback_clarifications());
    }

    #[tokio::test(start_paused = true)]
    async fn local_query_settles_without_remote_call() {
        let (ctl, generator) = controller();
        ctl.input("I need water please");
        let state = ctl.settled().await;
        assert_eq!(state.route, Route::Local);
        assert_eq!(state.suggestions.get(0), Some("I need water"));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }
}
