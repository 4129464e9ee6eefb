//! Query classification
//!
//! Decides whether free text can be answered from the local phrase table or
//! needs a remote generation call. Pure pattern matching, no state.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Minimum input length (in characters, after trimming) worth routing
pub const MIN_QUERY_CHARS: usize = 3;

/// Where a query is answered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// Fixed on-device phrase table
    #[default]
    Local,
    /// Remote generation call
    Remote,
}

impl Route {
    /// Whether the query needs remote routing
    #[must_use]
    pub const fn is_remote(self) -> bool {
        matches!(self, Self::Remote)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Remote => f.write_str("remote"),
        }
    }
}

/// A topic that forces remote routing
struct Trigger {
    topic: &'static str,
    pattern: Regex,
}

/// Trigger patterns, evaluated in order
static TRIGGERS: LazyLock<Vec<Trigger>> = LazyLock::new(|| {
    [
        ("side effects", r"side[\s-]*effects?"),
        (
            "medication",
            r"\b(?:medications?|medicines?|meds|dosage|doses?|prescriptions?|pills?)\b",
        ),
        ("explanation", r"\bwhy\b|\bexplain"),
        ("explanation", r"\bhow (?:does|do|did|can|could|should|would)\b"),
        ("explanation", r"\bwhat (?:does|do|did) .+ mean\b"),
        ("privacy", r"\bprivacy\b|\bprivate(?:ly)?\b|\bconfidential"),
        ("advice", r"\badvi[cs]e\b|\brecommend|\bshould i\b"),
        ("diagnosis", r"\bdiagnos|\bsymptoms?\b|\bprognosis\b"),
    ]
    .into_iter()
    .map(|(topic, pattern)| Trigger {
        topic,
        pattern: Regex::new(&format!("(?i){pattern}")).expect("valid trigger pattern"),
    })
    .collect()
});

/// Whether the text is long enough to classify
#[must_use]
pub fn is_routable(text: &str) -> bool {
    text.trim().chars().count() >= MIN_QUERY_CHARS
}

/// Topic of the first trigger pattern matching `text`, if any
#[must_use]
pub fn matched_topic(text: &str) -> Option<&'static str> {
    TRIGGERS
        .iter()
        .find(|t| t.pattern.is_match(text))
        .map(|t| t.topic)
}

/// Classify a query
///
/// Text too short to route is always [`Route::Local`].
#[must_use]
pub fn classify(text: &str) -> Route {
    if !is_routable(text) {
        return Route::Local;
    }

    match matched_topic(text) {
        Some(topic) => {
            tracing::trace!(topic, "query matched remote trigger");
            Route::Remote
        }
        None => Route::Local,
    }
}
