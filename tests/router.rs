//! Suggestion router integration tests

use std::sync::Arc;
use std::time::Duration;

use quickspeak::router::{Route, SuggestionController, SuggestionRouter, fallback_clarifications};

mod common;

use common::ScriptedPhrases;

#[tokio::test]
async fn test_medical_question_falls_back_when_remote_fails() {
    let phrases = ScriptedPhrases::failing();
    let router = SuggestionRouter::new(phrases.clone());

    let result = router.suggest("What are the side effects of aspirin").await;

    assert_eq!(result.route, Route::Remote);
    assert_eq!(
        result.phrases.as_slice(),
        &[
            "Can you tell me more?",
            "I need help with this",
            "Let me speak to someone",
            "I have a question",
        ]
    );
    assert_eq!(phrases.calls(), 1);
    assert!(phrases.prompts.lock().unwrap()[0].contains("side effects of aspirin"));
}

#[tokio::test]
async fn test_water_request_stays_local() {
    let phrases = ScriptedPhrases::answering(&["unused"]);
    let router = SuggestionRouter::new(phrases.clone());

    let result = router.suggest("I need water please").await;

    assert_eq!(result.route, Route::Local);
    assert_eq!(
        result.phrases.as_slice(),
        &["I need water", "Can I have water?", "I'm thirsty", "Water please"]
    );
    assert_eq!(phrases.calls(), 0);
}

#[tokio::test]
async fn test_trigger_match_is_case_insensitive() {
    let phrases = ScriptedPhrases::answering(&["Which medicine?", "How much?"]);
    let router = SuggestionRouter::new(phrases);

    let result = router.suggest("SHOULD I TAKE MY MEDICATION NOW").await;

    assert_eq!(result.route, Route::Remote);
    assert_eq!(result.phrases.as_slice(), &["Which medicine?", "How much?"]);
}

#[tokio::test]
async fn test_unknown_text_has_no_suggestions() {
    let router = SuggestionRouter::new(ScriptedPhrases::failing());
    let result = router.suggest("the weather is nice").await;
    assert_eq!(result.route, Route::Local);
    assert!(result.phrases.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_controller_coalesces_typing() {
    let phrases = ScriptedPhrases::failing();
    let router = Arc::new(SuggestionRouter::new(phrases.clone()));
    let controller = SuggestionController::new(router, Duration::from_millis(500));

    let mut text = String::new();
    for ch in "Why does it hurt".chars() {
        text.push(ch);
        controller.input(&text);
        tokio::time::sleep(Duration::from_millis(80)).await;
    }

    let state = controller.settled().await;
    assert_eq!(state.query, "Why does it hurt");
    assert_eq!(state.suggestions, fallback_clarifications());
    assert_eq!(phrases.calls(), 1);
}
