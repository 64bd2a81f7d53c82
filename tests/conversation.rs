mod common;

use common::{ FakeSpeech, Harness, Reply, ScriptedModel };
use lumira_health::config::prompt::PromptConfig;
use lumira_health::conversation::advisory::ADVICE_DISCLAIMER;
use lumira_health::conversation::{
    STATUS_DOWNLOAD_COMPLETE,
    STATUS_LOAD_FAILED,
    STATUS_MODEL_READY,
    STATUS_MODEL_REQUIRED,
    STATUS_MODELS_READY,
    STATUS_NO_MODELS,
    STATUS_RECOGNITION_UNAVAILABLE,
};
use lumira_health::models::chat::{ Author, InputOrigin, MessageKind };
use lumira_health::models::health::Severity;

fn apology() -> String {
    PromptConfig::default().fallback_apology
}

fn welcome() -> String {
    PromptConfig::default().welcome_message
}

#[tokio::test]
async fn starts_with_welcome_message() {
    let harness = Harness::new(ScriptedModel::default());
    let state = harness.state();
    assert_eq!(state.messages.len(), 1);
    assert_eq!(state.messages[0].text, welcome());
    assert_eq!(state.messages[0].author, Author::Assistant);
    assert_eq!(state.language, "en-IN");
    assert!(state.daily_tip.is_some());
}

#[tokio::test]
async fn knowledge_match_appends_one_advisory_without_a_model() {
    let harness = Harness::new(ScriptedModel::default());
    harness.controller.submit("I have fever since morning", InputOrigin::Typed).await;

    let state = harness.state();
    assert_eq!(state.messages.len(), 3);
    assert!(state.messages[1].is_user());
    assert_eq!(state.messages[1].kind, MessageKind::Text);

    let advice = &state.messages[2];
    assert_eq!(advice.kind, MessageKind::HealthAdvice);
    assert_eq!(advice.related_condition.as_deref(), Some("fever_common"));
    assert_eq!(advice.severity, Some(Severity::Mild));
    assert!(advice.text.starts_with(ADVICE_DISCLAIMER));
    let symptoms = advice.text.find("(Symptoms)").unwrap();
    let first_aid = advice.text.find("(First Aid)").unwrap();
    assert!(symptoms < first_aid);
    assert!(!advice.text.contains("When to seek help"));

    assert!(harness.model.prompts().is_empty());
    assert!(!state.is_loading);
}

#[tokio::test]
async fn moderate_condition_lists_when_to_seek_help() {
    let harness = Harness::new(ScriptedModel::default());
    harness.controller.submit("child has diarrhea", InputOrigin::Typed).await;

    let advice = harness.state().messages.last().cloned().unwrap();
    assert_eq!(advice.related_condition.as_deref(), Some("diarrhea"));
    assert_eq!(advice.severity, Some(Severity::Moderate));
    assert!(advice.text.contains("🏥 डॉक्टर से कब मिलें (When to seek help):"));
}

#[tokio::test]
async fn hindi_keyword_resolves_to_condition() {
    let harness = Harness::new(ScriptedModel::default());
    harness.controller.submit("मुझे खांसी है", InputOrigin::Typed).await;

    let advice = harness.state().messages.last().cloned().unwrap();
    assert_eq!(advice.related_condition.as_deref(), Some("cough_cold"));
}

#[tokio::test]
async fn unmatched_query_streams_one_model_reply() {
    let harness = Harness::with_loaded_model(ScriptedModel::default()).await;
    harness.controller.submit("how much water should I drink", InputOrigin::Typed).await;

    let state = harness.state();
    assert_eq!(state.messages.len(), 3);
    let reply = &state.messages[2];
    assert_eq!(reply.author, Author::Assistant);
    assert_eq!(reply.kind, MessageKind::Text);
    assert_eq!(reply.text, "ABC");
    assert!(state.messages.iter().all(|m| m.kind != MessageKind::HealthAdvice));
    assert!(!state.is_loading);

    let prompts = harness.model.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].starts_with(&PromptConfig::default().system_preamble));
    assert!(prompts[0].ends_with("\n\nUser query: how much water should I drink"));
}

#[tokio::test]
async fn failing_generation_appends_single_apology() {
    let harness = Harness::with_loaded_model(
        ScriptedModel::replying(Reply::FailToStart("runtime crashed"))
    ).await;
    harness.controller.submit("how much water should I drink", InputOrigin::Typed).await;

    let state = harness.state();
    assert_eq!(state.messages.len(), 3);
    assert_eq!(state.messages[2].text, apology());
    assert!(!state.is_loading);
}

#[tokio::test]
async fn mid_stream_failure_replaces_partial_reply() {
    let harness = Harness::with_loaded_model(
        ScriptedModel::replying(Reply::FailAfter(vec!["Drink ", "eight"], "connection reset"))
    ).await;
    harness.controller.submit("how much water should I drink", InputOrigin::Typed).await;

    let state = harness.state();
    assert_eq!(state.messages.len(), 3);
    assert_eq!(state.messages[2].text, apology());
}

#[tokio::test]
async fn empty_stream_counts_as_failure() {
    let harness = Harness::with_loaded_model(ScriptedModel::replying(Reply::Tokens(vec![]))).await;
    harness.controller.submit("how much water should I drink", InputOrigin::Typed).await;

    let state = harness.state();
    assert_eq!(state.messages.len(), 3);
    assert_eq!(state.messages[2].text, apology());
}

#[tokio::test]
async fn unmatched_query_without_model_only_sets_status() {
    let harness = Harness::new(ScriptedModel::default());
    harness.controller.submit("how much water should I drink", InputOrigin::Typed).await;

    let state = harness.state();
    assert_eq!(state.messages.len(), 1);
    assert_eq!(state.status_message, STATUS_MODEL_REQUIRED);
    assert!(harness.model.prompts().is_empty());
}

#[tokio::test]
async fn rejected_query_does_not_leave_loading_set() {
    let harness = Harness::new(ScriptedModel::default());
    let mut rx = harness.controller.subscribe();
    rx.borrow_and_update();
    harness.controller.submit("how much water should I drink", InputOrigin::Typed).await;

    assert!(rx.has_changed().unwrap());
    let state = rx.borrow_and_update().clone();
    assert!(!state.is_loading);
    assert_eq!(state.status_message, STATUS_MODEL_REQUIRED);
}

#[tokio::test]
async fn blank_input_is_ignored() {
    let harness = Harness::with_loaded_model(ScriptedModel::default()).await;
    harness.controller.submit("   \n", InputOrigin::Typed).await;
    assert_eq!(harness.state().messages.len(), 1);
    assert!(harness.model.prompts().is_empty());
}

#[tokio::test]
async fn clear_leaves_only_the_welcome_message() {
    let harness = Harness::with_loaded_model(ScriptedModel::default()).await;
    harness.controller.submit("fever", InputOrigin::Typed).await;
    harness.controller.submit("how much water should I drink", InputOrigin::Typed).await;
    assert_eq!(harness.state().messages.len(), 5);

    harness.controller.clear_conversation().await;
    let state = harness.state();
    assert_eq!(state.messages.len(), 1);
    assert_eq!(state.messages[0].text, welcome());
}

#[tokio::test]
async fn voice_reply_is_spoken_after_preparation() {
    let harness = Harness::new(ScriptedModel::default());
    harness.controller.submit("fever", InputOrigin::Voice).await;

    let state = harness.state();
    assert_eq!(state.messages[1].kind, MessageKind::VoiceInput);

    let spoken = harness.speech.wait_for_speech().await;
    assert_eq!(spoken.len(), 1);
    let (text, language) = &spoken[0];
    assert_eq!(language, "en-IN");
    assert!(text.starts_with("यह चिकित्सा सलाह नहीं है।"));
    assert!(text.contains("Common Fever"));
}

#[tokio::test]
async fn model_voice_reply_is_spoken_once_after_streaming() {
    let harness = Harness::with_loaded_model(ScriptedModel::default()).await;
    harness.controller.submit("how much water should I drink", InputOrigin::Voice).await;

    let state = harness.state();
    assert!(!state.is_loading);
    assert_eq!(state.messages.last().map(|m| m.text.as_str()), Some("ABC"));

    let spoken = harness.speech.wait_for_speech().await;
    assert_eq!(spoken, vec![("ABC".to_string(), "en-IN".to_string())]);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(harness.speech.spoken.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn typed_reply_is_not_spoken() {
    let harness = Harness::new(ScriptedModel::default());
    harness.controller.submit("fever", InputOrigin::Typed).await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(harness.speech.spoken.lock().unwrap().is_empty());
}

#[tokio::test]
async fn voice_reply_is_silent_when_tts_not_ready() {
    let harness = Harness::with_speech(ScriptedModel::default(), FakeSpeech::new(true, false));
    harness.controller.submit("fever", InputOrigin::Voice).await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(harness.speech.spoken.lock().unwrap().is_empty());
}

#[tokio::test]
async fn apology_is_never_spoken() {
    let harness = Harness::with_loaded_model(
        ScriptedModel::replying(Reply::FailToStart("runtime crashed"))
    ).await;
    harness.controller.submit("how much water should I drink", InputOrigin::Voice).await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(harness.speech.spoken.lock().unwrap().is_empty());
}

#[tokio::test]
async fn refresh_reports_model_availability() {
    let harness = Harness::new(ScriptedModel::default());
    harness.controller.refresh_models().await;
    let state = harness.state();
    assert_eq!(state.available_models.len(), 1);
    assert_eq!(state.status_message, STATUS_MODELS_READY);

    let empty = Harness::new(ScriptedModel { models: Ok(vec![]), ..Default::default() });
    empty.controller.refresh_models().await;
    assert_eq!(empty.state().status_message, STATUS_NO_MODELS);

    let broken = Harness::new(ScriptedModel { models: Err("offline"), ..Default::default() });
    broken.controller.refresh_models().await;
    assert_eq!(broken.state().status_message, "Error loading models: offline");
}

#[tokio::test]
async fn download_completes_and_clears_progress() {
    let harness = Harness::new(ScriptedModel::default());
    harness.controller.refresh_models().await;
    harness.controller.download_model("qwen2.5:0.5b").await;

    let state = harness.state();
    assert_eq!(state.status_message, STATUS_DOWNLOAD_COMPLETE);
    assert_eq!(state.download_progress, None);
    assert!(state.available_models[0].is_downloaded);
}

#[tokio::test]
async fn download_failure_is_reported() {
    let harness = Harness::new(ScriptedModel {
        progress: vec![0.4],
        progress_error: Some("disk full"),
        ..Default::default()
    });
    harness.controller.download_model("qwen2.5:0.5b").await;

    let state = harness.state();
    assert_eq!(state.status_message, "Download failed: disk full");
    assert_eq!(state.download_progress, None);
}

#[tokio::test]
async fn interrupted_download_is_not_marked_complete() {
    let harness = Harness::new(ScriptedModel {
        progress: vec![0.1],
        progress_error: Some("stream ended before completion"),
        ..Default::default()
    });
    harness.controller.refresh_models().await;
    harness.controller.download_model("qwen2.5:0.5b").await;

    let state = harness.state();
    assert_eq!(state.status_message, "Download failed: stream ended before completion");
    assert!(!state.available_models[0].is_downloaded);
}

#[tokio::test]
async fn load_outcomes_set_status() {
    let harness = Harness::new(ScriptedModel::default());
    harness.controller.load_model("qwen2.5:0.5b").await;
    let state = harness.state();
    assert_eq!(state.current_model_id.as_deref(), Some("qwen2.5:0.5b"));
    assert_eq!(state.status_message, STATUS_MODEL_READY);

    let refused = Harness::new(ScriptedModel { load_result: Ok(false), ..Default::default() });
    refused.controller.load_model("qwen2.5:0.5b").await;
    assert_eq!(refused.state().status_message, STATUS_LOAD_FAILED);
    assert_eq!(refused.state().current_model_id, None);

    let broken = Harness::new(ScriptedModel { load_result: Err("out of memory"), ..Default::default() });
    broken.controller.load_model("qwen2.5:0.5b").await;
    assert_eq!(broken.state().status_message, "Error loading model: out of memory");
}

#[tokio::test]
async fn language_must_be_supported() {
    let harness = Harness::new(ScriptedModel::default());
    harness.controller.set_language("ta-IN");
    assert_eq!(harness.state().language, "ta-IN");

    harness.controller.set_language("fr-FR");
    let state = harness.state();
    assert_eq!(state.language, "ta-IN");
    assert_eq!(state.status_message, "Unsupported language: fr-FR");
}

#[tokio::test]
async fn voice_input_requires_recognition() {
    let harness = Harness::with_speech(ScriptedModel::default(), FakeSpeech::new(false, true));
    harness.controller.start_voice_input().await;
    let state = harness.state();
    assert_eq!(state.status_message, STATUS_RECOGNITION_UNAVAILABLE);
    assert!(!state.voice_mode_active);
}

#[tokio::test]
async fn voice_input_listens_in_current_language() {
    let harness = Harness::new(ScriptedModel::default());
    harness.controller.set_language("hi-IN");
    harness.controller.start_voice_input().await;
    assert!(harness.state().voice_mode_active);
    assert_eq!(harness.speech.listening_in.lock().unwrap().as_slice(), ["hi-IN"]);

    harness.controller.stop_voice_input().await;
    assert!(!harness.state().voice_mode_active);
    assert!(!harness.speech.current().is_listening);
}

#[tokio::test]
async fn heard_transcript_becomes_a_voice_query() {
    let harness = Harness::new(ScriptedModel::default());
    harness.controller.spawn_speech_observer();
    harness.controller.start_voice_input().await;

    harness.speech.hear("I have a cough");
    let state = harness.wait_for(|s| s.messages.len() == 3 && !s.is_loading).await;

    assert!(!state.voice_mode_active);
    assert_eq!(state.messages[1].kind, MessageKind::VoiceInput);
    assert_eq!(state.messages[1].text, "I have a cough");
    assert_eq!(state.messages[2].related_condition.as_deref(), Some("cough_cold"));
    assert_eq!(harness.speech.current().transcript, None);
}

#[tokio::test]
async fn recognition_error_leaves_voice_mode() {
    let harness = Harness::new(ScriptedModel::default());
    harness.controller.spawn_speech_observer();
    harness.controller.start_voice_input().await;
    assert!(harness.state().voice_mode_active);

    harness.speech.fail_recognition("no-speech");
    harness.wait_for(|s| !s.voice_mode_active).await;
}

#[tokio::test]
async fn daily_tip_and_contacts_are_appended() {
    let harness = Harness::new(ScriptedModel::default());
    harness.controller.show_daily_tip().await;
    harness.controller.show_emergency_contacts().await;

    let state = harness.state();
    assert_eq!(state.messages.len(), 3);
    assert_eq!(state.messages[1].kind, MessageKind::DailyTip);
    assert_eq!(state.messages[2].kind, MessageKind::EmergencyInfo);
    assert!(state.messages[2].text.contains("108"));
}

#[tokio::test]
async fn spawned_turns_run_one_at_a_time() {
    let harness = Harness::with_loaded_model(ScriptedModel::default()).await;
    harness.controller.spawn_submit("how much water should I drink".into(), InputOrigin::Typed);
    harness.controller.spawn_submit("is walking good exercise".into(), InputOrigin::Typed);

    let state = harness.wait_for(|s| s.messages.len() == 5 && !s.is_loading).await;
    let authors: Vec<Author> = state.messages.iter().map(|m| m.author).collect();
    assert_eq!(authors, [
        Author::Assistant,
        Author::User,
        Author::Assistant,
        Author::User,
        Author::Assistant,
    ]);
    assert_eq!(state.messages[2].text, "ABC");
    assert_eq!(state.messages[4].text, "ABC");
}

#[tokio::test]
async fn shutdown_cancels_in_flight_turn() {
    let harness = Harness::with_loaded_model(ScriptedModel::replying(Reply::Hang)).await;
    harness.controller.spawn_submit("how much water should I drink".into(), InputOrigin::Typed);
    harness.wait_for(|s| s.is_loading).await;

    harness.controller.shutdown();
    let state = harness.state();
    assert!(!state.is_loading);
    assert_eq!(state.messages.len(), 2);
}

#[tokio::test]
async fn speech_controls_reach_the_bridge() {
    let harness = Harness::new(ScriptedModel::default());
    harness.speech.fail_recognition("network");
    assert_eq!(harness.speech.current().error.as_deref(), Some("network"));

    harness.controller.clear_speech_error();
    assert_eq!(harness.speech.current().error, None);

    harness.controller.stop_speaking().await;
    assert!(!harness.controller.speech_signals().borrow().is_speaking);
}
