use serde::Serialize;

use crate::llm::ModelDescriptor;
use crate::models::chat::ConversationMessage;
use crate::models::health::HealthTip;

/// Everything a screen renders. Published as a whole after every change.
#[derive(Clone, Debug, Serialize)]
pub struct ConversationState {
    pub messages: Vec<ConversationMessage>,
    pub is_loading: bool,
    pub language: String,
    pub voice_mode_active: bool,
    pub current_model_id: Option<String>,
    pub status_message: String,
    pub download_progress: Option<f32>,
    pub available_models: Vec<ModelDescriptor>,
    pub daily_tip: Option<HealthTip>,
}

impl ConversationState {
    pub fn new(welcome: ConversationMessage, language: String, daily_tip: Option<HealthTip>) -> Self {
        Self {
            messages: vec![welcome],
            is_loading: false,
            language,
            voice_mode_active: false,
            current_model_id: None,
            status_message: "Initializing LumiraAI...".to_string(),
            download_progress: None,
            available_models: Vec::new(),
            daily_tip,
        }
    }

    pub fn last_message(&self) -> Option<&ConversationMessage> {
        self.messages.last()
    }
}
