#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream;
use lumira_health::config::prompt::PromptConfig;
use lumira_health::conversation::{ ConversationController, ConversationState };
use lumira_health::knowledge::KnowledgeStore;
use lumira_health::llm::{ ModelDescriptor, ModelError, ModelService, ProgressStream, TokenStream };
use lumira_health::speech::{ SpeechBridge, SpeechError, SpeechSignals };
use std::sync::{ Arc, Mutex };
use std::time::Duration;
use tokio::sync::watch;

/// What `generate_stream` does on the next call.
#[derive(Clone)]
pub enum Reply {
    Tokens(Vec<&'static str>),
    FailToStart(&'static str),
    FailAfter(Vec<&'static str>, &'static str),
    /// Never yields; used to hold a turn open.
    Hang,
}

pub struct ScriptedModel {
    pub models: Result<Vec<ModelDescriptor>, &'static str>,
    pub reply: Mutex<Reply>,
    pub progress: Vec<f32>,
    pub progress_error: Option<&'static str>,
    pub load_result: Result<bool, &'static str>,
    pub prompts: Mutex<Vec<String>>,
}

impl Default for ScriptedModel {
    fn default() -> Self {
        Self {
            models: Ok(vec![ModelDescriptor {
                id: "qwen2.5:0.5b".into(),
                name: "qwen2.5:0.5b".into(),
                size_bytes: None,
                is_downloaded: false,
            }]),
            reply: Mutex::new(Reply::Tokens(vec!["A", "B", "C"])),
            progress: vec![0.25, 0.5, 1.0],
            progress_error: None,
            load_result: Ok(true),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedModel {
    pub fn replying(reply: Reply) -> Self {
        Self { reply: Mutex::new(reply), ..Default::default() }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelService for ScriptedModel {
    async fn list_available_models(&self) -> Result<Vec<ModelDescriptor>, ModelError> {
        self.models.clone().map_err(|e| ModelError::Other(e.to_string()))
    }

    async fn download_model(&self, _model_id: &str) -> Result<ProgressStream, ModelError> {
        let mut items: Vec<Result<f32, ModelError>> = self.progress.iter().map(|p| Ok(*p)).collect();
        if let Some(error) = self.progress_error {
            items.push(Err(ModelError::Other(error.to_string())));
        }
        Ok(Box::pin(stream::iter(items)))
    }

    async fn load_model(&self, _model_id: &str) -> Result<bool, ModelError> {
        self.load_result.map_err(|e| ModelError::Other(e.to_string()))
    }

    async fn generate_stream(&self, prompt: &str) -> Result<TokenStream, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let reply = self.reply.lock().unwrap().clone();
        match reply {
            Reply::Tokens(tokens) => {
                let items: Vec<Result<String, ModelError>> = tokens
                    .into_iter()
                    .map(|t| Ok(t.to_string()))
                    .collect();
                Ok(Box::pin(stream::iter(items)))
            }
            Reply::FailToStart(error) => Err(ModelError::Other(error.to_string())),
            Reply::FailAfter(tokens, error) => {
                let mut items: Vec<Result<String, ModelError>> = tokens
                    .into_iter()
                    .map(|t| Ok(t.to_string()))
                    .collect();
                items.push(Err(ModelError::Other(error.to_string())));
                Ok(Box::pin(stream::iter(items)))
            }
            Reply::Hang => Ok(Box::pin(stream::pending::<Result<String, ModelError>>())),
        }
    }
}

pub struct FakeSpeech {
    signals: watch::Sender<SpeechSignals>,
    recognition_available: bool,
    pub spoken: Mutex<Vec<(String, String)>>,
    pub listening_in: Mutex<Vec<String>>,
}

impl FakeSpeech {
    pub fn new(recognition_available: bool, tts_ready: bool) -> Self {
        let (signals, _) = watch::channel(SpeechSignals {
            engine_ready: tts_ready,
            ..Default::default()
        });
        Self {
            signals,
            recognition_available,
            spoken: Mutex::new(Vec::new()),
            listening_in: Mutex::new(Vec::new()),
        }
    }

    /// Simulates the recognizer delivering a final result.
    pub fn hear(&self, text: &str) {
        self.signals.send_modify(|s| {
            s.is_listening = false;
            s.transcript = Some(text.to_string());
        });
    }

    pub fn fail_recognition(&self, message: &str) {
        self.signals.send_modify(|s| {
            s.is_listening = false;
            s.error = Some(message.to_string());
        });
    }

    pub fn current(&self) -> SpeechSignals {
        self.signals.borrow().clone()
    }

    pub async fn wait_for_speech(&self) -> Vec<(String, String)> {
        for _ in 0..100 {
            let spoken = self.spoken.lock().unwrap().clone();
            if !spoken.is_empty() {
                return spoken;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Vec::new()
    }
}

#[async_trait]
impl SpeechBridge for FakeSpeech {
    async fn start_listening(&self, language: &str) -> Result<(), SpeechError> {
        if !self.recognition_available {
            return Err(SpeechError::RecognitionUnavailable);
        }
        self.listening_in.lock().unwrap().push(language.to_string());
        self.signals.send_modify(|s| {
            s.error = None;
            s.transcript = None;
            s.is_listening = true;
        });
        Ok(())
    }

    async fn stop_listening(&self) -> Result<(), SpeechError> {
        self.signals.send_modify(|s| s.is_listening = false);
        Ok(())
    }

    async fn speak(&self, text: &str, language: &str) -> Result<(), SpeechError> {
        self.spoken.lock().unwrap().push((text.to_string(), language.to_string()));
        Ok(())
    }

    async fn stop_speaking(&self) -> Result<(), SpeechError> {
        self.signals.send_modify(|s| s.is_speaking = false);
        Ok(())
    }

    fn signals(&self) -> watch::Receiver<SpeechSignals> {
        self.signals.subscribe()
    }

    fn clear_result(&self) {
        self.signals.send_modify(|s| s.transcript = None);
    }

    fn clear_error(&self) {
        self.signals.send_modify(|s| s.error = None);
    }

    fn is_recognition_available(&self) -> bool {
        self.recognition_available
    }
}

pub struct Harness {
    pub controller: ConversationController,
    pub model: Arc<ScriptedModel>,
    pub speech: Arc<FakeSpeech>,
}

impl Harness {
    pub fn new(model: ScriptedModel) -> Self {
        Self::with_speech(model, FakeSpeech::new(true, true))
    }

    pub fn with_speech(model: ScriptedModel, speech: FakeSpeech) -> Self {
        let model = Arc::new(model);
        let speech = Arc::new(speech);
        let controller = ConversationController::new(
            Arc::new(KnowledgeStore::builtin()),
            Arc::clone(&model) as Arc<dyn ModelService>,
            Arc::clone(&speech) as Arc<dyn SpeechBridge>,
            Arc::new(PromptConfig::default()),
            "en-IN"
        );
        Self { controller, model, speech }
    }

    pub async fn with_loaded_model(model: ScriptedModel) -> Self {
        let harness = Self::new(model);
        harness.controller.load_model("qwen2.5:0.5b").await;
        harness
    }

    pub fn state(&self) -> ConversationState {
        self.controller.snapshot()
    }

    pub async fn wait_for<F>(&self, predicate: F) -> ConversationState
        where F: Fn(&ConversationState) -> bool
    {
        let mut rx = self.controller.subscribe();
        let waited = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| predicate(s))).await;
        match waited {
            Ok(Ok(state)) => state.clone(),
            _ => panic!("state never satisfied the predicate: {:?}", self.state().status_message),
        }
    }
}
