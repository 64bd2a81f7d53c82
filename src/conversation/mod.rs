//! The conversation controller: resolves each query against the knowledge
//! base or the model, and is the only writer of the transcript.

pub mod advisory;
pub mod state;
pub mod turn;

use chrono::Utc;
use futures::StreamExt;
use log::{ debug, error, info, warn };
use std::future::Future;
use std::sync::{ Arc, Mutex, Weak };
use tokio::sync::{ watch, Mutex as AsyncMutex };
use tokio::task::JoinHandle;

use crate::config::prompt::PromptConfig;
use crate::knowledge::{ keywords, KnowledgeStore };
use crate::llm::ModelService;
use crate::models::chat::{ ConversationMessage, InputOrigin, MessageKind };
use crate::models::health::HealthCondition;
use crate::speech::{ self, SpeechBridge, SpeechSignals };

pub use state::ConversationState;
pub use turn::{ StreamingTurn, TurnPhase };

pub const STATUS_MODEL_REQUIRED: &str = "Please load a health model first";
pub const STATUS_MODELS_READY: &str = "Ready - Please download and load a health model";
pub const STATUS_NO_MODELS: &str = "No health models available";
pub const STATUS_DOWNLOAD_STARTED: &str = "Downloading health model...";
pub const STATUS_DOWNLOAD_COMPLETE: &str = "Download complete! Please load the model.";
pub const STATUS_LOADING_MODEL: &str = "Loading health model...";
pub const STATUS_MODEL_READY: &str =
    "लुमिरा तैयार है! Lumira is ready to help with your health questions!";
pub const STATUS_LOAD_FAILED: &str = "Failed to load model";
pub const STATUS_RECOGNITION_UNAVAILABLE: &str = "Speech recognition not available";
pub const STATUS_CANCELLED: &str = "Cancelled";

struct Inner {
    knowledge: Arc<KnowledgeStore>,
    model: Arc<dyn ModelService>,
    speech: Arc<dyn SpeechBridge>,
    prompts: Arc<PromptConfig>,
    state: watch::Sender<ConversationState>,
    /// Held by every operation that appends to the transcript, so a
    /// streaming reply always owns the tail.
    turn_lock: AsyncMutex<()>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

#[derive(Clone)]
pub struct ConversationController {
    inner: Arc<Inner>,
}

impl ConversationController {
    pub fn new(
        knowledge: Arc<KnowledgeStore>,
        model: Arc<dyn ModelService>,
        speech: Arc<dyn SpeechBridge>,
        prompts: Arc<PromptConfig>,
        language: &str
    ) -> Self {
        let language = if speech::is_supported_language(language) {
            language.to_string()
        } else {
            warn!("Unsupported language '{}', falling back to {}", language, speech::DEFAULT_LANGUAGE);
            speech::DEFAULT_LANGUAGE.to_string()
        };
        let welcome = ConversationMessage::assistant(&prompts.welcome_message, MessageKind::Text);
        let daily_tip = knowledge.daily_tip(Utc::now().date_naive()).cloned();
        let (state, _) = watch::channel(ConversationState::new(welcome, language, daily_tip));

        Self {
            inner: Arc::new(Inner {
                knowledge,
                model,
                speech,
                prompts,
                state,
                turn_lock: AsyncMutex::new(()),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationState> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> ConversationState {
        self.inner.state.borrow().clone()
    }

    pub fn speech_signals(&self) -> watch::Receiver<SpeechSignals> {
        self.inner.speech.signals()
    }

    fn set_status(&self, status: impl Into<String>) {
        let status = status.into();
        debug!("Status: {}", status);
        self.inner.state.send_modify(|s| {
            s.status_message = status;
        });
    }

    fn language(&self) -> String {
        self.inner.state.borrow().language.clone()
    }

    fn model_loaded(&self) -> bool {
        self.inner.state.borrow().current_model_id.is_some()
    }

    /// First knowledge-base condition for `text`, searching by the
    /// recognised health keywords when there are any.
    pub fn resolve(&self, text: &str) -> Option<HealthCondition> {
        let terms = keywords::search_terms(text);
        self.inner.knowledge.search_health_info(&terms).first().map(|c| (*c).clone())
    }

    /// Answers one user query. Never fails: errors end up as the fallback
    /// apology in the transcript or as a status message.
    pub async fn submit(&self, text: &str, origin: InputOrigin) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let _turn = self.inner.turn_lock.lock().await;
        self.inner.state.send_modify(|s| {
            s.is_loading = true;
        });

        let matched = self.resolve(text);
        if matched.is_none() && !self.model_loaded() {
            info!("No knowledge-base match and no model loaded; rejecting query");
            self.inner.state.send_modify(|s| {
                s.is_loading = false;
                s.status_message = STATUS_MODEL_REQUIRED.to_string();
            });
            return;
        }

        self.inner.state.send_modify(|s| {
            s.messages.push(ConversationMessage::user(text, origin));
        });

        let reply = match matched {
            Some(condition) => {
                info!("Answering from knowledge base: {}", condition.id);
                let advice = advisory::format_health_advice(&condition);
                self.inner.state.send_modify(|s| {
                    s.messages.push(ConversationMessage::advice(advice.clone(), &condition));
                });
                Some(advice)
            }
            None => {
                info!("No knowledge-base match; delegating to the model");
                self.answer_from_model(text).await
            }
        };

        if origin == InputOrigin::Voice {
            if let Some(reply) = reply {
                self.speak_reply(&reply);
            }
        }

        self.inner.state.send_modify(|s| {
            s.is_loading = false;
        });
    }

    async fn answer_from_model(&self, text: &str) -> Option<String> {
        let prompt = self.inner.prompts.health_prompt(text);
        let apology = self.inner.prompts.fallback_apology.as_str();
        let mut turn = StreamingTurn::new();

        let mut stream = match self.inner.model.generate_stream(&prompt).await {
            Ok(stream) => stream,
            Err(e) => {
                error!("Model generation failed to start: {}", e);
                self.inner.state.send_modify(|s| turn.fail(apology, &mut s.messages));
                return None;
            }
        };

        while let Some(item) = stream.next().await {
            match item {
                Ok(token) => {
                    self.inner.state.send_modify(|s| turn.push_token(&token, &mut s.messages));
                }
                Err(e) => {
                    error!("Model stream failed after {} chars: {}", turn.text().len(), e);
                    self.inner.state.send_modify(|s| turn.fail(apology, &mut s.messages));
                    return None;
                }
            }
        }

        if turn.phase() == TurnPhase::AwaitingFirstToken {
            warn!("Model stream ended without producing any text");
            self.inner.state.send_modify(|s| turn.fail(apology, &mut s.messages));
            return None;
        }
        turn.finalize()
    }

    fn speak_reply(&self, reply: &str) {
        if !self.inner.speech.is_tts_ready() {
            debug!("Text-to-speech not ready; skipping spoken reply");
            return;
        }
        let spoken = speech::prepare_for_speech(reply);
        let language = self.language();
        let bridge = Arc::clone(&self.inner.speech);
        tokio::spawn(async move {
            if let Err(e) = bridge.speak(&spoken, &language).await {
                warn!("Speaking reply failed: {}", e);
            }
        });
    }

    pub async fn refresh_models(&self) {
        match self.inner.model.list_available_models().await {
            Ok(models) => {
                let status = if models.is_empty() { STATUS_NO_MODELS } else { STATUS_MODELS_READY };
                self.inner.state.send_modify(|s| {
                    s.available_models = models;
                    s.status_message = status.to_string();
                });
            }
            Err(e) => {
                error!("Listing models failed: {}", e);
                self.set_status(format!("Error loading models: {}", e));
            }
        }
    }

    pub async fn download_model(&self, model_id: &str) {
        self.set_status(STATUS_DOWNLOAD_STARTED);
        let mut progress = match self.inner.model.download_model(model_id).await {
            Ok(progress) => progress,
            Err(e) => {
                self.download_failed(model_id, &e.to_string());
                return;
            }
        };

        while let Some(item) = progress.next().await {
            match item {
                Ok(fraction) => {
                    let fraction = fraction.clamp(0.0, 1.0);
                    self.inner.state.send_modify(|s| {
                        s.download_progress = Some(fraction);
                        s.status_message = format!("Downloading: {}%", (fraction * 100.0) as u32);
                    });
                }
                Err(e) => {
                    self.download_failed(model_id, &e.to_string());
                    return;
                }
            }
        }

        info!("Model '{}' downloaded", model_id);
        self.inner.state.send_modify(|s| {
            s.download_progress = None;
            s.status_message = STATUS_DOWNLOAD_COMPLETE.to_string();
            for model in s.available_models.iter_mut().filter(|m| m.id == model_id) {
                model.is_downloaded = true;
            }
        });
    }

    fn download_failed(&self, model_id: &str, reason: &str) {
        error!("Download of '{}' failed: {}", model_id, reason);
        self.inner.state.send_modify(|s| {
            s.download_progress = None;
            s.status_message = format!("Download failed: {}", reason);
        });
    }

    pub async fn load_model(&self, model_id: &str) {
        self.set_status(STATUS_LOADING_MODEL);
        match self.inner.model.load_model(model_id).await {
            Ok(true) => {
                info!("Model '{}' is ready", model_id);
                self.inner.state.send_modify(|s| {
                    s.current_model_id = Some(model_id.to_string());
                    s.status_message = STATUS_MODEL_READY.to_string();
                });
            }
            Ok(false) => {
                warn!("Model '{}' could not be loaded", model_id);
                self.set_status(STATUS_LOAD_FAILED);
            }
            Err(e) => {
                error!("Loading model '{}' failed: {}", model_id, e);
                self.set_status(format!("Error loading model: {}", e));
            }
        }
    }

    pub async fn start_voice_input(&self) {
        if !self.inner.speech.is_recognition_available() {
            self.set_status(STATUS_RECOGNITION_UNAVAILABLE);
            return;
        }
        self.inner.state.send_modify(|s| {
            s.voice_mode_active = true;
        });
        let language = self.language();
        if let Err(e) = self.inner.speech.start_listening(&language).await {
            warn!("Could not start listening: {}", e);
            self.inner.state.send_modify(|s| {
                s.voice_mode_active = false;
                s.status_message = format!("Voice input failed: {}", e);
            });
        }
    }

    pub async fn stop_voice_input(&self) {
        if let Err(e) = self.inner.speech.stop_listening().await {
            warn!("Could not stop listening: {}", e);
        }
        self.inner.state.send_modify(|s| {
            s.voice_mode_active = false;
        });
    }

    pub async fn stop_speaking(&self) {
        if let Err(e) = self.inner.speech.stop_speaking().await {
            warn!("Could not stop speaking: {}", e);
        }
    }

    pub fn clear_speech_error(&self) {
        self.inner.speech.clear_error();
    }

    pub fn set_language(&self, language: &str) {
        if !speech::is_supported_language(language) {
            self.set_status(format!("Unsupported language: {}", language));
            return;
        }
        self.inner.state.send_modify(|s| {
            s.language = language.to_string();
        });
    }

    pub async fn clear_conversation(&self) {
        let _turn = self.inner.turn_lock.lock().await;
        let welcome = ConversationMessage::assistant(
            &self.inner.prompts.welcome_message,
            MessageKind::Text
        );
        self.inner.state.send_modify(|s| {
            s.messages = vec![welcome];
        });
    }

    pub async fn show_daily_tip(&self) {
        let _turn = self.inner.turn_lock.lock().await;
        let tip = self.inner.state.borrow().daily_tip.clone();
        match tip {
            Some(tip) => {
                let message = ConversationMessage::assistant(
                    advisory::format_daily_tip(&tip),
                    MessageKind::DailyTip
                );
                self.inner.state.send_modify(|s| s.messages.push(message));
            }
            None => self.set_status("No health tips available"),
        }
    }

    pub async fn show_emergency_contacts(&self) {
        let _turn = self.inner.turn_lock.lock().await;
        let contacts = self.inner.knowledge.emergency_contacts();
        if contacts.is_empty() {
            self.set_status("No emergency contacts available");
            return;
        }
        let message = ConversationMessage::assistant(
            advisory::format_emergency_contacts(contacts),
            MessageKind::EmergencyInfo
        );
        self.inner.state.send_modify(|s| s.messages.push(message));
    }

    /// Runs `operation` as its own task; `shutdown` aborts it if still running.
    pub fn spawn<F>(&self, operation: F) where F: Future<Output = ()> + Send + 'static {
        let handle = tokio::spawn(operation);
        let mut tasks = match self.inner.tasks.lock() {
            Ok(tasks) => tasks,
            Err(poisoned) => poisoned.into_inner(),
        };
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }

    pub fn spawn_submit(&self, text: String, origin: InputOrigin) {
        let this = self.clone();
        self.spawn(async move {
            this.submit(&text, origin).await;
        });
    }

    pub fn spawn_download(&self, model_id: String) {
        let this = self.clone();
        self.spawn(async move {
            this.download_model(&model_id).await;
        });
    }

    pub fn spawn_load(&self, model_id: String) {
        let this = self.clone();
        self.spawn(async move {
            this.load_model(&model_id).await;
        });
    }

    /// Submits every non-blank transcript the speech bridge reports as a
    /// voice query, and leaves voice mode when recognition reports an error.
    /// Stops once the controller is dropped.
    pub fn spawn_speech_observer(&self) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let mut signals = self.inner.speech.signals();
        self.spawn(async move {
            loop {
                let (transcript, failed) = {
                    let current = signals.borrow_and_update();
                    (current.transcript.clone(), current.error.is_some() && !current.is_listening)
                };
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let controller = ConversationController { inner };
                if failed {
                    controller.inner.state.send_if_modified(|s| {
                        std::mem::replace(&mut s.voice_mode_active, false)
                    });
                }
                if let Some(text) = transcript.filter(|t| !t.trim().is_empty()) {
                    controller.inner.speech.clear_result();
                    controller.inner.state.send_modify(|s| {
                        s.voice_mode_active = false;
                    });
                    controller.submit(&text, InputOrigin::Voice).await;
                }
                drop(controller);
                if signals.changed().await.is_err() {
                    break;
                }
            }
        });
    }

    /// Aborts every in-flight operation started through the `spawn_*`
    /// methods and settles the busy flags.
    pub fn shutdown(&self) {
        let tasks: Vec<JoinHandle<()>> = match self.inner.tasks.lock() {
            Ok(mut tasks) => tasks.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        };
        let mut aborted = 0;
        for task in tasks {
            if !task.is_finished() {
                task.abort();
                aborted += 1;
            }
        }
        if aborted > 0 {
            info!("Cancelled {} in-flight operations", aborted);
        }
        self.inner.state.send_modify(|s| {
            if s.is_loading || s.download_progress.is_some() {
                s.status_message = STATUS_CANCELLED.to_string();
            }
            s.is_loading = false;
            s.download_progress = None;
        });
    }
}
