use async_trait::async_trait;
use log::{ debug, warn };
use serde::Serialize;
use tokio::sync::{ mpsc, watch };

use super::{ SpeechBridge, SpeechError, SpeechSignals };

/// Instructions for the device that owns the microphone and speaker.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum SpeechCommand {
    StartListening {
        language: String,
    },
    StopListening,
    Speak {
        text: String,
        language: String,
    },
    StopSpeaking,
}

/// Speech bridge for a remote client: commands go out over a channel, and
/// the client reports transcripts, errors and playback state back.
pub struct RelaySpeechBridge {
    outbound: mpsc::UnboundedSender<SpeechCommand>,
    signals: watch::Sender<SpeechSignals>,
    recognition_available: bool,
}

impl RelaySpeechBridge {
    pub fn new(
        outbound: mpsc::UnboundedSender<SpeechCommand>,
        recognition_available: bool,
        tts_ready: bool
    ) -> Self {
        let (signals, _) = watch::channel(SpeechSignals {
            engine_ready: tts_ready,
            ..Default::default()
        });
        Self {
            outbound,
            signals,
            recognition_available,
        }
    }

    fn send(&self, command: SpeechCommand) -> Result<(), SpeechError> {
        self.outbound.send(command).map_err(|_| {
            warn!("Speech client is gone; dropping command");
            SpeechError::Disconnected
        })
    }

    fn fail(&self, error: SpeechError) -> Result<(), SpeechError> {
        self.signals.send_modify(|s| {
            s.error = Some(error.to_string());
        });
        Err(error)
    }

    pub fn report_transcript(&self, text: &str) {
        debug!("Transcript received ({} chars)", text.len());
        self.signals.send_modify(|s| {
            s.is_listening = false;
            s.transcript = Some(text.to_string());
        });
    }

    pub fn report_error(&self, message: &str) {
        self.signals.send_modify(|s| {
            s.is_listening = false;
            s.error = Some(message.to_string());
        });
    }

    pub fn report_speaking(&self, speaking: bool) {
        self.signals.send_modify(|s| {
            s.is_speaking = speaking;
        });
    }

    pub fn set_engine_ready(&self, ready: bool) {
        self.signals.send_modify(|s| {
            s.engine_ready = ready;
        });
    }
}

#[async_trait]
impl SpeechBridge for RelaySpeechBridge {
    async fn start_listening(&self, language: &str) -> Result<(), SpeechError> {
        if !self.recognition_available {
            return self.fail(SpeechError::RecognitionUnavailable);
        }
        self.signals.send_modify(|s| {
            s.transcript = None;
            s.error = None;
            s.is_listening = true;
        });
        self.send(SpeechCommand::StartListening { language: language.to_string() })
    }

    async fn stop_listening(&self) -> Result<(), SpeechError> {
        self.signals.send_modify(|s| {
            s.is_listening = false;
        });
        self.send(SpeechCommand::StopListening)
    }

    async fn speak(&self, text: &str, language: &str) -> Result<(), SpeechError> {
        let ready = self.signals.borrow().engine_ready;
        if !ready {
            return self.fail(SpeechError::NotReady);
        }
        self.signals.send_modify(|s| {
            s.is_speaking = true;
        });
        self.send(SpeechCommand::Speak {
            text: text.to_string(),
            language: language.to_string(),
        })
    }

    async fn stop_speaking(&self) -> Result<(), SpeechError> {
        self.signals.send_modify(|s| {
            s.is_speaking = false;
        });
        self.send(SpeechCommand::StopSpeaking)
    }

    fn signals(&self) -> watch::Receiver<SpeechSignals> {
        self.signals.subscribe()
    }

    fn clear_result(&self) {
        self.signals.send_modify(|s| {
            s.transcript = None;
        });
    }

    fn clear_error(&self) {
        self.signals.send_modify(|s| {
            s.error = None;
        });
    }

    fn is_recognition_available(&self) -> bool {
        self.recognition_available
    }
}
