//! Speech capability: the trait the conversation layer talks to, plus the
//! text preparation every spoken reply goes through.

pub mod relay;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

pub use relay::{ RelaySpeechBridge, SpeechCommand };

pub const DEFAULT_LANGUAGE: &str = "en-IN";

pub const SUPPORTED_LANGUAGES: &[&str] = &["en-IN", "hi-IN", "ta-IN", "te-IN", "mr-IN"];

const SPOKEN_DISCLAIMER: &str = "यह चिकित्सा सलाह नहीं है। गंभीर स्थिति में डॉक्टर से मिलें।";

const DISCLAIMER_TRIGGERS: &[&str] = &["fever", "symptoms", "medicine"];

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpeechError {
    #[error("speech recognition not available")]
    RecognitionUnavailable,
    #[error("text-to-speech not ready")]
    NotReady,
    #[error("speech client disconnected")]
    Disconnected,
    #[error("{0}")]
    Engine(String),
}

/// Observable state of the speech engines.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SpeechSignals {
    pub is_listening: bool,
    pub is_speaking: bool,
    pub transcript: Option<String>,
    pub error: Option<String>,
    pub engine_ready: bool,
}

#[async_trait]
pub trait SpeechBridge: Send + Sync {
    async fn start_listening(&self, language: &str) -> Result<(), SpeechError>;

    async fn stop_listening(&self) -> Result<(), SpeechError>;

    async fn speak(&self, text: &str, language: &str) -> Result<(), SpeechError>;

    async fn stop_speaking(&self) -> Result<(), SpeechError>;

    fn signals(&self) -> watch::Receiver<SpeechSignals>;

    fn clear_result(&self);

    fn clear_error(&self);

    fn is_recognition_available(&self) -> bool;

    fn is_tts_ready(&self) -> bool {
        self.signals().borrow().engine_ready
    }
}

pub fn is_supported_language(tag: &str) -> bool {
    SUPPORTED_LANGUAGES.contains(&tag)
}

static SPEECH_REWRITES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\s*°C", " degrees Celsius"),
        (r"\s*°F", " degrees Fahrenheit"),
        (r"(\d)\s*mg\b", "$1 milligrams"),
        (r"\bmg\b", "milligrams"),
        (r"(\d)\s*ml\b", "$1 milliliters"),
        (r"\bml\b", "milliliters"),
        (r"\bORS\b", "Oral Rehydration Solution"),
        (r"\bIV\b", "Intravenous"),
        (r"\bB\.P\.", "Blood Pressure"),
        (r"\bHR\b", "Heart Rate"),
    ]
        .into_iter()
        .filter_map(|(pattern, replacement)| {
            Regex::new(pattern)
                .ok()
                .map(|re| (re, replacement))
        })
        .collect()
});

/// Expands units and medical abbreviations into words a TTS engine reads
/// correctly.
pub fn normalize_for_speech(text: &str) -> String {
    SPEECH_REWRITES.iter().fold(text.to_string(), |acc, (re, replacement)| {
        re.replace_all(&acc, *replacement).into_owned()
    })
}

/// Prefixes the spoken disclaimer when the text talks about clinical matters.
pub fn with_spoken_disclaimer(text: &str) -> String {
    let lowered = text.to_lowercase();
    if DISCLAIMER_TRIGGERS.iter().any(|t| lowered.contains(t)) {
        format!("{} {}", SPOKEN_DISCLAIMER, text)
    } else {
        text.to_string()
    }
}

pub fn prepare_for_speech(text: &str) -> String {
    with_spoken_disclaimer(&normalize_for_speech(text))
}
