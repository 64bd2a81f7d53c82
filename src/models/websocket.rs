use serde::{ Serialize, Deserialize };

use crate::conversation::ConversationState;
use crate::speech::{ SpeechCommand, SpeechSignals };

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Chat {
        content: String,
    },
    /// Final recognition result from the device microphone.
    VoiceTranscript {
        text: String,
    },
    VoiceError {
        message: String,
    },
    SpeechState {
        #[serde(default)]
        is_speaking: Option<bool>,
        #[serde(default)]
        engine_ready: Option<bool>,
    },
    StartVoice,
    StopVoice,
    SetLanguage {
        language: String,
    },
    ListModels,
    DownloadModel {
        model_id: String,
    },
    LoadModel {
        model_id: String,
    },
    ClearConversation,
    StopSpeaking,
    ClearSpeechError,
    DailyTip,
    EmergencyContacts,
}

#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    State {
        conversation: ConversationState,
        speech: SpeechSignals,
        timestamp: i64,
    },
    StartListening {
        language: String,
    },
    StopListening,
    Speak {
        text: String,
        language: String,
    },
    StopSpeaking,
    Error {
        message: String,
    },
}

impl From<SpeechCommand> for ServerMessage {
    fn from(command: SpeechCommand) -> Self {
        match command {
            SpeechCommand::StartListening { language } => ServerMessage::StartListening { language },
            SpeechCommand::StopListening => ServerMessage::StopListening,
            SpeechCommand::Speak { text, language } => ServerMessage::Speak { text, language },
            SpeechCommand::StopSpeaking => ServerMessage::StopSpeaking,
        }
    }
}
