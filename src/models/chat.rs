use chrono::{ DateTime, Utc };
use serde::{ Serialize, Deserialize };
use uuid::Uuid;

use super::health::{ HealthCondition, Severity };

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Assistant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    HealthAdvice,
    EmergencyInfo,
    DailyTip,
    VoiceInput,
}

/// Where a user query came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputOrigin {
    Typed,
    Voice,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: Uuid,
    pub text: String,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    pub kind: MessageKind,
    /// Id of the knowledge-base condition this answer was built from.
    pub related_condition: Option<String>,
    pub severity: Option<Severity>,
}

impl ConversationMessage {
    fn new(text: impl Into<String>, author: Author, kind: MessageKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            author,
            created_at: Utc::now(),
            kind,
            related_condition: None,
            severity: None,
        }
    }

    pub fn user(text: impl Into<String>, origin: InputOrigin) -> Self {
        let kind = match origin {
            InputOrigin::Voice => MessageKind::VoiceInput,
            InputOrigin::Typed => MessageKind::Text,
        };
        Self::new(text, Author::User, kind)
    }

    pub fn assistant(text: impl Into<String>, kind: MessageKind) -> Self {
        Self::new(text, Author::Assistant, kind)
    }

    pub fn advice(text: impl Into<String>, condition: &HealthCondition) -> Self {
        let mut message = Self::new(text, Author::Assistant, MessageKind::HealthAdvice);
        message.related_condition = Some(condition.id.clone());
        message.severity = Some(condition.severity);
        message
    }

    pub fn is_user(&self) -> bool {
        self.author == Author::User
    }
}
