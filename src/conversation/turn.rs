use crate::models::chat::{ ConversationMessage, MessageKind };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    AwaitingFirstToken,
    /// The reply lives at `slot` in the transcript.
    Accumulating {
        slot: usize,
    },
    Finalized,
}

/// Tracks one streamed model reply. The first token appends an assistant
/// message; later tokens rewrite that same message in place.
#[derive(Debug)]
pub struct StreamingTurn {
    phase: TurnPhase,
    text: String,
}

impl Default for StreamingTurn {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingTurn {
    pub fn new() -> Self {
        Self {
            phase: TurnPhase::AwaitingFirstToken,
            text: String::new(),
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn push_token(&mut self, token: &str, transcript: &mut Vec<ConversationMessage>) {
        match self.phase {
            TurnPhase::AwaitingFirstToken => {
                self.text.push_str(token);
                transcript.push(ConversationMessage::assistant(self.text.clone(), MessageKind::Text));
                self.phase = TurnPhase::Accumulating { slot: transcript.len() - 1 };
            }
            TurnPhase::Accumulating { slot } => {
                self.text.push_str(token);
                if let Some(message) = transcript.get_mut(slot) {
                    message.text.clone_from(&self.text);
                }
            }
            TurnPhase::Finalized => {}
        }
    }

    /// Closes the turn; returns the full reply, or `None` if no token arrived.
    pub fn finalize(&mut self) -> Option<String> {
        let produced = matches!(self.phase, TurnPhase::Accumulating { .. });
        self.phase = TurnPhase::Finalized;
        if produced { Some(self.text.clone()) } else { None }
    }

    /// Closes the turn with `apology`, replacing any partial reply so the
    /// turn leaves exactly one assistant message behind.
    pub fn fail(&mut self, apology: &str, transcript: &mut Vec<ConversationMessage>) {
        let replacement = ConversationMessage::assistant(apology, MessageKind::Text);
        match self.phase {
            TurnPhase::Accumulating { slot } if slot < transcript.len() => {
                transcript[slot] = replacement;
            }
            TurnPhase::Finalized => {
                return;
            }
            _ => transcript.push(replacement),
        }
        self.phase = TurnPhase::Finalized;
    }
}
