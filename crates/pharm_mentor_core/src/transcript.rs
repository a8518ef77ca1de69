//! crates/pharm_mentor_core/src/transcript.rs
//!
//! The chat transcript as an immutable value advanced by a pure reducer.

use crate::domain::{ChatMessage, ChatRole};
use serde::Serialize;

/// Events that advance a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// The user sent a message: append it, then an empty assistant placeholder.
    UserTurn(String),
    /// The accumulated assistant reply so far replaces the last assistant entry.
    AssistantText(String),
}

/// An append-only, ordered sequence of chat turns.
///
/// Every reduction produces a new value and leaves the old one untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

/// Applies one event to a transcript, returning the new transcript.
///
/// `AssistantText` only ever targets the last entry, and only if that entry
/// is an assistant turn; otherwise the transcript is returned unchanged.
pub fn reduce(transcript: &Transcript, event: TranscriptEvent) -> Transcript {
    match event {
        TranscriptEvent::UserTurn(text) => {
            let mut messages = Vec::with_capacity(transcript.len() + 2);
            messages.extend_from_slice(transcript.messages());
            messages.push(ChatMessage::user(text));
            messages.push(ChatMessage::assistant(String::new()));
            Transcript::from_messages(messages)
        }
        TranscriptEvent::AssistantText(text) => match transcript.last() {
            Some(last) if last.role == ChatRole::Assistant => {
                let mut messages = transcript.messages().to_vec();
                if let Some(entry) = messages.last_mut() {
                    entry.text = text;
                }
                Transcript::from_messages(messages)
            }
            _ => transcript.clone(),
        },
    }
}
