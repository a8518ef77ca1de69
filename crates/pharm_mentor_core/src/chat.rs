//! crates/pharm_mentor_core/src/chat.rs
//!
//! The chat session manager: owns the lazily created session handle and the
//! transcript, and enforces that only one send is unresolved at a time.

use crate::domain::ChatMessage;
use crate::ports::{ChatService, ChatSession, Rejection};
use crate::transcript::{reduce, Transcript, TranscriptEvent};
use serde::Serialize;
use std::sync::Arc;

pub const CHAT_GREETING: &str =
    "Hello! I'm your PharmAssistant. How can I help with your B.Pharm studies today?";

/// Replaces the pending assistant turn when a request or stream fails.
pub const CHAT_FALLBACK: &str =
    "I'm having trouble connecting right now. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatState {
    NoSession,
    Idle,
    AwaitingResponse,
    Streaming,
    ErrorRecovered,
}

/// Everything the caller needs to perform the remote part of one send.
pub struct PendingSend {
    pub session: Arc<dyn ChatSession>,
    pub message: String,
}

pub struct ChatSessionManager {
    service: Arc<dyn ChatService>,
    session: Option<Arc<dyn ChatSession>>,
    greeting: Option<String>,
    transcript: Transcript,
    state: ChatState,
    accumulator: String,
}

impl ChatSessionManager {
    pub fn new(service: Arc<dyn ChatService>) -> Self {
        Self {
            service,
            session: None,
            greeting: None,
            transcript: Transcript::new(),
            state: ChatState::NoSession,
            accumulator: String::new(),
        }
    }

    /// Seeds the transcript with an assistant greeting.
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        let greeting = greeting.into();
        self.transcript = Transcript::from_messages(vec![ChatMessage::assistant(greeting.clone())]);
        self.greeting = Some(greeting);
        self
    }

    pub fn state(&self) -> ChatState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// True while a send is unresolved.
    pub fn is_busy(&self) -> bool {
        matches!(self.state, ChatState::AwaitingResponse | ChatState::Streaming)
    }

    /// Starts a send: validates, creates the session on first use and appends
    /// the user turn followed by an empty assistant placeholder.
    pub fn begin_send(&mut self, text: &str) -> Result<PendingSend, Rejection> {
        if self.is_busy() {
            return Err(Rejection::Busy);
        }
        if text.trim().is_empty() {
            return Err(Rejection::EmptyMessage);
        }

        let service = &self.service;
        let session = self
            .session
            .get_or_insert_with(|| service.start_session())
            .clone();

        self.transcript = reduce(&self.transcript, TranscriptEvent::UserTurn(text.to_string()));
        self.accumulator.clear();
        self.state = ChatState::AwaitingResponse;

        Ok(PendingSend {
            session,
            message: text.to_string(),
        })
    }

    /// Appends a streamed chunk and returns the accumulated reply so far.
    ///
    /// Chunks arriving when no send is in flight are ignored.
    pub fn apply_chunk(&mut self, chunk: &str) -> Option<&str> {
        if !self.is_busy() {
            return None;
        }
        self.state = ChatState::Streaming;
        self.accumulator.push_str(chunk);
        self.transcript = reduce(
            &self.transcript,
            TranscriptEvent::AssistantText(self.accumulator.clone()),
        );
        Some(&self.accumulator)
    }

    /// Marks the stream as exhausted.
    pub fn complete(&mut self) {
        if self.is_busy() {
            self.state = ChatState::Idle;
            self.accumulator.clear();
        }
    }

    /// Resolves the pending assistant turn to the fallback text and returns
    /// to idle.
    pub fn fail(&mut self) {
        if !self.is_busy() {
            return;
        }
        self.state = ChatState::ErrorRecovered;
        self.transcript = reduce(
            &self.transcript,
            TranscriptEvent::AssistantText(CHAT_FALLBACK.to_string()),
        );
        self.accumulator.clear();
        self.state = ChatState::Idle;
    }

    /// Drops the session handle and restarts the transcript. The next send
    /// creates a fresh session.
    pub fn dispose(&mut self) -> Result<(), Rejection> {
        if self.is_busy() {
            return Err(Rejection::Busy);
        }
        self.session = None;
        self.transcript = match &self.greeting {
            Some(greeting) => Transcript::from_messages(vec![ChatMessage::assistant(greeting.clone())]),
            None => Transcript::new(),
        };
        self.state = ChatState::NoSession;
        Ok(())
    }
}
