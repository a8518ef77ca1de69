//! crates/pharm_mentor_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the generative-AI provider behind them.

use crate::domain::{ImageUpload, Preferences, StudyNotes};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;

//=========================================================================================
// Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from the remote AI service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("The AI service request failed: {0}")]
    Service(String),
    #[error("The AI service returned an unusable response: {0}")]
    MalformedResponse(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Reasons a user action is refused before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("Please enter a topic name.")]
    EmptyTopic,
    #[error("Please type a message first.")]
    EmptyMessage,
    #[error("Please select an image to analyze.")]
    NoImage,
    #[error("Unsupported file type '{0}'. Please upload an image.")]
    UnsupportedMediaType(String),
    #[error("A request is already in progress.")]
    Busy,
}

/// A lazy, finite, forward-only sequence of text fragments.
pub type TextStream = Pin<Box<dyn Stream<Item = PortResult<String>> + Send>>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait NoteGenerationService: Send + Sync {
    /// Generates a complete structured notes document for the given preferences.
    async fn generate_study_notes(&self, preferences: &Preferences) -> PortResult<StudyNotes>;
}

#[async_trait]
pub trait ImageAnalysisService: Send + Sync {
    /// Identifies and describes what is visible in the image, as lightly formatted text.
    async fn analyze_image(&self, image: &ImageUpload) -> PortResult<String>;
}

/// Creates conversational sessions with the text-generation service.
pub trait ChatService: Send + Sync {
    fn start_session(&self) -> Arc<dyn ChatSession>;
}

/// An opaque handle to one stateful conversation.
#[async_trait]
pub trait ChatSession: Send + Sync {
    /// Sends one user turn and returns the reply as a stream of chunks.
    async fn send_message_stream(&self, message: &str) -> PortResult<TextStream>;
}
