//! services/api/src/adapters/notes_llm.rs
//!
//! This module contains the adapter for the Note-Generating LLM.
//! It implements the `NoteGenerationService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, ResponseFormat,
        ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use pharm_mentor_core::{
    domain::{Preferences, StudyNotes},
    ports::{NoteGenerationService, PortError, PortResult},
    prompt::{build_notes_instruction, NOTES_SYSTEM_INSTRUCTIONS},
    schema::{parse_study_notes, study_notes_schema, STUDY_NOTES_SCHEMA_NAME},
};
use tracing::{debug, info};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `NoteGenerationService` using an OpenAI-compatible LLM
/// with structured (JSON schema) output.
#[derive(Clone)]
pub struct OpenAiNotesAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiNotesAdapter {
    /// Creates a new `OpenAiNotesAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Builds the single request sent for one set of preferences.
    fn build_request(
        &self,
        preferences: &Preferences,
    ) -> Result<CreateChatCompletionRequest, OpenAIError> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(NOTES_SYSTEM_INSTRUCTIONS)
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(build_notes_instruction(preferences))
                .build()?
                .into(),
        ];

        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    description: Some("Exam-oriented B.Pharm study notes".to_string()),
                    name: STUDY_NOTES_SCHEMA_NAME.to_string(),
                    schema: Some(study_notes_schema()),
                    strict: Some(true),
                },
            })
            .build()
    }
}

//=========================================================================================
// `NoteGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl NoteGenerationService for OpenAiNotesAdapter {
    /// Requests notes in the `StudyNotes` schema and parses the first choice.
    async fn generate_study_notes(&self, preferences: &Preferences) -> PortResult<StudyNotes> {
        let request = self
            .build_request(preferences)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        info!(
            "Requesting notes on '{}' ({}, {})",
            preferences.topic.trim(),
            preferences.subject,
            preferences.depth
        );

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Service(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::MalformedResponse(
                    "Note generation LLM response contained no text content.".to_string(),
                )
            })?;

        debug!("Raw notes response: {} bytes", content.len());
        parse_study_notes(&content)
    }
}
