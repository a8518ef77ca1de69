//! services/api/src/adapters/chat_llm.rs
//!
//! This module contains the adapter for the conversational assistant.
//! It implements the `ChatService` and `ChatSession` ports from the `core` crate.
//!
//! Chat completions are stateless on the wire, so each session keeps its own
//! history and replays it with every turn.

const CHAT_INSTRUCTIONS: &str = r#"You are PharmAssistant, a friendly academic tutor for first-year B.Pharm students following the PCI syllabus (Human Anatomy & Physiology, Pharmaceutical Analysis, Pharmaceutics, Pharmaceutical Inorganic Chemistry, Communication Skills, Remedial Biology and Remedial Mathematics).

Style:
- Answer clearly and accurately at an undergraduate level.
- Structure longer answers with '#' headers, '-' bullets or numbered lists, and **bold** key terms.
- Use exam-oriented phrasing and mention mnemonics where they help.
- Keep answers focused; offer to go deeper instead of writing essays.
- If a question is outside pharmacy studies, answer briefly and steer back to the syllabus."#;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use futures::StreamExt;
use pharm_mentor_core::ports::{ChatService, ChatSession, PortError, PortResult, TextStream};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

//=========================================================================================
// The Session Factory
//=========================================================================================

/// An adapter that implements `ChatService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiChatAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiChatAdapter {
    /// Creates a new `OpenAiChatAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

impl ChatService for OpenAiChatAdapter {
    fn start_session(&self) -> Arc<dyn ChatSession> {
        info!("Starting a new chat session on model {}", self.model);
        Arc::new(OpenAiChatSession {
            client: self.client.clone(),
            model: self.model.clone(),
            history: Arc::new(Mutex::new(Vec::new())),
        })
    }
}

//=========================================================================================
// The Session Handle
//=========================================================================================

/// One conversation. `history` holds completed user/assistant turns only.
pub struct OpenAiChatSession {
    client: Client<OpenAIConfig>,
    model: String,
    history: Arc<Mutex<Vec<ChatCompletionRequestMessage>>>,
}

impl OpenAiChatSession {
    fn system_message() -> Result<ChatCompletionRequestMessage, OpenAIError> {
        Ok(ChatCompletionRequestSystemMessageArgs::default()
            .content(CHAT_INSTRUCTIONS)
            .build()?
            .into())
    }
}

#[async_trait]
impl ChatSession for OpenAiChatSession {
    /// Sends one user turn with the full history and streams back the reply.
    ///
    /// The user turn is only kept in the history if the reply streams to the end.
    async fn send_message_stream(&self, message: &str) -> PortResult<TextStream> {
        let user_turn: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
            .content(message)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into();

        let messages = {
            let history = self.history.lock().await;
            let mut messages = Vec::with_capacity(history.len() + 2);
            messages.push(Self::system_message().map_err(|e| PortError::Unexpected(e.to_string()))?);
            messages.extend(history.iter().cloned());
            messages.push(user_turn.clone());
            messages
        };

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let mut upstream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e: OpenAIError| PortError::Service(e.to_string()))?;

        let history = self.history.clone();
        let stream = async_stream::stream! {
            let mut reply = String::new();
            let mut failed = false;

            while let Some(item) = upstream.next().await {
                match item {
                    Ok(response) => {
                        let chunk: String = response
                            .choices
                            .into_iter()
                            .filter_map(|choice| choice.delta.content)
                            .collect();
                        if chunk.is_empty() {
                            continue;
                        }
                        reply.push_str(&chunk);
                        yield Ok(chunk);
                    }
                    Err(e) => {
                        warn!("Chat stream failed after {} bytes: {}", reply.len(), e);
                        failed = true;
                        yield Err(PortError::Service(e.to_string()));
                        break;
                    }
                }
            }

            if !failed {
                match ChatCompletionRequestAssistantMessageArgs::default()
                    .content(reply)
                    .build()
                {
                    Ok(assistant_turn) => {
                        let mut history = history.lock().await;
                        history.push(user_turn);
                        history.push(assistant_turn.into());
                    }
                    Err(e) => warn!("Could not record the assistant turn: {}", e),
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
