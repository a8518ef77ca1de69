//! services/api/src/web/chat_task.rs
//!
//! This module contains the asynchronous "worker" function responsible for
//! one chat exchange: sending the user turn and streaming the reply back.

use crate::web::protocol::{emit, rejected, EventSender, Feature, ServerMessage};
use futures::StreamExt;
use pharm_mentor_core::{
    chat::{ChatSessionManager, CHAT_FALLBACK},
    format::{format_markdown, FormatProfile},
    ports::PortError,
};
use std::{sync::Arc, time::Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Represents the outcome of the `chat_process` task.
#[derive(Debug, PartialEq, Eq)]
pub enum ChatOutcome {
    Completed,
    /// The pending assistant turn was replaced by the fallback text.
    Failed,
    Rejected,
}

/// Sends `text` and streams the reply into the transcript.
///
/// The manager lock is held for each state transition only, never while
/// waiting on the remote service.
pub async fn chat_process(
    chat: Arc<Mutex<ChatSessionManager>>,
    text: String,
    events: EventSender,
) -> ChatOutcome {
    let begun = {
        let mut manager = chat.lock().await;
        let begun = manager.begin_send(&text);
        begun.map(|pending| (pending, manager.transcript().clone()))
    };
    let (pending, transcript) = match begun {
        Ok(begun) => begun,
        Err(rejection) => {
            info!("Chat send refused: {}", rejection);
            emit(&events, rejected(Feature::Chat, &rejection));
            return ChatOutcome::Rejected;
        }
    };
    emit(&events, ServerMessage::ChatTurnStarted { transcript });

    let start_time = Instant::now();
    let mut stream = match pending.session.send_message_stream(&pending.message).await {
        Ok(stream) => stream,
        Err(e) => return fail_turn(&chat, &events, e).await,
    };

    let mut chunks = 0usize;
    while let Some(item) = stream.next().await {
        match item {
            Ok(chunk) => {
                let accumulated = chat.lock().await.apply_chunk(&chunk).map(str::to_string);
                if let Some(text) = accumulated {
                    chunks += 1;
                    let html = format_markdown(&text, FormatProfile::Chat);
                    emit(&events, ServerMessage::ChatDelta { text, html });
                }
            }
            Err(e) => return fail_turn(&chat, &events, e).await,
        }
    }

    let transcript = {
        let mut manager = chat.lock().await;
        manager.complete();
        manager.transcript().clone()
    };
    info!(
        "⏱️ Chat reply streamed in {} chunks, took: {:?}",
        chunks,
        start_time.elapsed()
    );
    emit(&events, ServerMessage::ChatCompleted { transcript });
    ChatOutcome::Completed
}

async fn fail_turn(
    chat: &Mutex<ChatSessionManager>,
    events: &EventSender,
    error: PortError,
) -> ChatOutcome {
    warn!("Chat exchange failed: {}", error);
    let transcript = {
        let mut manager = chat.lock().await;
        manager.fail();
        manager.transcript().clone()
    };
    emit(
        events,
        ServerMessage::ChatFailed {
            message: CHAT_FALLBACK.to_string(),
            transcript,
        },
    );
    ChatOutcome::Failed
}

/// Drops the chat session. Refused while a reply is still streaming.
pub async fn reset_chat(chat: &Mutex<ChatSessionManager>, events: &EventSender) {
    let mut manager = chat.lock().await;
    match manager.dispose() {
        Ok(()) => {
            info!("Chat session reset.");
            emit(
                events,
                ServerMessage::ChatReset {
                    transcript: manager.transcript().clone(),
                },
            );
        }
        Err(rejection) => emit(events, rejected(Feature::Chat, &rejection)),
    }
}
