//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a WebSocket connection.
//! Each connection owns one desk; every long-running operation is delegated to
//! its own task, and all tasks report back through a single writer.

use crate::web::{
    chat_task::{chat_process, reset_chat},
    image_task::{analysis_process, select_image},
    notes_task::notes_process,
    protocol::{emit, rejected, ClientMessage, EventSender, Feature, ServerMessage},
    state::{AppState, DeskState},
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::{sync::Arc, time::Duration};
use tokio::{sync::mpsc, task::JoinSet, time::timeout};
use tracing::{debug, error, info, info_span, warn, Instrument};

/// How long queued events may take to reach the client once the desk closes.
const WRITER_FLUSH: Duration = Duration::from_secs(1);

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.max_message_size(max_message_size(app_state.config.max_image_bytes))
        .on_upgrade(move |socket| handle_socket(socket, app_state))
}

/// Largest client frame the socket accepts.
///
/// Twice the encoded size of a maximal image, so an image somewhat over the
/// limit still reaches the desk and is refused with a `rejected` event
/// instead of failing the socket read.
pub(crate) fn max_message_size(max_image_bytes: usize) -> usize {
    // A data URL is about a third larger than the image it carries.
    let encoded = max_image_bytes.div_ceil(3) * 4;
    encoded * 2 + 1024
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let desk = DeskState::new(&app_state);
    let span = info_span!("desk", desk_id = %desk.desk_id);
    run_desk(socket, app_state, desk).instrument(span).await
}

async fn run_desk(socket: WebSocket, app_state: Arc<AppState>, desk: DeskState) {
    info!("New WebSocket connection established.");

    let (mut sender, mut receiver) = socket.split();
    let (events, mut outbox) = mpsc::unbounded_channel::<ServerMessage>();

    // --- 1. Writer Task ---
    // The only owner of the socket's sending half.
    let mut writer = tokio::spawn(
        async move {
            while let Some(message) = outbox.recv().await {
                let json = match serde_json::to_string(&message) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize server message: {}", e);
                        continue;
                    }
                };
                if sender.send(Message::Text(json.into())).await.is_err() {
                    warn!("Failed to send message. Client may have disconnected.");
                    break;
                }
            }
        }
        .in_current_span(),
    );

    let (preferences, transcript) = {
        let preferences = desk.notes.lock().await.preferences().clone();
        let transcript = desk.chat.lock().await.transcript().clone();
        (preferences, transcript)
    };
    emit(
        &events,
        ServerMessage::Connected {
            desk_id: desk.desk_id,
            preferences,
            transcript,
        },
    );

    // --- 2. Main Message Loop ---
    let mut tasks = JoinSet::new();
    while let Some(received) = receiver.next().await {
        let msg = match received {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Failed to read from WebSocket: {}", e);
                emit(
                    &events,
                    ServerMessage::Error {
                        message: format!("The connection failed: {}", e),
                    },
                );
                break;
            }
        };
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(client_msg) => {
                    handle_client_message(client_msg, &app_state, &desk, &events, &mut tasks).await
                }
                Err(e) => {
                    warn!("Failed to deserialize client message: {}", e);
                    emit(
                        &events,
                        ServerMessage::Error {
                            message: format!("Unrecognized message: {}", e),
                        },
                    );
                }
            },
            Message::Close(_) => {
                info!("Client sent close message.");
                break;
            }
            _ => {}
        }

        // Reap finished tasks so the set does not grow for the life of the desk.
        while let Some(finished) = tasks.try_join_next() {
            if let Err(e) = finished {
                error!("Desk task ended abnormally: {}", e);
            }
        }
    }

    // --- 3. Cleanup ---
    // The writer ends once every sender is gone, after flushing what is queued.
    tasks.abort_all();
    drop(events);
    if timeout(WRITER_FLUSH, &mut writer).await.is_err() {
        warn!("Writer did not finish flushing; dropping queued events.");
        writer.abort();
    }
    info!("WebSocket connection closed.");
}

/// Dispatches one client message. Requests that wait on the remote service
/// are spawned onto `tasks`; quick state changes are handled inline.
async fn handle_client_message(
    client_msg: ClientMessage,
    app_state: &Arc<AppState>,
    desk: &DeskState,
    events: &EventSender,
    tasks: &mut JoinSet<()>,
) {
    match client_msg {
        ClientMessage::GetPreferences => {
            let preferences = desk.notes.lock().await.preferences().clone();
            emit(events, ServerMessage::Preferences { preferences });
        }
        ClientMessage::UpdatePreferences { preferences } => {
            let mut notes = desk.notes.lock().await;
            match notes.set_preferences(preferences) {
                Ok(()) => emit(
                    events,
                    ServerMessage::Preferences {
                        preferences: notes.preferences().clone(),
                    },
                ),
                Err(rejection) => emit(events, rejected(Feature::Notes, &rejection)),
            }
        }
        ClientMessage::GenerateNotes => {
            info!("GenerateNotes message received.");
            let (app_state, notes, events) =
                (app_state.clone(), desk.notes.clone(), events.clone());
            tasks.spawn(
                async move {
                    let outcome = notes_process(app_state, notes, events).await;
                    debug!("Notes task finished: {:?}", outcome);
                }
                .in_current_span(),
            );
        }
        ClientMessage::SelectImage { data_url } => {
            select_image(app_state, &desk.image_lab, &data_url, events).await;
        }
        ClientMessage::AnalyzeImage => {
            info!("AnalyzeImage message received.");
            let (app_state, image_lab, events) =
                (app_state.clone(), desk.image_lab.clone(), events.clone());
            tasks.spawn(
                async move {
                    let outcome = analysis_process(app_state, image_lab, events).await;
                    debug!("Analysis task finished: {:?}", outcome);
                }
                .in_current_span(),
            );
        }
        ClientMessage::SendChat { text } => {
            let (chat, events) = (desk.chat.clone(), events.clone());
            tasks.spawn(
                async move {
                    let outcome = chat_process(chat, text, events).await;
                    debug!("Chat task finished: {:?}", outcome);
                }
                .in_current_span(),
            );
        }
        ClientMessage::ResetChat => reset_chat(&desk.chat, events).await,
        ClientMessage::GetSnapshot => {
            let snapshot = desk.snapshot().await;
            emit(events, ServerMessage::Snapshot { snapshot });
        }
    }
}
