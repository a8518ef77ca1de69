//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the API server
//! for the study desk: notes, the image lab and the chat assistant.

use crate::web::state::DeskSnapshot;
use base64::{engine::general_purpose::STANDARD, Engine};
use pharm_mentor_core::{
    domain::{ImageUpload, Preferences, StudyNotes},
    ports::Rejection,
    transcript::Transcript,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Asks for the current note preferences.
    GetPreferences,

    /// Replaces the note preferences. Refused while notes are being generated.
    UpdatePreferences { preferences: Preferences },

    /// Generates notes for the current preferences.
    GenerateNotes,

    /// Selects an image for the lab, as a browser `data:` URL.
    SelectImage { data_url: String },

    /// Analyzes the selected image.
    AnalyzeImage,

    /// Sends one chat message. The reply is streamed back as `chat_delta` messages.
    SendChat { text: String },

    /// Drops the chat session and restarts the transcript.
    ResetChat,

    /// Asks for a read-only projection of the whole desk.
    GetSnapshot,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// The feature area a message refers to.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Notes,
    Image,
    Chat,
}

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once when the connection opens.
    Connected {
        desk_id: Uuid,
        preferences: Preferences,
        transcript: Transcript,
    },

    Preferences { preferences: Preferences },

    /// Notes generation has started; previous notes are discarded.
    NotesStarted,

    /// A rotating status line while notes are being generated.
    NotesProgress { message: String },

    /// The notes, together with their rendered HTML document.
    NotesReady { notes: StudyNotes, html: String },

    NotesFailed { message: String },

    /// A new image is selected; any previous analysis is cleared.
    ImageSelected { media_type: String, size: usize },

    AnalysisStarted,

    AnalysisReady { text: String, html: String },

    AnalysisFailed { message: String },

    /// The user turn and an empty assistant placeholder were appended.
    ChatTurnStarted { transcript: Transcript },

    /// The accumulated assistant reply so far.
    ChatDelta { text: String, html: String },

    ChatCompleted { transcript: Transcript },

    /// The pending assistant turn was replaced by the fallback text.
    ChatFailed { message: String, transcript: Transcript },

    ChatReset { transcript: Transcript },

    /// A user action was refused before any request was sent.
    Rejected { feature: Feature, message: String },

    Snapshot { snapshot: DeskSnapshot },

    /// Reports a protocol error (e.g. an undecodable message).
    Error { message: String },
}

/// The channel every task of a desk uses to reach the socket writer.
pub type EventSender = mpsc::UnboundedSender<ServerMessage>;

/// Queues a message for the socket writer. A closed channel means the desk is gone.
pub fn emit(events: &EventSender, message: ServerMessage) {
    if events.send(message).is_err() {
        debug!("Desk writer has closed; dropping an event.");
    }
}

/// Builds a `Rejected` message from a core rejection.
pub fn rejected(feature: Feature, rejection: &Rejection) -> ServerMessage {
    ServerMessage::Rejected {
        feature,
        message: rejection.to_string(),
    }
}

//=========================================================================================
// Image Data URLs
//=========================================================================================

/// Reasons a `select_image` payload cannot be turned into an upload.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DataUrlError {
    #[error("The image must be sent as a base64 data URL.")]
    Malformed,
    #[error("The image is larger than the {0} byte limit.")]
    TooLarge(usize),
    #[error(transparent)]
    Rejected(#[from] Rejection),
}

/// Decodes `data:<media type>;base64,<payload>` into an `ImageUpload`.
pub fn decode_data_url(data_url: &str, max_bytes: usize) -> Result<ImageUpload, DataUrlError> {
    let rest = data_url
        .trim()
        .strip_prefix("data:")
        .ok_or(DataUrlError::Malformed)?;
    let (header, payload) = rest.split_once(',').ok_or(DataUrlError::Malformed)?;
    let params = header
        .strip_suffix(";base64")
        .ok_or(DataUrlError::Malformed)?;
    // Parameters such as `name=` or `charset=` follow the media type.
    let media_type = params.split_once(';').map_or(params, |(media_type, _)| media_type);

    // Four base64 characters carry three bytes.
    if payload.len() / 4 * 3 > max_bytes + 2 {
        return Err(DataUrlError::TooLarge(max_bytes));
    }
    let data = STANDARD
        .decode(payload)
        .map_err(|_| DataUrlError::Malformed)?;
    if data.len() > max_bytes {
        return Err(DataUrlError::TooLarge(max_bytes));
    }

    Ok(ImageUpload::new(media_type, data)?)
}
