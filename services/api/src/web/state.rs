//! services/api/src/web/state.rs
//!
//! Defines the application's shared and desk-specific states.

use crate::config::Config;
use pharm_mentor_core::{
    chat::{ChatSessionManager, ChatState, CHAT_GREETING},
    domain::{Preferences, StudyNotes},
    image_lab::ImageLab,
    notes::NotesDesk,
    ports::{ChatService, ImageAnalysisService, NoteGenerationService},
    transcript::Transcript,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub notes_adapter: Arc<dyn NoteGenerationService>,
    pub vision_adapter: Arc<dyn ImageAnalysisService>,
    pub chat_adapter: Arc<dyn ChatService>,
}

//=========================================================================================
// DeskState (Specific to One WebSocket Connection)
//=========================================================================================

/// The state for a single, active WebSocket connection.
///
/// Each feature area has its own lock, so a pending chat stream never blocks
/// a notes or image request of the same desk.
#[derive(Clone)]
pub struct DeskState {
    pub desk_id: Uuid,
    pub notes: Arc<Mutex<NotesDesk>>,
    pub image_lab: Arc<Mutex<ImageLab>>,
    pub chat: Arc<Mutex<ChatSessionManager>>,
}

/// A read-only projection of a desk, sent in reply to `get_snapshot`.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DeskSnapshot {
    pub preferences: Preferences,
    pub notes_loading: bool,
    pub notes_error: Option<String>,
    pub notes: Option<StudyNotes>,
    pub image_selected: bool,
    pub analysis_loading: bool,
    pub analysis_error: Option<String>,
    pub analysis: Option<String>,
    pub chat_state: ChatState,
    pub transcript: Transcript,
}

impl DeskState {
    /// Creates a fresh desk with default preferences and a greeted chat.
    pub fn new(app_state: &AppState) -> Self {
        Self {
            desk_id: Uuid::new_v4(),
            notes: Arc::new(Mutex::new(NotesDesk::new(Preferences::default()))),
            image_lab: Arc::new(Mutex::new(ImageLab::new())),
            chat: Arc::new(Mutex::new(
                ChatSessionManager::new(app_state.chat_adapter.clone())
                    .with_greeting(CHAT_GREETING),
            )),
        }
    }

    /// Takes each feature lock in turn; no two are held together.
    pub async fn snapshot(&self) -> DeskSnapshot {
        let (preferences, notes_loading, notes_error, notes) = {
            let desk = self.notes.lock().await;
            (
                desk.preferences().clone(),
                desk.is_loading(),
                desk.error().map(str::to_string),
                desk.notes().cloned(),
            )
        };
        let (image_selected, analysis_loading, analysis_error, analysis) = {
            let lab = self.image_lab.lock().await;
            (
                lab.image().is_some(),
                lab.is_loading(),
                lab.error().map(str::to_string),
                lab.result().map(str::to_string),
            )
        };
        let (chat_state, transcript) = {
            let chat = self.chat.lock().await;
            (chat.state(), chat.transcript().clone())
        };

        DeskSnapshot {
            preferences,
            notes_loading,
            notes_error,
            notes,
            image_selected,
            analysis_loading,
            analysis_error,
            analysis,
            chat_state,
            transcript,
        }
    }
}
