//! In-memory port fakes shared by the web layer's tests.

use crate::{
    config::Config,
    web::{protocol::ServerMessage, state::AppState},
};
use async_trait::async_trait;
use pharm_mentor_core::{
    domain::{ExamPoint, ImageUpload, Preferences, StudyNotes},
    ports::{
        ChatService, ChatSession, ImageAnalysisService, NoteGenerationService, PortError,
        PortResult, TextStream,
    },
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::sync::mpsc;

pub fn sample_notes() -> StudyNotes {
    StudyNotes {
        introduction: "Tablets are solid unit dosage forms.".to_string(),
        definition: Some("A compressed solid dosage form.".to_string()),
        classification: None,
        detailed_explanation: vec!["Granulation precedes compression.".to_string()],
        examples: vec!["Paracetamol tablets".to_string()],
        diagram_description: None,
        exam_points: vec![ExamPoint {
            point: "Know the evaluation tests.".to_string(),
            mnemonic: Some("HDFW".to_string()),
        }],
        short_answer_questions: vec!["Define friability.".to_string()],
        long_answer_questions: vec!["Describe wet granulation.".to_string()],
        pyqs: vec!["Write a note on disintegrants.".to_string()],
        viva_questions: vec!["What is capping?".to_string()],
        clinical_correlation: None,
    }
}

pub struct FakeNotes {
    pub calls: AtomicUsize,
    outcome: PortResult<StudyNotes>,
}

impl FakeNotes {
    pub fn returning(outcome: PortResult<StudyNotes>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            outcome,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NoteGenerationService for FakeNotes {
    async fn generate_study_notes(&self, _preferences: &Preferences) -> PortResult<StudyNotes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

pub struct FakeVision {
    pub calls: AtomicUsize,
    outcome: PortResult<String>,
}

impl FakeVision {
    pub fn returning(outcome: PortResult<String>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            outcome,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageAnalysisService for FakeVision {
    async fn analyze_image(&self, _image: &ImageUpload) -> PortResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// Every session replays the same scripted chunks for every message.
pub struct FakeChat {
    pub sessions: AtomicUsize,
    script: Vec<PortResult<String>>,
}

impl FakeChat {
    pub fn scripted(script: Vec<PortResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            sessions: AtomicUsize::new(0),
            script,
        })
    }

    pub fn sessions(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }
}

impl ChatService for FakeChat {
    fn start_session(&self) -> Arc<dyn ChatSession> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        Arc::new(FakeChatSession {
            script: self.script.clone(),
        })
    }
}

struct FakeChatSession {
    script: Vec<PortResult<String>>,
}

#[async_trait]
impl ChatSession for FakeChatSession {
    async fn send_message_stream(&self, _message: &str) -> PortResult<TextStream> {
        if self.script.is_empty() {
            return Err(PortError::Service("connection refused".to_string()));
        }
        Ok(Box::pin(futures::stream::iter(self.script.clone())))
    }
}

pub fn test_config() -> Arc<Config> {
    let config = Config::from_lookup(|key| match key {
        "GEMINI_API_KEY" => Some("test-key".to_string()),
        "MAX_IMAGE_BYTES" => Some("1024".to_string()),
        _ => None,
    })
    .unwrap();
    Arc::new(config)
}

pub fn app_state(
    notes: Arc<FakeNotes>,
    vision: Arc<FakeVision>,
    chat: Arc<FakeChat>,
) -> Arc<AppState> {
    Arc::new(AppState {
        config: test_config(),
        notes_adapter: notes,
        vision_adapter: vision,
        chat_adapter: chat,
    })
}

/// App state whose fakes all succeed.
pub fn default_app_state() -> Arc<AppState> {
    app_state(
        FakeNotes::returning(Ok(sample_notes())),
        FakeVision::returning(Ok("# Identification\nA **burette**.".to_string())),
        FakeChat::scripted(vec![Ok("Hel".to_string()), Ok("lo".to_string())]),
    )
}

/// Collects everything queued so far without waiting.
pub fn drain(events: &mut mpsc::UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
    let mut out = Vec::new();
    while let Ok(message) = events.try_recv() {
        out.push(message);
    }
    out
}
