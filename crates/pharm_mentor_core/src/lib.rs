pub mod chat;
pub mod domain;
pub mod format;
pub mod image_lab;
pub mod notes;
pub mod ports;
pub mod prompt;
pub mod render;
pub mod schema;
pub mod transcript;

pub use chat::{ChatSessionManager, ChatState, PendingSend, CHAT_FALLBACK, CHAT_GREETING};
pub use domain::{
    AnswerDepth, ChatMessage, ChatRole, ClassificationEntry, ExamPoint, ImageUpload, Preferences,
    StudyNotes, Subject, SEMESTERS,
};
pub use format::{format_markdown, FormatProfile};
pub use image_lab::ImageLab;
pub use notes::{NotesDesk, LOADING_MESSAGES};
pub use ports::{
    ChatService, ChatSession, ImageAnalysisService, NoteGenerationService, PortError, PortResult,
    Rejection, TextStream,
};
pub use render::render_notes_html;
pub use transcript::{reduce, Transcript, TranscriptEvent};
