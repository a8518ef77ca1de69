//! crates/pharm_mentor_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! The serde representation matches what the browser client and the
//! generation service exchange (camelCase keys, display labels for enums).

use crate::ports::Rejection;
use serde::{Deserialize, Serialize};
use std::fmt;

//=========================================================================================
// Catalogs
//=========================================================================================

/// First-year B.Pharm subjects the notes generator is tuned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    #[serde(rename = "Human Anatomy & Physiology")]
    HumanAnatomyPhysiology,
    #[serde(rename = "Pharmaceutical Analysis")]
    PharmaceuticalAnalysis,
    #[serde(rename = "Pharmaceutics")]
    Pharmaceutics,
    #[serde(rename = "Pharmaceutical Inorganic Chemistry")]
    InorganicChemistry,
    #[serde(rename = "Communication Skills")]
    CommunicationSkills,
    #[serde(rename = "Remedial Biology")]
    RemedialBiology,
    #[serde(rename = "Remedial Mathematics")]
    RemedialMathematics,
}

impl Subject {
    pub const ALL: [Subject; 7] = [
        Subject::HumanAnatomyPhysiology,
        Subject::PharmaceuticalAnalysis,
        Subject::Pharmaceutics,
        Subject::InorganicChemistry,
        Subject::CommunicationSkills,
        Subject::RemedialBiology,
        Subject::RemedialMathematics,
    ];

    /// The human-readable label, identical to the serialized form.
    pub fn label(&self) -> &'static str {
        match self {
            Subject::HumanAnatomyPhysiology => "Human Anatomy & Physiology",
            Subject::PharmaceuticalAnalysis => "Pharmaceutical Analysis",
            Subject::Pharmaceutics => "Pharmaceutics",
            Subject::InorganicChemistry => "Pharmaceutical Inorganic Chemistry",
            Subject::CommunicationSkills => "Communication Skills",
            Subject::RemedialBiology => "Remedial Biology",
            Subject::RemedialMathematics => "Remedial Mathematics",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How much depth the generated notes should go into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerDepth {
    #[serde(rename = "Quick Revision")]
    Quick,
    #[serde(rename = "Exam Notes")]
    Exam,
    #[serde(rename = "Detailed Explanation")]
    Detailed,
}

impl AnswerDepth {
    pub const ALL: [AnswerDepth; 3] = [AnswerDepth::Quick, AnswerDepth::Exam, AnswerDepth::Detailed];

    pub fn label(&self) -> &'static str {
        match self {
            AnswerDepth::Quick => "Quick Revision",
            AnswerDepth::Exam => "Exam Notes",
            AnswerDepth::Detailed => "Detailed Explanation",
        }
    }

    /// A short directive describing the expected length of each section.
    pub fn guidance(&self) -> &'static str {
        match self {
            AnswerDepth::Quick => {
                "Keep every section brief: crisp one-line points suitable for last-minute revision."
            }
            AnswerDepth::Exam => {
                "Write at the depth expected in university theory exams: clear, structured points worth full marks."
            }
            AnswerDepth::Detailed => {
                "Explain thoroughly, covering mechanisms and reasoning in depth while staying within the first-year syllabus."
            }
        }
    }
}

impl fmt::Display for AnswerDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub const SEMESTERS: [&str; 2] = ["Semester 1", "Semester 2"];

//=========================================================================================
// Preferences
//=========================================================================================

/// The user's current note-generation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub subject: Subject,
    pub topic: String,
    pub semester: String,
    #[serde(default)]
    pub university: Option<String>,
    #[serde(alias = "length")]
    pub depth: AnswerDepth,
    pub include_diagrams: bool,
    pub include_mnemonics: bool,
    pub include_clinical_correlation: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            subject: Subject::HumanAnatomyPhysiology,
            topic: String::new(),
            semester: SEMESTERS[0].to_string(),
            university: None,
            depth: AnswerDepth::Exam,
            include_diagrams: true,
            include_mnemonics: true,
            include_clinical_correlation: true,
        }
    }
}

impl Preferences {
    /// The trimmed topic, or `None` when it is blank.
    pub fn topic(&self) -> Option<&str> {
        Some(self.topic.trim()).filter(|t| !t.is_empty())
    }

    /// The trimmed university name; a blank entry counts as absent.
    pub fn university(&self) -> Option<&str> {
        self.university
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    /// Checks the invariant that must hold before a notes request is issued.
    pub fn validate(&self) -> Result<(), Rejection> {
        match self.topic() {
            Some(_) => Ok(()),
            None => Err(Rejection::EmptyTopic),
        }
    }
}

//=========================================================================================
// Study Notes
//=========================================================================================

/// One entry of the optional "Classification / Types" section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub explanation: String,
}

/// A single exam focus point, optionally paired with a memory aid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamPoint {
    pub point: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<String>,
}

/// The structured notes document produced by one generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyNotes {
    pub introduction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Vec<ClassificationEntry>>,
    pub detailed_explanation: Vec<String>,
    pub examples: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagram_description: Option<String>,
    pub exam_points: Vec<ExamPoint>,
    pub short_answer_questions: Vec<String>,
    pub long_answer_questions: Vec<String>,
    pub pyqs: Vec<String>,
    pub viva_questions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_correlation: Option<String>,
}

//=========================================================================================
// Images
//=========================================================================================

/// An uploaded image, as raw bytes plus its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub media_type: String,
    pub data: Vec<u8>,
}

impl ImageUpload {
    /// Creates an upload, refusing anything that is not an `image/*` payload.
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Result<Self, Rejection> {
        let media_type = media_type.into().trim().to_ascii_lowercase();
        let is_image = media_type
            .strip_prefix("image/")
            .is_some_and(|sub| !sub.is_empty());
        if !is_image {
            return Err(Rejection::UnsupportedMediaType(media_type));
        }
        if data.is_empty() {
            return Err(Rejection::NoImage);
        }
        Ok(Self { media_type, data })
    }
}

//=========================================================================================
// Chat
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of the chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }
}
