//! crates/pharm_mentor_core/src/notes.rs
//!
//! The notes feature area: the user's preferences, the loading flag, the last
//! error and the current notes document.

use crate::domain::{Preferences, StudyNotes};
use crate::ports::{PortResult, Rejection};

/// Status lines shown in rotation while a notes request is pending.
pub const LOADING_MESSAGES: [&str; 6] = [
    "Checking PCI syllabus guidelines...",
    "Reviewing past university questions...",
    "Formatting exam-ready points...",
    "Creating simple mnemonics...",
    "Generating viva questions...",
    "Structuring long-answer responses...",
];

const GENERIC_NOTES_ERROR: &str = "A technical error occurred while generating notes.";

/// State owned by the notes feature.
///
/// Transitions are synchronous; the caller performs the remote request
/// between `begin` and `finish` without holding any lock.
#[derive(Debug, Default)]
pub struct NotesDesk {
    preferences: Preferences,
    loading: bool,
    error: Option<String>,
    notes: Option<StudyNotes>,
}

impl NotesDesk {
    pub fn new(preferences: Preferences) -> Self {
        Self {
            preferences,
            ..Self::default()
        }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn notes(&self) -> Option<&StudyNotes> {
        self.notes.as_ref()
    }

    /// Replaces the preferences. Refused while a request is in flight so the
    /// pending request and the displayed form never disagree.
    pub fn set_preferences(&mut self, preferences: Preferences) -> Result<(), Rejection> {
        if self.loading {
            return Err(Rejection::Busy);
        }
        self.preferences = preferences;
        Ok(())
    }

    /// Starts a submission and returns the preferences to send.
    ///
    /// A blank topic is reported as an input error and leaves the previous
    /// notes untouched. Otherwise the previous notes are discarded.
    pub fn begin(&mut self) -> Result<Preferences, Rejection> {
        if self.loading {
            return Err(Rejection::Busy);
        }
        if let Err(rejection) = self.preferences.validate() {
            self.error = Some(rejection.to_string());
            return Err(rejection);
        }
        self.loading = true;
        self.error = None;
        self.notes = None;
        Ok(self.preferences.clone())
    }

    /// Records the outcome of the request started by `begin`.
    pub fn finish(&mut self, outcome: PortResult<StudyNotes>) {
        self.loading = false;
        match outcome {
            Ok(notes) => {
                self.notes = Some(notes);
                self.error = None;
            }
            Err(e) => {
                let message = e.to_string();
                self.notes = None;
                self.error = Some(if message.trim().is_empty() {
                    GENERIC_NOTES_ERROR.to_string()
                } else {
                    message
                });
            }
        }
    }
}
