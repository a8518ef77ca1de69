//! services/api/src/web/notes_task.rs
//!
//! This module contains the asynchronous "worker" function responsible for
//! one notes generation cycle of a desk.

use crate::web::{
    protocol::{emit, rejected, EventSender, Feature, ServerMessage},
    state::AppState,
};
use pharm_mentor_core::{
    notes::{NotesDesk, LOADING_MESSAGES},
    ports::Rejection,
    render::render_notes_html,
};
use std::{sync::Arc, time::Duration, time::Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

const PROGRESS_INTERVAL: Duration = Duration::from_secs(3);

/// Represents the outcome of the `notes_process` task.
#[derive(Debug, PartialEq, Eq)]
pub enum NotesOutcome {
    Ready,
    Failed,
    /// Refused before any request was sent.
    Rejected,
    /// A request was already in flight; nothing happened.
    AlreadyRunning,
}

/// Generates notes for the desk's current preferences.
///
/// The desk lock is taken only to begin and to finish; the request itself
/// runs unlocked while a progress line is emitted every few seconds.
pub async fn notes_process(
    app_state: Arc<AppState>,
    notes: Arc<Mutex<NotesDesk>>,
    events: EventSender,
) -> NotesOutcome {
    let begun = notes.lock().await.begin();
    let preferences = match begun {
        Ok(preferences) => preferences,
        Err(Rejection::Busy) => {
            info!("Notes are already being generated; ignoring the request.");
            return NotesOutcome::AlreadyRunning;
        }
        Err(rejection) => {
            emit(&events, rejected(Feature::Notes, &rejection));
            return NotesOutcome::Rejected;
        }
    };

    let start_time = Instant::now();
    emit(&events, ServerMessage::NotesStarted);

    let request = app_state.notes_adapter.generate_study_notes(&preferences);
    tokio::pin!(request);
    let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
    let mut step = 0;

    let result = loop {
        tokio::select! {
            result = &mut request => break result,
            _ = ticker.tick() => {
                let message = LOADING_MESSAGES[step % LOADING_MESSAGES.len()];
                emit(&events, ServerMessage::NotesProgress { message: message.to_string() });
                step += 1;
            }
        }
    };
    info!("⏱️ Notes request took: {:?}", start_time.elapsed());

    let mut desk = notes.lock().await;
    desk.finish(result);

    match (desk.notes(), desk.error()) {
        (Some(generated), _) => {
            let html = render_notes_html(generated, preferences.subject, preferences.topic.trim());
            emit(
                &events,
                ServerMessage::NotesReady {
                    notes: generated.clone(),
                    html,
                },
            );
            NotesOutcome::Ready
        }
        (None, error) => {
            let message = error.unwrap_or_default().to_string();
            warn!("Notes generation failed: {}", message);
            emit(&events, ServerMessage::NotesFailed { message });
            NotesOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::test_support::{app_state, drain, sample_notes, FakeChat, FakeNotes, FakeVision};
    use pharm_mentor_core::{domain::Preferences, ports::PortError};
    use tokio::sync::mpsc;

    fn desk(topic: &str) -> Arc<Mutex<NotesDesk>> {
        Arc::new(Mutex::new(NotesDesk::new(Preferences {
            topic: topic.to_string(),
            ..Preferences::default()
        })))
    }

    #[tokio::test]
    async fn blank_topic_never_reaches_the_service() {
        let fake = FakeNotes::returning(Ok(sample_notes()));
        let state = app_state(fake.clone(), FakeVision::returning(Ok(String::new())), FakeChat::scripted(vec![]));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let outcome = notes_process(state, desk("   "), tx).await;

        assert_eq!(outcome, NotesOutcome::Rejected);
        assert_eq!(fake.calls(), 0);
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            ServerMessage::Rejected { feature: Feature::Notes, message } if message == "Please enter a topic name."
        ));
    }

    #[tokio::test]
    async fn generated_notes_are_delivered_with_rendered_html() {
        let fake = FakeNotes::returning(Ok(sample_notes()));
        let state = app_state(fake.clone(), FakeVision::returning(Ok(String::new())), FakeChat::scripted(vec![]));
        let notes = desk("Tablets");
        let (tx, mut rx) = mpsc::unbounded_channel();

        let outcome = notes_process(state, notes.clone(), tx).await;

        assert_eq!(outcome, NotesOutcome::Ready);
        assert_eq!(fake.calls(), 1);
        assert!(!notes.lock().await.is_loading());

        let events = drain(&mut rx);
        assert!(matches!(events.first(), Some(ServerMessage::NotesStarted)));
        match events.last() {
            Some(ServerMessage::NotesReady { notes, html }) => {
                assert_eq!(notes, &sample_notes());
                assert!(html.contains("id=\"introduction\""));
                assert!(html.contains("Tablets"));
            }
            other => panic!("unexpected final event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn service_failure_is_reported_without_notes() {
        let fake = FakeNotes::returning(Err(PortError::Service("quota exceeded".to_string())));
        let state = app_state(fake, FakeVision::returning(Ok(String::new())), FakeChat::scripted(vec![]));
        let notes = desk("Tablets");
        let (tx, mut rx) = mpsc::unbounded_channel();

        let outcome = notes_process(state, notes.clone(), tx).await;

        assert_eq!(outcome, NotesOutcome::Failed);
        assert!(notes.lock().await.notes().is_none());
        match drain(&mut rx).last() {
            Some(ServerMessage::NotesFailed { message }) => assert!(message.contains("quota exceeded")),
            other => panic!("unexpected final event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn second_request_while_loading_is_ignored() {
        let fake = FakeNotes::returning(Ok(sample_notes()));
        let state = app_state(fake.clone(), FakeVision::returning(Ok(String::new())), FakeChat::scripted(vec![]));
        let notes = desk("Tablets");
        notes.lock().await.begin().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let outcome = notes_process(state, notes, tx).await;

        assert_eq!(outcome, NotesOutcome::AlreadyRunning);
        assert_eq!(fake.calls(), 0);
        assert!(drain(&mut rx).is_empty());
    }
}
