//! services/api/src/web/image_task.rs
//!
//! Image lab workers: selecting an image and running one analysis.

use crate::web::{
    protocol::{decode_data_url, emit, rejected, DataUrlError, EventSender, Feature, ServerMessage},
    state::AppState,
};
use pharm_mentor_core::{
    format::{format_markdown, FormatProfile},
    image_lab::ImageLab,
    ports::Rejection,
};
use std::{sync::Arc, time::Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Represents the outcome of the `analysis_process` task.
#[derive(Debug, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Ready,
    Failed,
    Rejected,
    AlreadyRunning,
}

/// Decodes and selects an image. The previous result and error are cleared
/// as soon as the selection is accepted.
pub async fn select_image(
    app_state: &AppState,
    image_lab: &Mutex<ImageLab>,
    data_url: &str,
    events: &EventSender,
) {
    let image = match decode_data_url(data_url, app_state.config.max_image_bytes) {
        Ok(image) => image,
        Err(DataUrlError::Rejected(rejection)) => {
            emit(events, rejected(Feature::Image, &rejection));
            return;
        }
        Err(e) => {
            emit(
                events,
                ServerMessage::Rejected {
                    feature: Feature::Image,
                    message: e.to_string(),
                },
            );
            return;
        }
    };

    let (media_type, size) = (image.media_type.clone(), image.data.len());
    let selected = image_lab.lock().await.select(image);
    match selected {
        Ok(()) => {
            info!("Selected a {} image ({} bytes)", media_type, size);
            emit(events, ServerMessage::ImageSelected { media_type, size });
        }
        Err(rejection) => emit(events, rejected(Feature::Image, &rejection)),
    }
}

/// Analyzes the selected image.
pub async fn analysis_process(
    app_state: Arc<AppState>,
    image_lab: Arc<Mutex<ImageLab>>,
    events: EventSender,
) -> AnalysisOutcome {
    let begun = image_lab.lock().await.begin();
    let image = match begun {
        Ok(image) => image,
        Err(Rejection::Busy) => {
            info!("An analysis is already running; ignoring the request.");
            return AnalysisOutcome::AlreadyRunning;
        }
        Err(rejection) => {
            emit(&events, rejected(Feature::Image, &rejection));
            return AnalysisOutcome::Rejected;
        }
    };

    emit(&events, ServerMessage::AnalysisStarted);
    let start_time = Instant::now();
    let result = app_state.vision_adapter.analyze_image(&image).await;
    info!("⏱️ Image analysis took: {:?}", start_time.elapsed());

    let mut lab = image_lab.lock().await;
    lab.finish(result);

    match (lab.result(), lab.error()) {
        (Some(text), _) => {
            emit(
                &events,
                ServerMessage::AnalysisReady {
                    text: text.to_string(),
                    html: format_markdown(text, FormatProfile::Analysis),
                },
            );
            AnalysisOutcome::Ready
        }
        (None, error) => {
            let message = error.unwrap_or_default().to_string();
            warn!("Image analysis failed: {}", message);
            emit(&events, ServerMessage::AnalysisFailed { message });
            AnalysisOutcome::Failed
        }
    }
}
