//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.
//!
//! The endpoints are stateless one-shot versions of the desk operations.

use crate::web::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use pharm_mentor_core::{
    domain::{AnswerDepth, ImageUpload, Preferences, StudyNotes, Subject, SEMESTERS},
    format::{format_markdown, FormatProfile},
    ports::{PortError, Rejection},
    render::render_notes_html,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        catalog_handler,
        generate_notes_handler,
        analyze_image_handler,
    ),
    components(
        schemas(CatalogResponse, DepthEntry, NotesResponse, AnalysisResponse)
    ),
    tags(
        (name = "PharmMentor API", description = "Study notes, image lab analysis and catalogs for B.Pharm students.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The choices the preferences form is built from.
#[derive(Serialize, ToSchema)]
pub struct CatalogResponse {
    subjects: Vec<String>,
    semesters: Vec<String>,
    depths: Vec<DepthEntry>,
    #[schema(value_type = Object)]
    defaults: Preferences,
}

#[derive(Serialize, ToSchema)]
pub struct DepthEntry {
    label: String,
    guidance: String,
}

/// Generated notes with their rendered HTML document.
#[derive(Serialize, ToSchema)]
pub struct NotesResponse {
    #[schema(value_type = Object)]
    notes: StudyNotes,
    html: String,
}

#[derive(Serialize, ToSchema)]
pub struct AnalysisResponse {
    analysis: String,
    html: String,
}

//=========================================================================================
// Error Mapping
//=========================================================================================

fn rejection_response(rejection: Rejection) -> (StatusCode, String) {
    let status = match rejection {
        Rejection::Busy => StatusCode::CONFLICT,
        _ => StatusCode::BAD_REQUEST,
    };
    (status, rejection.to_string())
}

fn port_error_response(e: PortError) -> (StatusCode, String) {
    error!("AI service call failed: {:?}", e);
    let status = match e {
        PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        PortError::Service(_) | PortError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
    };
    (status, e.to_string())
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List the subjects, semesters and answer depths, with the default preferences.
#[utoipa::path(
    get,
    path = "/catalog",
    responses(
        (status = 200, description = "The catalogs", body = CatalogResponse)
    )
)]
pub async fn catalog_handler() -> Json<CatalogResponse> {
    Json(CatalogResponse {
        subjects: Subject::ALL.iter().map(|s| s.label().to_string()).collect(),
        semesters: SEMESTERS.iter().map(|s| s.to_string()).collect(),
        depths: AnswerDepth::ALL
            .iter()
            .map(|d| DepthEntry {
                label: d.label().to_string(),
                guidance: d.guidance().to_string(),
            })
            .collect(),
        defaults: Preferences::default(),
    })
}

/// Generate structured study notes for one set of preferences.
#[utoipa::path(
    post,
    path = "/notes",
    request_body(content_type = "application/json", description = "The note preferences (camelCase keys)."),
    responses(
        (status = 200, description = "Notes generated", body = NotesResponse),
        (status = 400, description = "Blank topic or invalid preferences"),
        (status = 502, description = "The AI service failed or returned unusable notes")
    )
)]
pub async fn generate_notes_handler(
    State(app_state): State<Arc<AppState>>,
    Json(preferences): Json<Preferences>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    preferences.validate().map_err(rejection_response)?;
    info!("REST notes request for '{}'", preferences.topic.trim());

    let notes = app_state
        .notes_adapter
        .generate_study_notes(&preferences)
        .await
        .map_err(port_error_response)?;

    let html = render_notes_html(&notes, preferences.subject, preferences.topic.trim());
    Ok(Json(NotesResponse { notes, html }))
}

/// Identify and describe an uploaded lab image.
///
/// Accepts a multipart/form-data request; the first part must be an image.
#[utoipa::path(
    post,
    path = "/image/analyze",
    request_body(content_type = "multipart/form-data", description = "The image to analyze."),
    responses(
        (status = 200, description = "Image analyzed", body = AnalysisResponse),
        (status = 400, description = "Missing or non-image upload"),
        (status = 413, description = "Image too large"),
        (status = 502, description = "The AI service failed")
    )
)]
pub async fn analyze_image_handler(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| (e.status(), format!("Failed to read multipart data: {}", e)))?
        .ok_or_else(|| rejection_response(Rejection::NoImage))?;

    let media_type = field.content_type().unwrap_or_default().to_string();
    // A body over the router limit surfaces here as 413, not 400.
    let data = field
        .bytes()
        .await
        .map_err(|e| (e.status(), format!("Failed to read image bytes: {}", e)))?;

    let max_bytes = app_state.config.max_image_bytes;
    if data.len() > max_bytes {
        return Err((
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("The image is larger than the {} byte limit.", max_bytes),
        ));
    }
    let image = ImageUpload::new(media_type, data.to_vec()).map_err(rejection_response)?;

    let analysis = app_state
        .vision_adapter
        .analyze_image(&image)
        .await
        .map_err(port_error_response)?;

    let html = format_markdown(&analysis, FormatProfile::Analysis);
    Ok(Json(AnalysisResponse { analysis, html }))
}
