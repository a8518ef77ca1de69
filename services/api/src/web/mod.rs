pub mod chat_task;
pub mod image_task;
pub mod notes_task;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export the main WebSocket handler to make it easily accessible
// to the binary that will build the web server router.
pub use rest::{analyze_image_handler, catalog_handler, generate_notes_handler};
pub use ws_handler::ws_handler;

use crate::{config::ConfigError, web::state::AppState};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Multipart framing on top of the image itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Builds the API router: the REST endpoints, the desk WebSocket and CORS.
pub fn router(app_state: Arc<AppState>) -> Result<Router, ConfigError> {
    let origin = app_state
        .config
        .allowed_origin
        .parse::<HeaderValue>()
        .map_err(|e| ConfigError::InvalidValue("ALLOWED_ORIGIN".to_string(), e.to_string()))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    let body_limit = app_state.config.max_image_bytes + MULTIPART_OVERHEAD;

    Ok(Router::new()
        .route("/catalog", get(catalog_handler))
        .route("/notes", post(generate_notes_handler))
        .route("/image/analyze", post(analyze_image_handler))
        .route("/ws", get(ws_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(app_state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::test_support::{
        app_state, default_app_state, sample_notes, FakeChat, FakeNotes, FakeVision,
    };
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use pharm_mentor_core::ports::PortError;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const BOUNDARY: &str = "pharm-boundary";

    async fn send(app_state: Arc<AppState>, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = router(app_state).unwrap().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    fn notes_request(topic: &str) -> Request<Body> {
        let body = json!({
            "subject": "Pharmaceutics",
            "topic": topic,
            "semester": "Semester 1",
            "university": null,
            "depth": "Exam Notes",
            "includeDiagrams": true,
            "includeMnemonics": true,
            "includeClinicalCorrelation": false
        });
        Request::builder()
            .method("POST")
            .uri("/notes")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn upload_request(media_type: &str, data: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"scan\"\r\nContent-Type: {media_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/image/analyze")
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn catalog_lists_every_subject_and_semester() {
        let request = Request::builder().uri("/catalog").body(Body::empty()).unwrap();
        let (status, body) = send(default_app_state(), request).await;

        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["subjects"].as_array().unwrap().len(), 7);
        assert_eq!(json["subjects"][0], "Human Anatomy & Physiology");
        assert_eq!(json["semesters"], json!(["Semester 1", "Semester 2"]));
        assert_eq!(json["depths"].as_array().unwrap().len(), 3);
        assert_eq!(json["defaults"]["depth"], "Exam Notes");
    }

    #[tokio::test]
    async fn notes_are_returned_with_html() {
        let (status, body) = send(default_app_state(), notes_request("Tablets")).await;

        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["notes"]["introduction"], sample_notes().introduction);
        assert!(json["html"].as_str().unwrap().contains("Tablets"));
    }

    #[tokio::test]
    async fn blank_topic_is_a_bad_request_and_skips_the_service() {
        let notes = FakeNotes::returning(Ok(sample_notes()));
        let state = app_state(
            notes.clone(),
            FakeVision::returning(Ok(String::new())),
            FakeChat::scripted(vec![]),
        );

        let (status, body) = send(state, notes_request("  ")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(String::from_utf8(body).unwrap(), "Please enter a topic name.");
        assert_eq!(notes.calls(), 0);
    }

    #[tokio::test]
    async fn service_failures_are_bad_gateway() {
        let state = app_state(
            FakeNotes::returning(Err(PortError::MalformedResponse("not json".to_string()))),
            FakeVision::returning(Ok(String::new())),
            FakeChat::scripted(vec![]),
        );

        let (status, _) = send(state, notes_request("Tablets")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn uploaded_image_is_analyzed() {
        let (status, body) = send(default_app_state(), upload_request("image/png", b"\x89PNG")).await;

        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["analysis"], "# Identification\nA **burette**.");
        assert!(json["html"].as_str().unwrap().starts_with("<h3>Identification</h3>"));
    }

    #[tokio::test]
    async fn non_image_uploads_are_refused() {
        let vision = FakeVision::returning(Ok("text".to_string()));
        let state = app_state(
            FakeNotes::returning(Ok(sample_notes())),
            vision.clone(),
            FakeChat::scripted(vec![]),
        );

        let (status, _) = send(state, upload_request("text/plain", b"hello")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(vision.calls(), 0);
    }

    #[tokio::test]
    async fn oversized_images_are_refused() {
        // The test configuration allows 1024 bytes.
        let (status, _) = send(default_app_state(), upload_request("image/png", &[7u8; 2048])).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn uploads_beyond_the_body_limit_are_payload_too_large() {
        // Larger than the image limit plus the multipart allowance.
        let vision = FakeVision::returning(Ok("text".to_string()));
        let state = app_state(
            FakeNotes::returning(Ok(sample_notes())),
            vision.clone(),
            FakeChat::scripted(vec![]),
        );

        let (status, _) = send(state, upload_request("image/png", &vec![7u8; 100 * 1024])).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(vision.calls(), 0);
    }
}
