//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{build_client, OpenAiChatAdapter, OpenAiNotesAdapter, OpenAiVisionAdapter},
    config::Config,
    error::ApiError,
    web::{rest::ApiDoc, router, state::AppState},
};
use axum::Router;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");
    match &config.api_base {
        Some(base) => info!("Using AI endpoint {}", base),
        None => info!("Using the default OpenAI endpoint"),
    }

    // --- 2. Initialize Service Adapters ---
    // One client is shared; the adapters differ only in model and request shape.
    let client = build_client(&config);
    let notes_adapter = Arc::new(OpenAiNotesAdapter::new(
        client.clone(),
        config.notes_model.clone(),
    ));
    let vision_adapter = Arc::new(OpenAiVisionAdapter::new(
        client.clone(),
        config.vision_model.clone(),
    ));
    let chat_adapter = Arc::new(OpenAiChatAdapter::new(client, config.chat_model.clone()));

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        notes_adapter,
        vision_adapter,
        chat_adapter,
    });

    // --- 4. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(router(app_state)?)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
