//! services/api/src/adapters/vision_llm.rs
//!
//! This module contains the adapter for the vision-capable LLM used by the image lab.
//! It implements the `ImageAnalysisService` port from the `core` crate.

const VISION_INSTRUCTIONS: &str = r#"You are an expert B.Pharm laboratory instructor. Identify and describe what is shown in this image. It may be pharmaceutical apparatus, a diagram, a chemical structure or handwritten study notes.

Structure your answer with these sections, each starting with a '#' header:
# Identification
What the item is, in one or two lines.
# Description
Its key parts or features as '-' bullets.
# Pharmaceutical Use
Where and how it is used in pharmacy practice or the laboratory.
# Exam Notes
Points a first-year student should remember, as '-' bullets.

Use **bold** for key terms. Do not use numbered lists, links or tables. If the image is not related to pharmacy, say so briefly and describe what you can see."#;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, ImageDetail, ImageUrlArgs,
    },
    Client,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use pharm_mentor_core::{
    domain::ImageUpload,
    ports::{ImageAnalysisService, PortError, PortResult},
};
use tracing::info;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ImageAnalysisService` using an OpenAI-compatible vision model.
#[derive(Clone)]
pub struct OpenAiVisionAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiVisionAdapter {
    /// Creates a new `OpenAiVisionAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    fn data_url(image: &ImageUpload) -> String {
        format!("data:{};base64,{}", image.media_type, STANDARD.encode(&image.data))
    }

    fn build_request(&self, image: &ImageUpload) -> Result<CreateChatCompletionRequest, OpenAIError> {
        let instruction = ChatCompletionRequestMessageContentPartTextArgs::default()
            .text(VISION_INSTRUCTIONS)
            .build()?;
        let picture = ChatCompletionRequestMessageContentPartImageArgs::default()
            .image_url(
                ImageUrlArgs::default()
                    .url(Self::data_url(image))
                    .detail(ImageDetail::High)
                    .build()?,
            )
            .build()?;

        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Array(vec![
                ChatCompletionRequestUserMessageContentPart::Text(instruction),
                ChatCompletionRequestUserMessageContentPart::ImageUrl(picture),
            ]))
            .build()?;

        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![message.into()])
            .n(1)
            .build()
    }
}

//=========================================================================================
// `ImageAnalysisService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ImageAnalysisService for OpenAiVisionAdapter {
    /// Sends the image with the fixed identification instruction and returns the text verbatim.
    async fn analyze_image(&self, image: &ImageUpload) -> PortResult<String> {
        let request = self
            .build_request(image)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        info!(
            "Analyzing {} image ({} bytes)",
            image.media_type,
            image.data.len()
        );

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Service(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                PortError::MalformedResponse(
                    "Vision LLM response contained no text content.".to_string(),
                )
            })
    }
}
