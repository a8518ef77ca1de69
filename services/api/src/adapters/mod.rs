pub mod chat_llm;
pub mod notes_llm;
pub mod vision_llm;

pub use chat_llm::OpenAiChatAdapter;
pub use notes_llm::OpenAiNotesAdapter;
pub use vision_llm::OpenAiVisionAdapter;

use crate::config::Config;
use async_openai::{config::OpenAIConfig, Client};

/// Builds the one client shared by every adapter.
pub fn build_client(config: &Config) -> Client<OpenAIConfig> {
    let mut openai_config = OpenAIConfig::new().with_api_key(config.api_key.clone());
    if let Some(base) = &config.api_base {
        openai_config = openai_config.with_api_base(base.clone());
    }
    Client::with_config(openai_config)
}
