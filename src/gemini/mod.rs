pub mod client;
pub mod types;

use crate::error::ProviderError;
use async_trait::async_trait;

pub use client::GeminiClient;
pub use types::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    InlineData, Modality, Part,
};

/// A backend that answers Gemini-shaped `generateContent` calls.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ProviderError>;
}

