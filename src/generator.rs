use crate::{
    error::{ImagenError, ProviderError, Result},
    gemini::{
        Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, ImageProvider,
        Modality, Part,
    },
    logger,
    models::{data_url, DataUrl, GenerationRequest, ImageSize},
};
use std::sync::Arc;

/// Turns validated requests into provider calls and provider responses into data URLs.
#[derive(Clone)]
pub struct ImageGenerator {
    provider: Arc<dyn ImageProvider>,
    model: String,
}

impl ImageGenerator {
    pub fn new(provider: Arc<dyn ImageProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate_request(&self, request: &GenerationRequest) -> Result<String> {
        self.generate(&request.prompt, request.size, request.base_image.as_deref())
            .await
    }

    pub async fn generate(
        &self,
        prompt: &str,
        size: ImageSize,
        base_image: Option<&str>,
    ) -> Result<String> {
        let base_image = base_image.filter(|image| !image.is_empty());
        let payload = build_payload(prompt, size, base_image);
        log::info!(
            "🎨 Generating image with model: {} ({}, {})",
            self.model,
            size,
            if base_image.is_some() { "edit" } else { "text-to-image" }
        );

        let _timer = logger::timer("gemini generateContent");
        let outcome = match self.provider.generate_content(&self.model, &payload).await {
            Ok(response) => extract_image(response),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(url) => Ok(url.to_string()),
            Err(cause) => {
                let err = ImagenError::Generation(cause);
                log::error!("{}", err);
                Err(err)
            }
        }
    }
}

/// Builds the provider payload: an inline image plus edit instruction when a
/// non-empty base image is given, a single text instruction otherwise.
pub fn build_payload(
    prompt: &str,
    size: ImageSize,
    base_image: Option<&str>,
) -> GenerateContentRequest {
    let parts = match base_image.filter(|image| !image.is_empty()) {
        Some(image) => {
            let mime_type =
                data_url::declared_mime_type(image).unwrap_or(data_url::DEFAULT_MIME_TYPE);
            vec![
                Part::inline_image(mime_type, data_url::strip_prefix(image)),
                Part::text(format!(
                    "Edit this image: {}. Maintain the {} dimensions.",
                    prompt, size
                )),
            ]
        }
        None => vec![Part::text(format!(
            "{}. Generate this image at {} resolution.",
            prompt, size
        ))],
    };

    GenerateContentRequest {
        contents: vec![Content::user(parts)],
        generation_config: GenerationConfig {
            response_modalities: vec![Modality::Text, Modality::Image],
        },
    }
}

/// Returns the first inline image of the first candidate.
pub fn extract_image(
    response: GenerateContentResponse,
) -> std::result::Result<DataUrl, ProviderError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(ProviderError::NoCandidates)?;
    let parts = candidate
        .content
        .and_then(|content| content.parts)
        .ok_or(ProviderError::NoContentParts)?;

    for part in parts {
        match part {
            Part::Text { text } | Part::TextWithInlineData { text, .. } if !text.is_empty() => {
                log::info!("Gemini response text: {}", text)
            }
            Part::Text { .. } => {}
            Part::InlineData { inline_data } | Part::TextWithInlineData { inline_data, .. }
                if !inline_data.data.is_empty() =>
            {
                return Ok(DataUrl::new(
                    inline_data.mime_type.as_deref(),
                    inline_data.data,
                ));
            }
            Part::InlineData { .. } | Part::TextWithInlineData { .. } => {
                log::debug!("Skipping inline part without data")
            }
            Part::Other(value) => log::debug!("Skipping unrecognized part: {}", value),
        }
    }

    Err(ProviderError::NoImageData)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::gemini::{Candidate, InlineData};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Provider double that replays one canned outcome and records calls.
    pub(crate) struct ScriptedProvider {
        outcome: Box<dyn Fn() -> std::result::Result<GenerateContentResponse, ProviderError> + Send + Sync>,
        pub calls: AtomicUsize,
        pub last_request: Mutex<Option<(String, GenerateContentRequest)>>,
    }

    impl ScriptedProvider {
        pub(crate) fn returning(response: GenerateContentResponse) -> Self {
            Self::with(move || Ok(response.clone()))
        }

        pub(crate) fn with(
            outcome: impl Fn() -> std::result::Result<GenerateContentResponse, ProviderError>
                + Send
                + Sync
                + 'static,
        ) -> Self {
            Self {
                outcome: Box::new(outcome),
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub(crate) fn last_parts(&self) -> Vec<Part> {
            let guard = self.last_request.lock().unwrap();
            let (_, request) = guard.as_ref().expect("provider was not called");
            request.contents[0].parts.clone().unwrap_or_default()
        }
    }

    #[async_trait]
    impl ImageProvider for ScriptedProvider {
        async fn generate_content(
            &self,
            model: &str,
            request: &GenerateContentRequest,
        ) -> std::result::Result<GenerateContentResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some((model.to_string(), request.clone()));
            (self.outcome)()
        }
    }

    pub(crate) fn response_with(parts: Vec<Part>) -> GenerateContentResponse {
        GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(Content {
                    role: Some("model".to_string()),
                    parts: Some(parts),
                }),
            }],
        }
    }

    fn generator(provider: &Arc<ScriptedProvider>) -> ImageGenerator {
        ImageGenerator::new(provider.clone(), "test-model")
    }

    #[test]
    fn text_to_image_payload_has_one_text_part() {
        let payload = build_payload("a red fox", ImageSize::FullHd, None);
        let parts = payload.contents[0].parts.as_ref().unwrap();
        assert_eq!(
            parts,
            &vec![Part::text(
                "a red fox. Generate this image at 1920x1080 resolution."
            )]
        );
        assert_eq!(
            payload.generation_config.response_modalities,
            vec![Modality::Text, Modality::Image]
        );
        assert_eq!(payload.contents[0].role.as_deref(), Some("user"));
    }

    #[test]
    fn edit_payload_strips_data_url_prefix() {
        let payload = build_payload(
            "make it night",
            ImageSize::Square512,
            Some("data:image/png;base64,AAAA"),
        );
        let parts = payload.contents[0].parts.as_ref().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], Part::inline_image("image/png", "AAAA"));
        assert_eq!(
            parts[1],
            Part::text("Edit this image: make it night. Maintain the 512x512 dimensions.")
        );
    }

    #[test]
    fn empty_base_image_falls_back_to_text_to_image() {
        let request = GenerationRequest::validate(&serde_json::json!({
            "prompt": "cat",
            "size": "512x512",
            "baseImage": ""
        }))
        .unwrap();
        let payload =
            build_payload(&request.prompt, request.size, request.base_image.as_deref());
        let parts = payload.contents[0].parts.as_ref().unwrap();
        assert_eq!(
            parts,
            &vec![Part::text("cat. Generate this image at 512x512 resolution.")]
        );
    }

    #[test]
    fn edit_payload_keeps_declared_mime_and_raw_input() {
        let payload = build_payload("x", ImageSize::Banner, Some("data:image/jpeg;base64,/9j/"));
        let parts = payload.contents[0].parts.as_ref().unwrap();
        assert_eq!(parts[0], Part::inline_image("image/jpeg", "/9j/"));

        let payload = build_payload("x", ImageSize::Banner, Some("iVBORw0"));
        let parts = payload.contents[0].parts.as_ref().unwrap();
        assert_eq!(parts[0], Part::inline_image("image/png", "iVBORw0"));
    }

    #[test]
    fn extracts_image_after_text_part() {
        let url = extract_image(response_with(vec![
            Part::text("Sure, here is your image"),
            Part::inline_image("image/jpeg", "Zm9v"),
            Part::inline_image("image/png", "YmFy"),
        ]))
        .unwrap();
        assert_eq!(url.to_string(), "data:image/jpeg;base64,Zm9v");
    }

    #[test]
    fn empty_text_does_not_hide_inline_image() {
        let url = extract_image(response_with(vec![
            Part::TextWithInlineData {
                text: "Caption for a skipped image".to_string(),
                inline_data: InlineData {
                    mime_type: Some("image/png".to_string()),
                    data: "AAAA".to_string(),
                },
            },
            Part::TextWithInlineData {
                text: String::new(),
                inline_data: InlineData {
                    mime_type: Some("image/webp".to_string()),
                    data: "UklG".to_string(),
                },
            },
        ]))
        .unwrap();
        assert_eq!(url.to_string(), "data:image/webp;base64,UklG");
    }

    #[test]
    fn inline_part_without_mime_defaults_to_png() {
        let url = extract_image(response_with(vec![Part::InlineData {
            inline_data: InlineData {
                mime_type: None,
                data: "AAAA".to_string(),
            },
        }]))
        .unwrap();
        assert_eq!(url.to_string(), "data:image/png;base64,AAAA");
    }

    #[test]
    fn classifies_missing_pieces() {
        assert!(matches!(
            extract_image(GenerateContentResponse::default()),
            Err(ProviderError::NoCandidates)
        ));

        let no_content = GenerateContentResponse {
            candidates: vec![Candidate { content: None }],
        };
        assert!(matches!(
            extract_image(no_content),
            Err(ProviderError::NoContentParts)
        ));

        assert!(matches!(
            extract_image(response_with(vec![Part::text("I can't draw that")])),
            Err(ProviderError::NoImageData)
        ));

        assert!(matches!(
            extract_image(response_with(vec![Part::inline_image("image/png", "")])),
            Err(ProviderError::NoImageData)
        ));
    }

    #[tokio::test]
    async fn generate_returns_data_url_and_passes_model() {
        let provider = Arc::new(ScriptedProvider::returning(response_with(vec![
            Part::text("done"),
            Part::inline_image("image/png", "AAAA"),
        ])));

        let url = generator(&provider)
            .generate("a cat", ImageSize::Square1024, None)
            .await
            .unwrap();

        assert_eq!(url, "data:image/png;base64,AAAA");
        assert_eq!(provider.call_count(), 1);
        let model = provider.last_request.lock().unwrap().as_ref().unwrap().0.clone();
        assert_eq!(model, "test-model");
        assert_eq!(provider.last_parts().len(), 1);
    }

    #[tokio::test]
    async fn generate_wraps_failures_with_prefix() {
        let provider = Arc::new(ScriptedProvider::returning(GenerateContentResponse::default()));
        let err = generator(&provider)
            .generate("a cat", ImageSize::Square1024, None)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to generate image: No candidates returned from Gemini API"
        );

        let provider = Arc::new(ScriptedProvider::with(|| {
            Err(ProviderError::Transport("connection refused".into()))
        }));
        let err = generator(&provider)
            .generate("a cat", ImageSize::Square1024, Some("data:image/png;base64,AAAA"))
            .await
            .unwrap_err();
        assert!(matches!(err, ImagenError::Generation(ProviderError::Transport(_))));
        assert!(err.to_string().starts_with("Failed to generate image: "));
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(provider.last_parts().len(), 2);
    }
}
