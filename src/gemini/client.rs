use crate::{
    config::GeminiConfig,
    error::{ImagenError, ProviderError, Result},
    gemini::{
        types::{ErrorEnvelope, GenerateContentRequest, GenerateContentResponse},
        ImageProvider,
    },
};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// `ImageProvider` backed by the Gemini REST API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    api_base: String,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ImagenError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone().unwrap_or_default(),
            api_base: config.api_base.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn endpoint_for_model(&self, model: &str) -> String {
        let model = model.trim();
        let model_path = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    fn transport_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(self.timeout_secs)
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

fn api_error(status: StatusCode, body: &str) -> ProviderError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| match envelope.error.status {
            Some(code) if !envelope.error.message.is_empty() => {
                format!("{} - {}", code, envelope.error.message)
            }
            _ => envelope.error.message,
        })
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });

    ProviderError::Api {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl ImageProvider for GeminiClient {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> std::result::Result<GenerateContentResponse, ProviderError> {
        let endpoint = self.endpoint_for_model(model);
        log::debug!("POST {}", endpoint);

        let response = self
            .client
            .post(&endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            log::error!("Gemini API returned {}: {}", status, body);
            return Err(api_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}
