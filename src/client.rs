use crate::{
    error::{ImagenError, Result},
    models::{DataUrl, ErrorResponse, GeneratedImage, GenerationRequest, SizeOption},
};
use reqwest::Client;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Client for a running rimagen server.
#[derive(Clone)]
pub struct ImagenClient {
    client: Client,
    base_url: String,
}

/// Success body, tolerating a server that answers 2xx without an image.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MaybeImage {
    image_data: Option<String>,
}

impl ImagenClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(120))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ImagenError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Checks the request locally, then asks the server to generate it.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        request.check()?;

        let response = self
            .client
            .post(self.url("/api/generate-image"))
            .json(request)
            .send()
            .await
            .map_err(|e| ImagenError::Client(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ImagenError::Client(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|err| err.message)
                .unwrap_or_else(|_| format!("{}: {}", status, body));
            return Err(ImagenError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let image_data = serde_json::from_str::<MaybeImage>(&body)
            .ok()
            .and_then(|parsed| parsed.image_data)
            .filter(|data| !data.is_empty())
            .ok_or_else(|| ImagenError::Client("No image data received from server.".into()))?;

        Ok(GeneratedImage::new(image_data, request.prompt.clone(), request.size))
    }

    pub async fn sizes(&self) -> Result<Vec<SizeOption>> {
        let response = self
            .client
            .get(self.url("/api/sizes"))
            .send()
            .await
            .map_err(|e| ImagenError::Client(e.to_string()))?;

        response
            .error_for_status()
            .map_err(|e| ImagenError::Client(e.to_string()))?
            .json()
            .await
            .map_err(|e| ImagenError::Serialization(e.to_string()))
    }
}

/// Reads a local image file into a data URL suitable for `baseImage`.
pub fn image_file_to_data_url(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let mime_type = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .and_then(|ext| match ext.as_str() {
            "png" => Some("image/png"),
            "jpg" | "jpeg" => Some("image/jpeg"),
            "webp" => Some("image/webp"),
            "gif" => Some("image/gif"),
            _ => None,
        })
        .ok_or_else(|| ImagenError::Client("Please upload an image file.".into()))?;

    let bytes = fs::read(path)?;
    Ok(DataUrl::from_bytes(mime_type, &bytes).to_string())
}
