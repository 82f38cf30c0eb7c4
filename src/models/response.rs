use crate::error::{Result, ValidationErrors};
use crate::models::{DataUrl, ImageSize};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Success body of `POST /api/generate-image`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageGenerationResponse {
    pub image_data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: None,
        }
    }

    pub fn invalid(errors: &ValidationErrors) -> Self {
        Self {
            message: "Invalid request data".to_string(),
            errors: serde_json::to_value(errors).ok(),
        }
    }
}

/// A generated image as kept by the client after a successful call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub id: Uuid,
    pub image_data: String,
    pub prompt: String,
    pub size: ImageSize,
    pub created_at: DateTime<Utc>,
}

impl GeneratedImage {
    pub fn new(image_data: String, prompt: String, size: ImageSize) -> Self {
        Self {
            id: Uuid::new_v4(),
            image_data,
            prompt,
            size,
            created_at: Utc::now(),
        }
    }

    pub fn file_name(&self) -> Result<String> {
        let url = DataUrl::parse(&self.image_data)?;
        Ok(format!(
            "ai-generated-{}.{}",
            self.created_at.timestamp_millis(),
            url.extension()
        ))
    }

    /// Decodes the image and writes it into `dir`, returning the written path.
    pub fn save_in(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let url = DataUrl::parse(&self.image_data)?;
        let bytes = url.decode()?;
        let path = dir.as_ref().join(self.file_name()?);
        fs::write(&path, bytes)?;
        log::info!("💾 Image saved to: {}", path.display());
        Ok(path)
    }
}
