use serde::Serialize;
use thiserror::Error;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: Vec<String>,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: &str, code: &str, message: impl Into<String>) -> Self {
        let path = if field.is_empty() {
            Vec::new()
        } else {
            vec![field.to_string()]
        };

        Self {
            path,
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn field(&self) -> Option<&str> {
        self.path.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[error("Invalid request data: {}", summarize(.issues))]
#[serde(transparent)]
pub struct ValidationErrors {
    pub issues: Vec<ValidationIssue>,
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| match issue.field() {
            Some(field) => format!("{}: {}", field, issue.message),
            None => issue.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.issues.iter().any(|issue| issue.field() == Some(field))
    }
}

/// Failures of a single call to the image provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("No candidates returned from Gemini API")]
    NoCandidates,
    #[error("No content parts in response")]
    NoContentParts,
    #[error("No image data found in response")]
    NoImageData,
    #[error("Gemini API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Request to Gemini API timed out after {0}s")]
    Timeout(u64),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum ImagenError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("GEMINI_API_KEY is not configured")]
    MissingCredential,
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("Failed to generate image: {0}")]
    Generation(#[from] ProviderError),
    #[error("Server returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Client error: {0}")]
    Client(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ImagenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_errors_carry_uniform_prefix() {
        let err = ImagenError::from(ProviderError::NoCandidates);
        assert_eq!(
            err.to_string(),
            "Failed to generate image: No candidates returned from Gemini API"
        );

        let err = ImagenError::from(ProviderError::Transport("connection reset".into()));
        assert_eq!(
            err.to_string(),
            "Failed to generate image: Transport error: connection reset"
        );
    }

    #[test]
    fn validation_errors_serialize_as_issue_list() {
        let mut errors = ValidationErrors::new();
        errors.push(ValidationIssue::new("prompt", "too_small", "Prompt is required"));

        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                { "path": ["prompt"], "code": "too_small", "message": "Prompt is required" }
            ])
        );
        assert!(errors.has_field("prompt"));
        assert!(!errors.has_field("size"));
        assert_eq!(errors.to_string(), "Invalid request data: prompt: Prompt is required");
    }
}
