use crate::error::{ValidationErrors, ValidationIssue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub const MAX_PROMPT_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ImageSize {
    #[serde(rename = "512x512")]
    Square512,
    #[default]
    #[serde(rename = "1024x1024")]
    Square1024,
    #[serde(rename = "1920x1080")]
    FullHd,
    #[serde(rename = "1500x500")]
    Banner,
}

impl ImageSize {
    pub const ALL: [ImageSize; 4] = [
        ImageSize::Square512,
        ImageSize::Square1024,
        ImageSize::FullHd,
        ImageSize::Banner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Square512 => "512x512",
            ImageSize::Square1024 => "1024x1024",
            ImageSize::FullHd => "1920x1080",
            ImageSize::Banner => "1500x500",
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            ImageSize::Square512 => (512, 512),
            ImageSize::Square1024 => (1024, 1024),
            ImageSize::FullHd => (1920, 1080),
            ImageSize::Banner => (1500, 500),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImageSize::Square512 => "512×512",
            ImageSize::Square1024 => "1024×1024",
            ImageSize::FullHd => "1920×1080",
            ImageSize::Banner => "1500×500",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ImageSize::Square512 => "Small square format",
            ImageSize::Square1024 => "Large square format",
            ImageSize::FullHd => "Full HD landscape",
            ImageSize::Banner => "Twitter banner size",
        }
    }

    /// `received` is either a quoted string value or a JSON type name.
    fn enum_error(received: &str) -> String {
        let expected = Self::ALL
            .iter()
            .map(|size| format!("'{}'", size.as_str()))
            .collect::<Vec<_>>()
            .join(" | ");
        format!(
            "Invalid enum value. Expected {}, received {}",
            expected, received
        )
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = ValidationIssue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|size| size.as_str() == s)
            .ok_or_else(|| {
                ValidationIssue::new(
                    "size",
                    "invalid_enum_value",
                    Self::enum_error(&format!("'{}'", s)),
                )
            })
    }
}

/// One entry of the size picker, as served by `GET /api/sizes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeOption {
    pub value: ImageSize,
    pub label: String,
    pub description: String,
    pub width: u32,
    pub height: u32,
}

impl From<ImageSize> for SizeOption {
    fn from(size: ImageSize) -> Self {
        let (width, height) = size.dimensions();
        Self {
            value: size,
            label: size.label().to_string(),
            description: size.description().to_string(),
            width,
            height,
        }
    }
}

pub fn size_options() -> Vec<SizeOption> {
    ImageSize::ALL.iter().copied().map(SizeOption::from).collect()
}

/// A validated generation request. Build one with [`GenerationRequest::new`]
/// or [`GenerationRequest::validate`]; both enforce the same rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub prompt: String,
    pub size: ImageSize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_image: Option<String>,
}

impl GenerationRequest {
    pub fn new(
        prompt: impl Into<String>,
        size: ImageSize,
        base_image: Option<String>,
    ) -> Result<Self, ValidationErrors> {
        let request = Self {
            prompt: prompt.into(),
            size,
            base_image,
        };
        request.check()?;
        Ok(request)
    }

    /// Re-checks a request that may have been assembled field by field.
    pub fn check(&self) -> Result<(), ValidationErrors> {
        check_prompt(&self.prompt).map_err(|issue| ValidationErrors {
            issues: vec![issue],
        })
    }

    /// An empty `baseImage` counts as no image.
    pub fn is_edit(&self) -> bool {
        self.base_image
            .as_deref()
            .map_or(false, |image| !image.is_empty())
    }

    /// Validates an arbitrary JSON value, collecting every failing field.
    pub fn validate(input: &Value) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let Some(object) = input.as_object() else {
            errors.push(ValidationIssue::new(
                "",
                "invalid_type",
                format!("Expected object, received {}", type_name(input)),
            ));
            return Err(errors);
        };

        let prompt = match object.get("prompt") {
            None => {
                errors.push(required("prompt"));
                None
            }
            Some(Value::String(prompt)) => match check_prompt(prompt) {
                Ok(()) => Some(prompt.clone()),
                Err(issue) => {
                    errors.push(issue);
                    None
                }
            },
            Some(other) => {
                errors.push(wrong_type("prompt", other));
                None
            }
        };

        let size = match object.get("size") {
            None => {
                errors.push(required("size"));
                None
            }
            Some(Value::String(size)) => match size.parse::<ImageSize>() {
                Ok(size) => Some(size),
                Err(issue) => {
                    errors.push(issue);
                    None
                }
            },
            Some(other) => {
                errors.push(ValidationIssue::new(
                    "size",
                    "invalid_type",
                    ImageSize::enum_error(type_name(other)),
                ));
                None
            }
        };

        let base_image = match object.get("baseImage") {
            None => None,
            Some(Value::String(image)) => Some(image.clone()),
            Some(other) => {
                errors.push(wrong_type("baseImage", other));
                None
            }
        };

        match (prompt, size) {
            (Some(prompt), Some(size)) if errors.is_empty() => Ok(Self {
                prompt,
                size,
                base_image,
            }),
            _ => Err(errors),
        }
    }
}

/// Length is measured in UTF-16 code units, the unit browsers count in.
fn check_prompt(prompt: &str) -> Result<(), ValidationIssue> {
    let units = prompt.encode_utf16().count();
    if units == 0 {
        return Err(ValidationIssue::new(
            "prompt",
            "too_small",
            "Prompt is required",
        ));
    }
    if units > MAX_PROMPT_CHARS {
        return Err(ValidationIssue::new(
            "prompt",
            "too_big",
            "Prompt must be less than 1000 characters",
        ));
    }
    Ok(())
}

fn required(field: &str) -> ValidationIssue {
    ValidationIssue::new(field, "invalid_type", "Required")
}

fn wrong_type(field: &str, value: &Value) -> ValidationIssue {
    ValidationIssue::new(
        field,
        "invalid_type",
        format!("Expected string, received {}", type_name(value)),
    )
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
