use crate::error::{ImagenError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;

pub const DEFAULT_MIME_TYPE: &str = "image/png";

const BASE64_MARKER: &str = "base64,";

/// A `data:<mime>;base64,<payload>` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    mime_type: String,
    data: String,
}

impl DataUrl {
    pub fn new(mime_type: Option<&str>, data: impl Into<String>) -> Self {
        let mime_type = mime_type
            .filter(|mime| !mime.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE);

        Self {
            mime_type: mime_type.to_string(),
            data: data.into(),
        }
    }

    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self::new(Some(mime_type), STANDARD.encode(bytes))
    }

    pub fn parse(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| ImagenError::Serialization("not a data URL".into()))?;
        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| ImagenError::Serialization("data URL has no payload".into()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| ImagenError::Serialization("data URL is not base64 encoded".into()))?;

        Ok(Self::new(Some(mime_type), data))
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.data.as_bytes())
            .map_err(|e| ImagenError::Serialization(format!("invalid base64 payload: {}", e)))
    }

    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Raw base64 from a value that may or may not carry a data-URL header.
pub fn strip_prefix(image: &str) -> &str {
    match image.split_once(BASE64_MARKER) {
        Some((_, data)) => data,
        None => image,
    }
}

/// MIME type declared by a data-URL header, if there is one.
pub fn declared_mime_type(image: &str) -> Option<&str> {
    let (header, _) = image.split_once(BASE64_MARKER)?;
    header
        .strip_prefix("data:")?
        .strip_suffix(';')
        .filter(|mime| !mime.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_mime_and_payload() {
        let url = DataUrl::new(Some("image/jpeg"), "Zm9v");
        assert_eq!(url.to_string(), "data:image/jpeg;base64,Zm9v");
    }

    #[test]
    fn missing_mime_defaults_to_png() {
        assert_eq!(DataUrl::new(None, "AAAA").to_string(), "data:image/png;base64,AAAA");
        assert_eq!(DataUrl::new(Some(""), "AAAA").mime_type(), "image/png");
    }

    #[test]
    fn strips_header_when_present() {
        assert_eq!(strip_prefix("data:image/png;base64,AAAA"), "AAAA");
        assert_eq!(strip_prefix("AAAA"), "AAAA");
        assert_eq!(declared_mime_type("data:image/webp;base64,AAAA"), Some("image/webp"));
        assert_eq!(declared_mime_type("AAAA"), None);
    }

    #[test]
    fn parses_and_decodes() {
        let url = DataUrl::parse("data:image/jpeg;base64,Zm9v").unwrap();
        assert_eq!(url.mime_type(), "image/jpeg");
        assert_eq!(url.extension(), "jpg");
        assert_eq!(url.decode().unwrap(), b"foo");

        assert!(DataUrl::parse("https://example.com/a.png").is_err());
        assert!(DataUrl::parse("data:image/png,rawtext").is_err());
    }
}
