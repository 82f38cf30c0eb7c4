//! Prompt-driven image generation and editing backed by Google Gemini.
//!
//! The server half validates `POST /api/generate-image` bodies, calls the
//! provider and answers with a base64 data URL. The client half runs the same
//! validation before submitting and can save the returned image to disk.

pub mod client;
pub mod config;
pub mod error;
pub mod gemini;
pub mod generator;
pub mod logger;
pub mod models;
#[cfg(feature = "server")]
pub mod server;

pub use client::{image_file_to_data_url, ImagenClient};
pub use config::{Config, GeminiConfig, ServerConfig};
pub use error::{ImagenError, ProviderError, Result, ValidationErrors, ValidationIssue};
pub use gemini::{GeminiClient, ImageProvider};
pub use generator::ImageGenerator;
pub use models::*;
