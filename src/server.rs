use crate::{
    config::Config,
    error::{ImagenError, Result, ValidationErrors, ValidationIssue},
    gemini::{GeminiClient, ImageProvider},
    generator::ImageGenerator,
    models::{size_options, ErrorResponse, GenerationRequest, ImageGenerationResponse},
};
use actix_web::{
    http::StatusCode, middleware, web, App, HttpResponse, HttpServer, ResponseError,
};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    generator: ImageGenerator,
}

impl AppState {
    pub fn new(config: Config, provider: Arc<dyn ImageProvider>) -> Self {
        let generator = ImageGenerator::new(provider, config.gemini.model.clone());
        Self {
            config: Arc::new(config),
            generator,
        }
    }

    /// State backed by the real Gemini client.
    pub fn from_config(config: Config) -> Result<Self> {
        let provider = GeminiClient::new(&config.gemini)?;
        Ok(Self::new(config, Arc::new(provider)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Errors surfaced by the HTTP handlers.
#[derive(Debug)]
pub struct ApiError(ImagenError);

impl From<ImagenError> for ApiError {
    fn from(err: ImagenError) -> Self {
        ApiError(err)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError(ImagenError::Validation(errors))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            ImagenError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match &self.0 {
            ImagenError::Validation(errors) => ErrorResponse::invalid(errors),
            other => ErrorResponse::new(other.to_string()),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

async fn generate_image(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> std::result::Result<HttpResponse, ApiError> {
    let request_id = Uuid::new_v4();

    let payload: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        log::warn!("[req:{}] Rejected malformed JSON body: {}", request_id, e);
        ValidationErrors {
            issues: vec![ValidationIssue::new("", "invalid_json", e.to_string())],
        }
    })?;

    let request = GenerationRequest::validate(&payload).map_err(|errors| {
        log::warn!("[req:{}] {}", request_id, errors);
        errors
    })?;

    if !state.config.gemini.has_api_key() {
        log::error!("[req:{}] GEMINI_API_KEY is not configured", request_id);
        return Err(ImagenError::MissingCredential.into());
    }

    log::info!(
        "[req:{}] Generating {} image ({} prompt chars)",
        request_id,
        request.size,
        request.prompt.chars().count()
    );

    let image_data = state
        .generator
        .generate_request(&request)
        .await
        .map_err(|e| {
            log::error!("[req:{}] Error generating image: {}", request_id, e);
            e
        })?;

    Ok(HttpResponse::Ok().json(ImageGenerationResponse { image_data }))
}

async fn list_sizes() -> HttpResponse {
    HttpResponse::Ok().json(size_options())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/generate-image", web::post().to(generate_image))
            .route("/sizes", web::get().to(list_sizes)),
    );
}

/// Binds and runs the HTTP server until shutdown.
pub async fn run(state: AppState) -> Result<()> {
    let host = state.config.server.host.clone();
    let port = state.config.server.port;
    let data = web::Data::new(state);

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .app_data(web::PayloadConfig::new(MAX_BODY_BYTES))
            .wrap(middleware::Logger::new("%r %s %b %Dms"))
            .configure(configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    Ok(())
}

/// Edit requests carry a whole base64 image in the JSON body.
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;
