// Route exports
pub mod connections;
pub mod donors;
pub mod matches;

use actix_web::{error, http::StatusCode, web, HttpRequest, HttpResponse};
use std::sync::Arc;
use crate::core::DonorMatchRanker;
use crate::models::ErrorResponse;
use crate::services::{DonorRepository, RepositoryError};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub ranker: DonorMatchRanker,
    pub repository: Arc<dyn DonorRepository>,
}

impl AppState {
    pub fn new(ranker: DonorMatchRanker, repository: Arc<dyn DonorRepository>) -> Self {
        Self { ranker, repository }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(matches::configure)
            .configure(donors::configure)
            .configure(connections::configure),
    );
}

/// JSON error for rejected payloads
#[derive(Debug)]
pub struct JsonError(ErrorResponse);

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.0.error, self.0.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(&self.0)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError(ErrorResponse::new("invalid_json", format!("Invalid JSON: {}", err), 400)).into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    JsonError(ErrorResponse::new("invalid_query", format!("Invalid query: {}", err), 400)).into()
}

/// Register the payload error handlers on an app or scope
pub fn configure_extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
        .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error));
}

pub(crate) fn bad_request(error: &str, message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse::new(error, message, 400))
}

/// Map a repository failure onto an HTTP response
pub(crate) fn repository_error_response(context: &str, err: &RepositoryError) -> HttpResponse {
    match err {
        RepositoryError::NotFound(what) => {
            HttpResponse::NotFound().json(ErrorResponse::new("Not found", what.clone(), 404))
        }
        _ => {
            tracing::error!("{}: {}", context, err);
            HttpResponse::InternalServerError().json(ErrorResponse::new(context, err.to_string(), 500))
        }
    }
}

/// UUID check for ids supplied by clients
pub(crate) fn is_uuid(value: &str) -> bool {
    uuid::Uuid::parse_str(value).is_ok()
}
