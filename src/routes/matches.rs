use actix_web::{http::Method, web, HttpResponse, Responder};
use tracing::Instrument;
use crate::core::RankError;
use crate::models::{ErrorResponse, HealthResponse, MatchDonorsResponse, MatchQuery};
use crate::routes::AppState;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

/// Configure ranking and health routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check)).service(
        web::resource("/match-donors")
            .route(web::post().to(match_donors))
            .route(web::method(Method::OPTIONS).to(preflight)),
    );
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = match state.repository.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!("Donor store health check failed: {}", e);
            false
        }
    };

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Cross-origin pre-flight for browser clients
async fn preflight() -> impl Responder {
    HttpResponse::Ok()
        .insert_header(("Access-Control-Allow-Origin", ALLOW_ORIGIN))
        .insert_header(("Access-Control-Allow-Headers", ALLOW_HEADERS))
        .finish()
}

/// Rank available donors for a blood request
///
/// POST /api/v1/match-donors
///
/// Request body:
/// ```json
/// {
///   "blood_group": "O-",
///   "city": "Pune",
///   "urgency": "low|medium|high"
/// }
/// ```
async fn match_donors(state: web::Data<AppState>, req: web::Json<MatchQuery>) -> HttpResponse {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("match_donors", %request_id);
    let query = req.into_inner();

    async move {
        match state.ranker.rank(&query).await {
            Ok(result) => HttpResponse::Ok().json(MatchDonorsResponse {
                matches: result.matches,
                insights: result.insights,
                recommendations: result.recommendations,
            }),
            Err(RankError::Validation(message)) => {
                tracing::info!("Rejected match request: {}", message);
                HttpResponse::BadRequest().json(ErrorResponse::new("Validation failed", message, 400))
            }
            Err(RankError::UpstreamFetch(e)) => {
                tracing::error!("Failed to fetch donors: {}", e);
                HttpResponse::InternalServerError().json(ErrorResponse::new(
                    "Failed to fetch donors",
                    e.to_string(),
                    500,
                ))
            }
        }
    }
    .instrument(span)
    .await
}
