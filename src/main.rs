use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use donor_match::config::{RepositoryBackend, Settings};
use donor_match::core::DonorMatchRanker;
use donor_match::routes::{self, AppState};
use donor_match::services::{AiGatewayClient, DonorRepository, PostgresRepository, RankingService, SupabaseClient};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

async fn build_repository(settings: &Settings) -> io::Result<Arc<dyn DonorRepository>> {
    match settings.repository.backend {
        RepositoryBackend::Rest => {
            let timeout = Duration::from_secs(settings.supabase.timeout_secs.unwrap_or(30));
            let client = SupabaseClient::new(
                settings.supabase.url.clone(),
                settings.supabase.service_role_key.clone(),
                timeout,
            )
            .map_err(|e| startup_error("Failed to create Supabase client", e))?;

            info!("Supabase REST repository initialized");
            Ok(Arc::new(client))
        }
        RepositoryBackend::Postgres => {
            let db = settings
                .database
                .as_ref()
                .ok_or_else(|| startup_error("Configuration error", "database.url is required for the postgres backend"))?;

            let repo = PostgresRepository::from_settings(
                &db.url,
                db.max_connections,
                db.min_connections,
                db.acquire_timeout_secs,
                db.idle_timeout_secs,
            )
            .await
            .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?;

            info!("PostgreSQL repository initialized (max: {} connections)", db.max_connections.unwrap_or(10));
            Ok(Arc::new(repo))
        }
    }
}

fn build_ranking_service(settings: &Settings) -> io::Result<Option<Arc<dyn RankingService>>> {
    let ranking = &settings.ranking;
    if !ranking.is_active() {
        warn!("AI ranking disabled, donors will be ordered by location and experience");
        return Ok(None);
    }

    let client = AiGatewayClient::new(
        ranking.endpoint.clone(),
        ranking.api_key.clone(),
        ranking.model.clone(),
        ranking.timeout(),
    )
    .map_err(|e| startup_error("Failed to create AI gateway client", e))?;

    info!("AI ranking enabled (model: {}, timeout: {}s)", ranking.model, ranking.timeout_secs);
    Ok(Some(Arc::new(client)))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(io::Error::new(io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_logging(&settings.logging.level, &settings.logging.format);

    info!("Starting donor match service...");

    let repository = build_repository(&settings).await?;
    let ranking = build_ranking_service(&settings)?;
    let ranker = DonorMatchRanker::new(repository.clone(), ranking, settings.ranking.timeout());

    let app_state = AppState::new(ranker, repository);

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .configure(routes::configure_extractors)
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
