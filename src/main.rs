use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use std::sync::Arc;
use study_buddy_match::config::{Settings, StorageBackend};
use study_buddy_match::core::{ConversationGate, Matcher};
use study_buddy_match::routes::{self, AppState};
use study_buddy_match::services::{
    CachedProfileStore, MatchStore, MemoryMatchStore, MemoryProfileStore, Moderator,
    PostgresStore, ProfileStore,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_tracing(level: &str, format: &str) {
    // RUST_LOG wins over the configured level
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

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_tracing(&settings.logging.level, &settings.logging.format);

    info!("Starting Study Buddy matching service...");

    // Initialize storage
    let (profiles, matches): (Arc<dyn ProfileStore>, Arc<dyn MatchStore>) = match settings.storage.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage, profiles and pairings are lost on restart");
            (
                Arc::new(MemoryProfileStore::new()) as Arc<dyn ProfileStore>,
                Arc::new(MemoryMatchStore::new()) as Arc<dyn MatchStore>,
            )
        }
        StorageBackend::Postgres => {
            let Some(url) = settings.database.url.as_deref() else {
                return Err(startup_error(
                    "PostgreSQL storage selected",
                    "database.url or DATABASE_URL must be set",
                ));
            };

            let store = Arc::new(
                PostgresStore::from_settings(
                    url,
                    settings.database.max_connections,
                    settings.database.min_connections,
                    settings.database.acquire_timeout_secs,
                    settings.database.idle_timeout_secs,
                )
                .await
                .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?,
            );

            info!("PostgreSQL store initialized");
            (store.clone() as Arc<dyn ProfileStore>, store as Arc<dyn MatchStore>)
        }
    };

    let cache_capacity = settings.cache.capacity.unwrap_or(10_000);
    let cache_ttl = settings.cache.ttl_secs.unwrap_or(300);
    let profiles: Arc<dyn ProfileStore> = Arc::new(CachedProfileStore::new(profiles, cache_capacity, cache_ttl));

    info!("Profile cache initialized ({} entries, TTL: {}s)", cache_capacity, cache_ttl);

    // Moderation rules from configuration, or the built-in set
    let moderator = if settings.moderation.rules.is_empty() {
        Moderator::with_default_rules()
    } else {
        Moderator::new(&settings.moderation.rules)
            .map_err(|e| startup_error("Invalid moderation rule", e))?
    }
    .with_valid_majors(&settings.moderation.valid_majors);

    info!(
        "Moderator initialized with {} rules, {} accepted majors",
        moderator.rule_count(),
        settings.moderation.valid_majors.len()
    );

    let weights = settings.scoring_weights();
    let matcher = Matcher::new(weights, settings.matching.acceptance_threshold);
    let gate = ConversationGate::new(settings.matching.message_cap);

    info!(
        "Matcher initialized with weights: {:?}, threshold: {}, message cap: {}",
        weights,
        settings.matching.acceptance_threshold,
        settings.matching.message_cap
    );

    // Build application state
    let app_state = AppState::new(profiles, matches, moderator, matcher, gate);

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
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
