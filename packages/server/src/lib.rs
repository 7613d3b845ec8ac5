#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web server for the Traffy Fondue complaint API.
//!
//! Proxies single pages of the upstream API (structured and CSV) and runs
//! the multi-page ingestion loops that copy complaints into `MongoDB`.
//! The most recent structured page is kept in an [`IngestionCache`] shared
//! by every request; its `total` sizes the ingestion loops.

mod handlers;
pub mod validation;

use std::sync::Arc;

use actix_web::{App, HttpServer, middleware, web};
use fondue_database::{DbError, DocumentSink, db};
use fondue_ingest::IngestionCache;
use fondue_ingest_models::{CSV_PAGE_SIZE, FEATURE_PAGE_SIZE, PageSizes};
use fondue_source::client::TraffyClient;
use fondue_source::{ComplaintSource, SourceError};
use fondue_source_models::PageQuery;

/// Shared application state.
pub struct AppState {
    /// Upstream complaint API.
    pub source: Arc<dyn ComplaintSource>,
    /// Document store the ingestion routes write to.
    pub sink: Arc<dyn DocumentSink>,
    /// Most recently fetched structured page.
    pub cache: Arc<IngestionCache>,
    /// Divisors used to plan ingestion loops.
    pub page_sizes: PageSizes,
}

/// Errors that stop the server from starting or keep it from running.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Database(#[from] DbError),

    #[error("Initial fetch failed: {0}")]
    InitialFetch(#[from] SourceError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Listener and ingestion settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    pub page_sizes: PageSizes,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 8000,
            page_sizes: PageSizes::default(),
        }
    }
}

impl ServerConfig {
    /// Reads `BIND_ADDR`, `PORT`, `FONDUE_CSV_PAGE_SIZE` and
    /// `FONDUE_FEATURE_PAGE_SIZE`, falling back to the defaults for any
    /// that are unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: env_parse("PORT").unwrap_or(defaults.port),
            page_sizes: PageSizes {
                csv: env_parse("FONDUE_CSV_PAGE_SIZE").unwrap_or(CSV_PAGE_SIZE),
                features: env_parse("FONDUE_FEATURE_PAGE_SIZE").unwrap_or(FEATURE_PAGE_SIZE),
            },
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Registers every route on `cfg`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::fetch_page))
        .route("/topojson", web::get().to(handlers::fetch_csv_page))
        .route("/saveToMongoDB", web::post().to(handlers::save_features))
        .route("/saveToMongoDBCSV", web::post().to(handlers::save_complaints))
        .route("/health", web::get().to(handlers::health));
}

/// Starts the complaint API server.
///
/// Connects to `MongoDB`, primes the cache with one unbounded structured
/// fetch, and starts the Actix-Web HTTP server. The caller provides the
/// async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if the database is unreachable, the priming
/// fetch fails, or the HTTP server fails to bind or run.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> Result<(), ServerError> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env();

    log::info!("Connecting to database...");
    let sink = db::connect_from_env().await?;
    log::info!("Writing to collection {}", sink.collection_name());

    let source = TraffyClient::from_env();
    log::info!("Priming cache from {}...", source.base_url());
    let cache = IngestionCache::default();
    let primed = cache.refresh(&source, &PageQuery::unbounded()).await?;
    log::info!("Upstream reports {} record(s)", primed.total);

    let state = web::Data::new(AppState {
        source: Arc::new(source),
        sink: Arc::new(sink),
        cache: Arc::new(cache),
        page_sizes: config.page_sizes,
    });

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await?;

    Ok(())
}
