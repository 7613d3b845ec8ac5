//! Database connection utilities.

use mongodb::Client;
use mongodb::bson::doc;

use crate::DbError;
use crate::sink::MongoSink;

/// Connection string used when `MONGODB_URI` is unset.
pub const DEFAULT_URI: &str = "mongodb://localhost:27023";
/// Database used when `MONGODB_DATABASE` is unset.
pub const DEFAULT_DATABASE: &str = "traffyFondue";
/// Collection used when `MONGODB_COLLECTION` is unset.
pub const DEFAULT_COLLECTION: &str = "postsTraffyFondue";

/// Where ingested documents are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl DbConfig {
    /// Reads `MONGODB_URI`, `MONGODB_DATABASE`, and `MONGODB_COLLECTION`,
    /// falling back to the defaults for any that are unset.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            uri: std::env::var("MONGODB_URI").unwrap_or(defaults.uri),
            database: std::env::var("MONGODB_DATABASE").unwrap_or(defaults.database),
            collection: std::env::var("MONGODB_COLLECTION").unwrap_or(defaults.collection),
        }
    }
}

/// Connects to the store described by `config` and verifies it answers a
/// `ping`.
///
/// The driver connects lazily, so without the ping an unreachable server
/// would only surface on the first insert.
///
/// # Errors
///
/// Returns [`DbError`] if the connection string is invalid or the server
/// does not answer.
pub async fn connect(config: &DbConfig) -> Result<MongoSink, DbError> {
    log::info!(
        "Connecting to MongoDB ({}/{})...",
        config.database,
        config.collection
    );

    let client = Client::with_uri_str(&config.uri).await?;
    let database = client.database(&config.database);
    database.run_command(doc! { "ping": 1 }).await?;

    log::info!("Connected to MongoDB");

    Ok(MongoSink::new(database.collection(&config.collection)))
}

/// Connects using [`DbConfig::from_env`].
///
/// # Errors
///
/// Returns [`DbError`] if the connection or the initial ping fails.
pub async fn connect_from_env() -> Result<MongoSink, DbError> {
    connect(&DbConfig::from_env()).await
}
