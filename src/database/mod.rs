//! Database connection and document storage
//!
//! The document store trait is always available; the Postgres connection
//! manager and store are compiled with the `database` feature.

pub mod document_store;

pub use document_store::{Collection, Document, DocumentStore, InMemoryDocumentStore};

#[cfg(feature = "database")]
pub use document_store::PgDocumentStore;

#[cfg(feature = "database")]
pub use manager::{DatabaseConfig, DatabaseManager};

#[cfg(feature = "database")]
mod manager {
    use sqlx::{postgres::PgPoolOptions, PgPool};
    use std::time::Duration;
    use tracing::{info, warn};

    use super::{mask_database_url, PgDocumentStore};
    use crate::config::GalileoConfig;
    use crate::error::StoreError;

    /// Database configuration
    #[derive(Debug, Clone)]
    pub struct DatabaseConfig {
        pub database_url: String,
        pub max_connections: u32,
        pub connection_timeout: Duration,
        pub idle_timeout: Option<Duration>,
    }

    impl DatabaseConfig {
        pub fn from_config(config: &GalileoConfig) -> Self {
            Self {
                database_url: config.database_url.clone(),
                max_connections: config.database_pool_size,
                connection_timeout: Duration::from_secs(30),
                idle_timeout: Some(Duration::from_secs(600)),
            }
        }
    }

    /// Database connection manager
    pub struct DatabaseManager {
        pool: PgPool,
    }

    impl DatabaseManager {
        /// Connect with the given configuration
        pub async fn new(config: DatabaseConfig) -> Result<Self, sqlx::Error> {
            info!(
                "Connecting to database: {}",
                mask_database_url(&config.database_url)
            );

            let mut pool_options = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(config.connection_timeout);

            if let Some(idle_timeout) = config.idle_timeout {
                pool_options = pool_options.idle_timeout(idle_timeout);
            }

            let pool = pool_options
                .connect(&config.database_url)
                .await
                .map_err(|e| {
                    warn!("Failed to connect to database: {}", e);
                    e
                })?;

            info!("Database connection pool created successfully");

            Ok(Self { pool })
        }

        pub fn pool(&self) -> &PgPool {
            &self.pool
        }

        /// Document store over this pool, with its table created
        pub async fn document_store(&self) -> Result<PgDocumentStore, StoreError> {
            let store = PgDocumentStore::new(self.pool.clone());
            store.ensure_schema().await?;
            Ok(store)
        }

        /// Close the connection pool
        pub async fn close(self) {
            info!("Closing database connection pool");
            self.pool.close().await;
        }
    }
}

/// Mask the password in a database URL for logging
pub fn mask_database_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let mut masked = parsed.clone();
        if parsed.password().is_some() {
            let _ = masked.set_password(Some("***"));
        }
        masked.to_string()
    } else {
        "invalid-url".to_string()
    }
}
