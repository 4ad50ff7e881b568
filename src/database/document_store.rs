//! Document store abstraction
//!
//! Reference data (survey questions, boards, examples) is kept as opaque JSON
//! documents grouped into named collections. The seed loader is the only
//! writer.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::error::StoreError;

/// A stored document: an arbitrary JSON object
pub type Document = Map<String, Value>;

/// The three reference-data collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    SurveyQuestions,
    Boards,
    Examples,
}

impl Collection {
    /// All collections, in seeding order
    pub const ALL: [Collection; 3] = [
        Collection::SurveyQuestions,
        Collection::Boards,
        Collection::Examples,
    ];

    /// Collection name in the store
    pub fn name(&self) -> &'static str {
        match self {
            Collection::SurveyQuestions => "survey_questions",
            Collection::Boards => "galileo_boards",
            Collection::Examples => "galileo_examples",
        }
    }

    /// Fixture file that seeds this collection
    pub fn fixture_file(&self) -> &'static str {
        match self {
            Collection::SurveyQuestions => "survey_questions.json",
            Collection::Boards => "galileo_boards.json",
            Collection::Examples => "galileo_examples.json",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Abstract document storage
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Discard every document in the collection
    async fn clear(&self, collection: Collection) -> Result<(), StoreError>;

    /// Insert a single document
    async fn insert(&self, collection: Collection, document: Document) -> Result<(), StoreError>;

    /// Number of documents currently in the collection
    async fn count(&self, collection: Collection) -> Result<u64, StoreError>;
}

/// In-memory store, used by tests and `--memory` runs
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<Collection, Vec<Document>>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a collection's documents, in insertion order
    pub async fn documents(&self, collection: Collection) -> Vec<Document> {
        self.collections
            .read()
            .await
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn clear(&self, collection: Collection) -> Result<(), StoreError> {
        self.collections.write().await.remove(&collection);
        Ok(())
    }

    async fn insert(&self, collection: Collection, document: Document) -> Result<(), StoreError> {
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .push(document);
        Ok(())
    }

    async fn count(&self, collection: Collection) -> Result<u64, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .get(&collection)
            .map_or(0, |docs| docs.len() as u64))
    }
}

#[cfg(feature = "database")]
pub use pg::PgDocumentStore;

#[cfg(feature = "database")]
mod pg {
    use super::*;
    use sqlx::PgPool;

    /// Postgres-backed store: one JSONB row per document
    #[derive(Clone)]
    pub struct PgDocumentStore {
        pool: PgPool,
    }

    impl PgDocumentStore {
        pub fn new(pool: PgPool) -> Self {
            Self { pool }
        }

        /// Create the documents table if it does not exist yet
        pub async fn ensure_schema(&self) -> Result<(), StoreError> {
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS galileo_documents (
                    id BIGSERIAL PRIMARY KEY,
                    collection TEXT NOT NULL,
                    document JSONB NOT NULL,
                    inserted_at TIMESTAMPTZ NOT NULL DEFAULT now()
                )
                "#,
            )
            .execute(&self.pool)
            .await?;

            sqlx::query(
                r#"CREATE INDEX IF NOT EXISTS galileo_documents_collection_idx
                   ON galileo_documents (collection)"#,
            )
            .execute(&self.pool)
            .await?;

            Ok(())
        }
    }

    #[async_trait]
    impl DocumentStore for PgDocumentStore {
        async fn clear(&self, collection: Collection) -> Result<(), StoreError> {
            sqlx::query("DELETE FROM galileo_documents WHERE collection = $1")
                .bind(collection.name())
                .execute(&self.pool)
                .await?;
            Ok(())
        }

        async fn insert(
            &self,
            collection: Collection,
            document: Document,
        ) -> Result<(), StoreError> {
            sqlx::query("INSERT INTO galileo_documents (collection, document) VALUES ($1, $2)")
                .bind(collection.name())
                .bind(sqlx::types::Json(Value::Object(document)))
                .execute(&self.pool)
                .await?;
            Ok(())
        }

        async fn count(&self, collection: Collection) -> Result<u64, StoreError> {
            let (count,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM galileo_documents WHERE collection = $1")
                    .bind(collection.name())
                    .fetch_one(&self.pool)
                    .await?;
            Ok(count.max(0) as u64)
        }
    }
}
