//! Fixture seeding
//!
//! Repopulates the reference-data collections from JSON fixture files.
//! A reload is destructive: every collection is cleared before its fixture
//! is read, and a failure in one collection is logged and skipped so the
//! remaining collections still load. There is no rollback.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::database::{Collection, Document, DocumentStore};
use crate::error::SeedError;

/// Outcome of loading one collection
#[derive(Debug, Clone, Serialize)]
pub struct CollectionLoad {
    pub collection: &'static str,
    pub inserted: usize,
    pub error: Option<String>,
}

impl CollectionLoad {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-collection results of a reload
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeedReport {
    pub collections: Vec<CollectionLoad>,
}

impl SeedReport {
    pub fn all_succeeded(&self) -> bool {
        self.collections.iter().all(CollectionLoad::succeeded)
    }

    pub fn total_inserted(&self) -> usize {
        self.collections.iter().map(|c| c.inserted).sum()
    }

    pub fn get(&self, collection: Collection) -> Option<&CollectionLoad> {
        self.collections
            .iter()
            .find(|c| c.collection == collection.name())
    }
}

/// Loads the fixture files into the document store
pub struct SeedLoader {
    store: Arc<dyn DocumentStore>,
    fixtures_dir: PathBuf,
}

impl SeedLoader {
    pub fn new(store: Arc<dyn DocumentStore>, fixtures_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            fixtures_dir: fixtures_dir.into(),
        }
    }

    pub fn fixtures_dir(&self) -> &Path {
        &self.fixtures_dir
    }

    /// Fail early when the fixtures directory is absent
    pub fn check_fixtures_dir(&self) -> Result<(), SeedError> {
        if self.fixtures_dir.is_dir() {
            Ok(())
        } else {
            Err(SeedError::MissingFixturesDir {
                path: self.fixtures_dir.clone(),
            })
        }
    }

    /// Clear and reload every collection.
    ///
    /// Never fails: per-collection errors are logged and recorded in the
    /// returned report.
    pub async fn reload(&self) -> SeedReport {
        info!(
            "Reloading reference data from {}",
            self.fixtures_dir.display()
        );

        let mut report = SeedReport::default();
        for collection in Collection::ALL {
            let load = match self.reload_collection(collection).await {
                Ok(inserted) => {
                    info!("Loaded {} documents into {}", inserted, collection);
                    CollectionLoad {
                        collection: collection.name(),
                        inserted,
                        error: None,
                    }
                }
                Err(e) => {
                    error!("Error loading {}: {}", collection, e);
                    CollectionLoad {
                        collection: collection.name(),
                        inserted: 0,
                        error: Some(e.to_string()),
                    }
                }
            };
            report.collections.push(load);
        }

        report
    }

    async fn reload_collection(&self, collection: Collection) -> Result<usize, SeedError> {
        self.store.clear(collection).await?;

        let path = self.fixtures_dir.join(collection.fixture_file());
        let documents = read_fixture(&path).await?;
        let count = documents.len();

        for document in documents {
            self.store.insert(collection, document).await?;
        }

        Ok(count)
    }
}

/// Read a fixture file as a JSON array of objects
pub async fn read_fixture(path: &Path) -> Result<Vec<Document>, SeedError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let value: Value = serde_json::from_str(&raw).map_err(|source| SeedError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let Value::Array(items) = value else {
        return Err(SeedError::NotAnArray {
            path: path.to_path_buf(),
        });
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(map),
            _ => Err(SeedError::NotAnObject {
                path: path.to_path_buf(),
                index,
            }),
        })
        .collect()
}
