//! Cache of compiled index schemas keyed by index name and type.

use std::collections::HashMap;
use std::sync::Arc;

use collection_indexer_repository::IndexDefinitionRepository;
use collection_indexer_schema::{IndexSchema, SchemaError};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::errors::IngestError;

type SchemaKey = (String, Option<String>);

/// Loads, compiles and caches index schemas.
///
/// A miss loads the raw definition from the repository, compiles it and
/// keeps it for the life of the process.
pub struct SchemaRegistry {
    repository: Arc<dyn IndexDefinitionRepository>,
    schemas: Mutex<HashMap<SchemaKey, Arc<IndexSchema>>>,
}

impl SchemaRegistry {
    pub fn new(repository: Arc<dyn IndexDefinitionRepository>) -> Self {
        Self {
            repository,
            schemas: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve the schema for `(name, index_type)`.
    ///
    /// An empty type is the same as no type.
    ///
    /// # Returns
    ///
    /// * `Ok(schema)` - Cached or freshly compiled schema
    /// * `Err(IngestError::SchemaError(DefinitionNotFound))` - No definition exists
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        name: &str,
        index_type: Option<&str>,
    ) -> Result<Arc<IndexSchema>, IngestError> {
        let index_type = index_type.filter(|t| !t.is_empty());
        let key: SchemaKey = (name.to_string(), index_type.map(str::to_string));

        if let Some(schema) = self.schemas.lock().await.get(&key) {
            debug!("Schema cache hit");
            return Ok(Arc::clone(schema));
        }

        let raw = self
            .repository
            .load(name, index_type)
            .await?
            .ok_or_else(|| SchemaError::definition_not_found(name, index_type))?;
        let schema = Arc::new(IndexSchema::from_definition(&raw)?);

        info!(
            index = schema.index(),
            collection = schema.collection(),
            joins = schema.joined_collections().len(),
            "Compiled index schema"
        );

        let mut schemas = self.schemas.lock().await;
        Ok(Arc::clone(schemas.entry(key).or_insert(schema)))
    }

    /// Number of cached schemas.
    pub async fn len(&self) -> usize {
        self.schemas.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
