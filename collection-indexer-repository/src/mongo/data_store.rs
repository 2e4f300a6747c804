//! MongoDB implementation of [`DataStore`].

use async_trait::async_trait;
use bson::{doc, Document};
use futures::{StreamExt, TryStreamExt};
use mongodb::{Client, Collection, Database};
use tracing::{debug, info, instrument};

use crate::config::StoreConfig;
use crate::errors::RepositoryError;
use crate::interfaces::DataStore;
use crate::types::DocumentStream;

/// Document store backed by one MongoDB database.
pub struct MongoDataStore {
    database: Database,
}

impl MongoDataStore {
    /// Connect to the configured database and check it answers.
    ///
    /// # Returns
    ///
    /// * `Ok(MongoDataStore)` - A connected store
    /// * `Err(RepositoryError)` - If the URI is invalid or the server does not answer a ping
    pub async fn connect(config: &StoreConfig) -> Result<Self, RepositoryError> {
        let client = Client::with_uri_str(&config.uri)
            .await
            .map_err(|e| RepositoryError::connection(e.to_string()))?;
        let database = client.database(&config.database);

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| RepositoryError::connection(e.to_string()))?;

        info!(database = %config.database, "Connected to MongoDB");
        Ok(Self { database })
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection::<Document>(name)
    }
}

#[async_trait]
impl DataStore for MongoDataStore {
    #[instrument(skip(self, filter, projection), fields(collection = %collection))]
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> Result<Vec<Document>, RepositoryError> {
        let coll = self.collection(collection);
        let mut find = coll.find(filter);
        if let Some(projection) = projection {
            find = find.projection(projection);
        }

        let documents: Vec<Document> = find
            .await
            .map_err(|e| RepositoryError::query(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| RepositoryError::query(e.to_string()))?;

        debug!(count = documents.len(), "Find completed");
        Ok(documents)
    }

    #[instrument(skip(self, projection), fields(collection = %collection))]
    async fn scan(
        &self,
        collection: &str,
        projection: Option<Document>,
    ) -> Result<DocumentStream, RepositoryError> {
        let coll = self.collection(collection);
        let mut find = coll.find(doc! {});
        if let Some(projection) = projection {
            find = find.projection(projection);
        }

        let cursor = find.await.map_err(|e| RepositoryError::query(e.to_string()))?;
        info!("Collection scan started");
        Ok(cursor.map_err(|e| RepositoryError::query(e.to_string())).boxed())
    }
}
