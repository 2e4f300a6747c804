//! Resolve, join and transform stages of the pipeline.

use std::sync::Arc;

use bson::{Bson, Document};
use collection_indexer_repository::DataStore;
use collection_indexer_schema::IndexSchema;
use collection_indexer_shared::{IndexAction, IndexEvent};
use tracing::{debug, instrument};

use crate::consumer::SourceItem;
use crate::errors::IngestError;
use crate::registry::SchemaRegistry;

/// A working document paired with the schema and action that apply to it.
#[derive(Debug, Clone)]
pub struct ResolvedDocument {
    pub schema: Arc<IndexSchema>,
    pub action: IndexAction,
    pub document: Document,
}

impl ResolvedDocument {
    /// A document produced by a collection scan is always indexed.
    pub fn scanned(schema: Arc<IndexSchema>, document: Document) -> Self {
        Self {
            schema,
            action: IndexAction::Index,
            document,
        }
    }
}

/// Turns source items into bulk NDJSON entries.
///
/// The processor is responsible for:
/// - Resolving events to their schema and stored document
/// - Attaching documents from joined collections
/// - Rendering index and delete entries
pub struct DocumentProcessor {
    store: Arc<dyn DataStore>,
    registry: Arc<SchemaRegistry>,
}

impl DocumentProcessor {
    pub fn new(store: Arc<dyn DataStore>, registry: Arc<SchemaRegistry>) -> Self {
        Self { store, registry }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Resolve an event into its working document.
    ///
    /// Deletes never touch the store: the identifier filter is the document.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(_))` - The working document
    /// * `Ok(None)` - The event refers to a document that no longer exists
    #[instrument(skip(self, event), fields(id = %event.id, index = %event.index_name))]
    pub async fn resolve(
        &self,
        event: &IndexEvent,
    ) -> Result<Option<ResolvedDocument>, IngestError> {
        let schema = self
            .registry
            .resolve(&event.index_name, event.index_type.as_deref())
            .await?;
        let filter = event.id_filter()?;

        if event.action == IndexAction::Delete {
            return Ok(Some(ResolvedDocument {
                schema,
                action: IndexAction::Delete,
                document: filter,
            }));
        }

        let found = self
            .store
            .find(schema.collection(), filter, schema.projection())
            .await?;

        match found.into_iter().next() {
            Some(document) => Ok(Some(ResolvedDocument {
                schema,
                action: IndexAction::Index,
                document,
            })),
            None => {
                debug!(collection = schema.collection(), "Document not found, skipping event");
                Ok(None)
            }
        }
    }

    /// Resolve any source item. Scanned documents are already resolved.
    pub async fn resolve_item(
        &self,
        item: SourceItem,
    ) -> Result<Option<ResolvedDocument>, IngestError> {
        match item {
            SourceItem::Event(event) => self.resolve(&event).await,
            SourceItem::Scanned { schema, document } => {
                Ok(Some(ResolvedDocument::scanned(schema, document)))
            }
        }
    }

    /// Attach the documents of every joined collection.
    ///
    /// Deletes and documents holding nothing but their identifier pass through
    /// untouched.
    pub async fn join(
        &self,
        mut resolved: ResolvedDocument,
    ) -> Result<ResolvedDocument, IngestError> {
        if resolved.action == IndexAction::Delete || resolved.document.len() <= 1 {
            return Ok(resolved);
        }

        let schema = Arc::clone(&resolved.schema);
        let conditions = schema.join_conditions(&resolved.document)?;

        let mut joined = Vec::with_capacity(conditions.len());
        for condition in conditions {
            let documents = self
                .store
                .find(
                    &condition.collection.from,
                    condition.filter,
                    condition.collection.projection_document(),
                )
                .await?;
            debug!(
                from = %condition.collection.from,
                count = documents.len(),
                "Joined documents"
            );
            joined.push((
                condition.collection.joined_field_name.clone(),
                documents.into_iter().map(Bson::Document).collect::<Vec<_>>(),
            ));
        }

        for (field, documents) in joined {
            resolved.document.insert(field, Bson::Array(documents));
        }
        Ok(resolved)
    }

    /// Render the bulk entry for a resolved document.
    pub fn transform(resolved: ResolvedDocument) -> Result<String, IngestError> {
        let ResolvedDocument {
            schema,
            action,
            document,
        } = resolved;

        let line = match action {
            IndexAction::Index => schema.build_index_line(document)?,
            IndexAction::Delete => schema.build_delete_line(&document)?,
        };
        Ok(line)
    }

    /// Join then transform.
    pub async fn process(&self, resolved: ResolvedDocument) -> Result<String, IngestError> {
        let joined = self.join(resolved).await?;
        Self::transform(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bson::{doc, oid::ObjectId};
    use collection_indexer_repository::{DocumentStream, IndexDefinitionRepository, RepositoryError};
    use serde_json::{json, Value};
    use std::sync::Mutex;

    const BOOK_ID: &str = "65a1b2c3d4e5f60718293a4b";
    const AUTHOR_ID: &str = "507f191e810c19729de860ea";

    struct MockStore {
        finds: Mutex<Vec<(String, Document)>>,
    }

    #[async_trait]
    impl DataStore for MockStore {
        async fn find(
            &self,
            collection: &str,
            filter: Document,
            _projection: Option<Document>,
        ) -> Result<Vec<Document>, RepositoryError> {
            self.finds
                .lock()
                .unwrap()
                .push((collection.to_string(), filter.clone()));
            let book = ObjectId::parse_str(BOOK_ID).unwrap();
            let author = ObjectId::parse_str(AUTHOR_ID).unwrap();
            Ok(match collection {
                "book" if filter.get_object_id("_id").ok() == Some(book) => {
                    vec![doc! {"_id": book, "title": "Dune", "authorId": AUTHOR_ID, "year": 1965}]
                }
                "author" if filter.get_object_id("_id").ok() == Some(author) => {
                    vec![doc! {"_id": author, "name": "Frank", "born": 1920}]
                }
                _ => Vec::new(),
            })
        }

        async fn scan(
            &self,
            _collection: &str,
            _projection: Option<Document>,
        ) -> Result<DocumentStream, RepositoryError> {
            Err(RepositoryError::query("scan not supported"))
        }
    }

    struct StaticDefinitions;

    #[async_trait]
    impl IndexDefinitionRepository for StaticDefinitions {
        async fn load(
            &self,
            _name: &str,
            _index_type: Option<&str>,
        ) -> Result<Option<Value>, RepositoryError> {
            Ok(Some(json!({
                "index": "books",
                "source": {
                    "collection": "book",
                    "fields": ["title"],
                    "joinedCollections": [{
                        "from": "author",
                        "localField": "authorId",
                        "foreignField": "_id",
                        "convertLocalField": "ObjectId",
                        "as": "author",
                        "fields": ["name"]
                    }]
                }
            })))
        }
    }

    fn processor() -> (Arc<MockStore>, DocumentProcessor) {
        let store = Arc::new(MockStore {
            finds: Mutex::new(Vec::new()),
        });
        let registry = Arc::new(SchemaRegistry::new(Arc::new(StaticDefinitions)));
        (store.clone(), DocumentProcessor::new(store, registry))
    }

    #[tokio::test]
    async fn test_index_event_resolves_joins_and_renders() {
        let (store, processor) = processor();
        let event = IndexEvent::new(IndexAction::Index, BOOK_ID, "books", None);

        let resolved = processor.resolve(&event).await.unwrap().unwrap();
        let line = processor.process(resolved).await.unwrap();

        let lines: Vec<&str> = line.lines().collect();
        assert_eq!(
            lines[0],
            format!(r#"{{"index":{{"_index":"books","_id":"{}"}}}}"#, BOOK_ID)
        );
        assert_eq!(lines[1], r#"{"title":"Dune","author":[{"name":"Frank"}]}"#);

        let finds = store.finds.lock().unwrap();
        assert_eq!(finds.len(), 2);
        assert_eq!(finds[1].0, "author");
    }

    #[tokio::test]
    async fn test_delete_event_skips_the_store() {
        let (store, processor) = processor();
        let event = IndexEvent::new(IndexAction::Delete, BOOK_ID, "books", None);

        let resolved = processor.resolve(&event).await.unwrap().unwrap();
        let line = processor.process(resolved).await.unwrap();

        assert_eq!(
            line,
            format!("{{\"delete\":{{\"_index\":\"books\",\"_id\":\"{}\"}}}}\n", BOOK_ID)
        );
        assert!(store.finds.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_document_is_skipped() {
        let (_, processor) = processor();
        let event = IndexEvent::new(IndexAction::Index, AUTHOR_ID, "books", None);

        assert!(processor.resolve(&event).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_identifier_only_document_is_not_joined() {
        let (store, processor) = processor();
        let schema = processor.registry().resolve("books", None).await.unwrap();
        let id = ObjectId::parse_str(BOOK_ID).unwrap();

        let joined = processor
            .join(ResolvedDocument::scanned(schema, doc! {"_id": id}))
            .await
            .unwrap();

        assert_eq!(joined.document, doc! {"_id": id});
        assert!(store.finds.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_illegal_identifier_fails_resolution() {
        let (_, processor) = processor();
        let event = IndexEvent::new(IndexAction::Index, "not-an-id", "books", None);

        let err = processor.resolve(&event).await.unwrap_err();
        assert!(err.to_string().contains("Illegal identifier"));
    }
}
