//! Bulk NDJSON line building.

use bson::{Bson, Document};
use collection_indexer_shared::{prune, DocumentError, DocumentTree, PruneDecision};
use serde_json::{Map, Value};

use super::index_schema::IndexSchema;
use super::summary::append_summary;
use crate::definition::DEFAULT_SUMMARY_FIELD_NAME;

/// Identifier field of stored documents.
pub const ID_FIELD: &str = "_id";

const INDEX_ACTION: &str = "index";
const DELETE_ACTION: &str = "delete";

impl IndexSchema {
    /// Build the bulk `index` action for a document.
    ///
    /// Returns two newline-terminated lines: the action header and the body.
    /// The body holds the summary field, then joined summary fields in the
    /// order their joins are configured, then the retained fields of the
    /// document. A summary member wins over a document field with the same name.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::IllegalIdentifier`] when the document has no
    /// usable `_id`.
    pub fn build_index_line(&self, document: Document) -> Result<String, DocumentError> {
        let mut line = self.action_header(INDEX_ACTION, &document)?;

        let mut root = Bson::Document(document);
        let mut body = Map::new();
        for (name, text) in self.summaries(&root) {
            body.insert(name, Value::String(text));
        }

        self.prune_retained(&mut root);
        if let Value::Object(remainder) = root.into_relaxed_extjson() {
            for (key, value) in remainder {
                body.entry(key).or_insert(value);
            }
        }

        line.push_str(&Value::Object(body).to_string());
        line.push('\n');
        Ok(line)
    }

    /// Build the bulk `delete` action for a document: the header line only.
    pub fn build_delete_line(&self, document: &Document) -> Result<String, DocumentError> {
        self.action_header(DELETE_ACTION, document)
    }

    fn action_header(&self, action: &str, document: &Document) -> Result<String, DocumentError> {
        let mut target = Map::new();
        target.insert("_index".to_string(), Value::String(self.index().to_string()));
        if let Some(index_type) = self.index_type() {
            target.insert("_type".to_string(), Value::String(index_type.to_string()));
        }
        target.insert("_id".to_string(), Value::String(document_id(document)?));

        let mut header = Map::new();
        header.insert(action.to_string(), Value::Object(target));

        let mut line = Value::Object(header).to_string();
        line.push('\n');
        Ok(line)
    }

    /// Summary members of the body, main summary first.
    fn summaries(&self, root: &Bson) -> Vec<(String, String)> {
        let summary = self.summary();
        let mut main = summary.is_configured().then(String::new);
        if let Some(text) = main.as_mut() {
            append_summary(root, &summary.fields, &summary.separator, text);
        }

        let mut joined: Vec<(String, String)> = Vec::new();
        for join in self.joined_collections() {
            if join.summary.fields.is_empty() {
                continue;
            }
            let name = join
                .summary
                .name
                .as_deref()
                .filter(|name| !name.is_empty())
                .or_else(|| summary.is_configured().then_some(summary.name.as_str()))
                .unwrap_or(DEFAULT_SUMMARY_FIELD_NAME);

            let target = match main.as_mut() {
                Some(text) if name == summary.name => text,
                _ => {
                    let position = match joined.iter().position(|(existing, _)| existing == name) {
                        Some(position) => position,
                        None => {
                            joined.push((name.to_string(), String::new()));
                            joined.len() - 1
                        }
                    };
                    &mut joined[position].1
                }
            };

            let joined_value = root
                .as_document()
                .and_then(|document| document.get(&join.joined_field_name));
            if let Some(value) = joined_value {
                append_summary(value, &join.summary.fields, &summary.separator, target);
            }
        }

        main.map(|text| (summary.name.clone(), text))
            .into_iter()
            .chain(joined)
            .collect()
    }

    /// Remove everything outside the retained fields and their containers.
    ///
    /// Containers of retained fields are descended into even when they are
    /// retained themselves, so only the nested retained fields survive there.
    fn prune_retained(&self, root: &mut Bson) {
        prune(root, &mut |ctx, key, _| match ctx.field_path(key) {
            Some(path) if self.ancestor_paths().contains(&path) => PruneDecision::Recurse,
            Some(path) if self.all_fields().contains(&path) => PruneDecision::Keep,
            _ => PruneDecision::Remove,
        });
    }
}

/// Text form of a document's `_id`: object ids as hex, strings verbatim.
pub fn document_id(document: &Document) -> Result<String, DocumentError> {
    match document.get(ID_FIELD) {
        Some(Bson::ObjectId(id)) => Ok(id.to_hex()),
        Some(Bson::String(id)) if !id.is_empty() => Ok(id.clone()),
        Some(other) if !other.kind().is_container() && *other != Bson::Null => {
            other.scalar_text().ok_or_else(|| DocumentError::illegal_identifier(other.to_string()))
        }
        Some(other) => Err(DocumentError::illegal_identifier(format!("unusable _id {}", other))),
        None => Err(DocumentError::illegal_identifier("document has no _id")),
    }
}
