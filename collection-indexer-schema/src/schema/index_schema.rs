//! Compiled index schema.

use std::collections::BTreeSet;

use bson::Document;
use collection_indexer_shared::FieldPath;
use serde_json::Value;

use crate::definition::{
    parse_definition, IndexDefinition, JoinedCollection, DEFAULT_SUMMARY_FIELD_NAME,
};
use crate::errors::SchemaError;

/// Summary settings of the index itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRule {
    /// Empty when no summary fields are configured.
    pub name: String,
    pub separator: String,
    pub fields: BTreeSet<FieldPath>,
}

impl SummaryRule {
    pub fn is_configured(&self) -> bool {
        !self.fields.is_empty()
    }
}

/// An index definition compiled for document transformation.
///
/// Built once per `(index, type)` and read-only afterwards. Every operation
/// is a pure function of its document argument.
#[derive(Debug, Clone)]
pub struct IndexSchema {
    index: String,
    index_type: Option<String>,
    title: Option<String>,
    collection: String,
    fields: BTreeSet<FieldPath>,
    summary: SummaryRule,
    joined_collections: Vec<JoinedCollection>,
    all_fields: BTreeSet<FieldPath>,
    all_fields_path: BTreeSet<FieldPath>,
    ancestor_paths: BTreeSet<FieldPath>,
}

impl IndexSchema {
    /// Compile a parsed definition.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidDefinition`] when the index name or the
    /// source collection is missing, or a join lacks `from` or `as`.
    pub fn compile(definition: IndexDefinition) -> Result<Self, SchemaError> {
        if definition.index.is_empty() {
            return Err(SchemaError::invalid_definition("missing \"index\""));
        }
        if definition.collection.is_empty() {
            return Err(SchemaError::invalid_definition(format!(
                "index {}: missing \"source.collection\"",
                definition.index
            )));
        }
        for (position, join) in definition.joined_collections.iter().enumerate() {
            if join.from.is_empty() || join.joined_field_name.is_empty() {
                return Err(SchemaError::invalid_definition(format!(
                    "index {}: joined collection {} needs both \"from\" and \"as\"",
                    definition.index, position
                )));
            }
        }

        let summary = SummaryRule {
            name: if definition.summary_fields.is_empty() {
                String::new()
            } else {
                definition
                    .summary_field_name
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| DEFAULT_SUMMARY_FIELD_NAME.to_string())
            },
            separator: definition.summary_field_separator,
            fields: definition.summary_fields,
        };

        let all_fields: BTreeSet<FieldPath> = definition
            .fields
            .iter()
            .chain(definition.joined_collections.iter().flat_map(|join| join.joined_fields()))
            .cloned()
            .collect();

        let ancestor_paths: BTreeSet<FieldPath> =
            all_fields.iter().flat_map(FieldPath::ancestors).collect();
        let mut all_fields_path = all_fields.clone();
        all_fields_path.extend(ancestor_paths.iter().cloned());

        Ok(Self {
            index: definition.index,
            index_type: definition.index_type,
            title: definition.title,
            collection: definition.collection,
            fields: definition.fields,
            summary,
            joined_collections: definition.joined_collections,
            all_fields,
            all_fields_path,
            ancestor_paths,
        })
    }

    /// Parse and compile a raw definition document.
    pub fn from_definition(raw: &Value) -> Result<Self, SchemaError> {
        Self::compile(parse_definition(raw)?)
    }

    /// Parse and compile definition text.
    pub fn from_json_str(raw: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| SchemaError::json(e.to_string()))?;
        Self::from_definition(&value)
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn index_type(&self) -> Option<&str> {
        self.index_type.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Source collection.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn fields(&self) -> &BTreeSet<FieldPath> {
        &self.fields
    }

    pub fn summary(&self) -> &SummaryRule {
        &self.summary
    }

    pub fn joined_collections(&self) -> &[JoinedCollection] {
        &self.joined_collections
    }

    /// Own fields plus every join's joined fields.
    pub fn all_fields(&self) -> &BTreeSet<FieldPath> {
        &self.all_fields
    }

    /// `all_fields` plus every proper ancestor of each of them.
    pub fn all_fields_path(&self) -> &BTreeSet<FieldPath> {
        &self.all_fields_path
    }

    /// Proper ancestors of `all_fields`. A retained field that sits above
    /// another retained field is listed here too.
    pub fn ancestor_paths(&self) -> &BTreeSet<FieldPath> {
        &self.ancestor_paths
    }

    /// Projection for reading source documents.
    ///
    /// Always `None`: source documents are read whole, since summary and
    /// join inputs may live outside the retained fields.
    pub fn projection(&self) -> Option<Document> {
        None
    }
}
