//! Parsed form of an index definition file.

use std::collections::BTreeSet;

use bson::{Bson, Document};
use collection_indexer_shared::{minimize, FieldPath};

/// Separator placed between summary values when none is configured.
pub const DEFAULT_SUMMARY_SEPARATOR: &str = " ";

/// Name of the summary field when summary fields are configured without `as`.
pub const DEFAULT_SUMMARY_FIELD_NAME: &str = "summaryField";

/// Conversion applied to a local join value before it is used in a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// Render the scalar as text.
    String,
    /// Parse the scalar's text as a 24-character hex object id.
    ObjectId,
}

impl Conversion {
    /// Map a `convertLocalField` entry. Unknown names mean "no conversion".
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "String" => Some(Self::String),
            "ObjectId" => Some(Self::ObjectId),
            _ => None,
        }
    }
}

/// Summary settings of a joined collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinSummary {
    /// Target field name. Falls back to the index's summary field name.
    pub name: Option<String>,
    /// Paths relative to the joined document.
    pub fields: BTreeSet<FieldPath>,
}

/// A secondary collection attached to each indexed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinedCollection {
    pub from: String,
    pub local_fields: Vec<FieldPath>,
    pub foreign_fields: Vec<FieldPath>,
    /// Per-position conversion names, aligned with `local_fields`.
    pub convert_local_fields: Vec<String>,
    /// Field the lookup result is attached under.
    pub joined_field_name: String,
    pub summary_field_only: bool,
    /// Fields of the joined documents kept in the index body.
    pub fields: BTreeSet<FieldPath>,
    pub summary: JoinSummary,
    projection: Vec<FieldPath>,
    joined_fields: BTreeSet<FieldPath>,
}

impl JoinedCollection {
    /// Compute the projection and the joined field paths.
    ///
    /// Called once parsing of the item is complete.
    pub fn finish(&mut self) {
        self.projection = minimize(self.fields.iter().chain(self.summary.fields.iter()));
        self.joined_fields = self
            .fields
            .iter()
            .map(|field| field.prefixed(&self.joined_field_name))
            .collect();
    }

    /// Minimized union of own fields and own summary fields.
    pub fn projection(&self) -> &[FieldPath] {
        &self.projection
    }

    /// Projection as a store query document, `None` when nothing is projected.
    pub fn projection_document(&self) -> Option<Document> {
        if self.projection.is_empty() {
            return None;
        }
        Some(
            self.projection
                .iter()
                .map(|path| (path.dotted(), Bson::Int32(1)))
                .collect(),
        )
    }

    /// Own fields prefixed with the joined field name.
    pub fn joined_fields(&self) -> &BTreeSet<FieldPath> {
        &self.joined_fields
    }

    /// Conversion for the local value at `position`, if any.
    pub fn conversion(&self, position: usize) -> Option<Conversion> {
        self.convert_local_fields
            .get(position)
            .and_then(|name| Conversion::from_name(name))
    }
}

/// Structured form of an index definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    pub index: String,
    pub title: Option<String>,
    pub index_type: Option<String>,
    /// Source collection.
    pub collection: String,
    pub fields: BTreeSet<FieldPath>,
    pub joined_collections: Vec<JoinedCollection>,
    pub summary_field_name: Option<String>,
    pub summary_field_separator: String,
    pub summary_fields: BTreeSet<FieldPath>,
}

impl Default for IndexDefinition {
    fn default() -> Self {
        Self {
            index: String::new(),
            title: None,
            index_type: None,
            collection: String::new(),
            fields: BTreeSet::new(),
            joined_collections: Vec::new(),
            summary_field_name: None,
            summary_field_separator: DEFAULT_SUMMARY_SEPARATOR.to_string(),
            summary_fields: BTreeSet::new(),
        }
    }
}
