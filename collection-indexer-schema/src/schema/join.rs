//! Join filter construction.

use bson::{Bson, Document};
use collection_indexer_shared::{parse_object_id, DocumentError, DocumentTree, FieldPath};
use tracing::warn;

use super::index_schema::IndexSchema;
use crate::definition::{Conversion, JoinedCollection};

/// Lookup to run against a joined collection for one source document.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinCondition<'a> {
    pub collection: &'a JoinedCollection,
    /// Foreign dotted path to the local value it must equal.
    pub filter: Document,
}

impl IndexSchema {
    /// Build one lookup filter per joined collection.
    ///
    /// Joins whose local and foreign field counts differ, or that have no
    /// local fields at all, are skipped with a warning. A missing local value
    /// becomes `null`. Conversions apply only to scalar local values.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::IllegalIdentifier`] when an `ObjectId`
    /// conversion meets text that is not a valid object id.
    pub fn join_conditions(
        &self,
        document: &Document,
    ) -> Result<Vec<JoinCondition<'_>>, DocumentError> {
        let mut conditions = Vec::with_capacity(self.joined_collections().len());

        for join in self.joined_collections() {
            if join.local_fields.is_empty()
                || join.local_fields.len() != join.foreign_fields.len()
            {
                warn!(
                    index = %self.index(),
                    from = %join.from,
                    local_fields = join.local_fields.len(),
                    foreign_fields = join.foreign_fields.len(),
                    "Skipping join with mismatched local and foreign fields"
                );
                continue;
            }

            let mut filter = Document::new();
            let pairs = join.local_fields.iter().zip(&join.foreign_fields);
            for (position, (local, foreign)) in pairs.enumerate() {
                let value = embedded(document, local).cloned().unwrap_or(Bson::Null);
                let value = convert(value, join.conversion(position))?;
                filter.insert(foreign.dotted(), value);
            }

            conditions.push(JoinCondition { collection: join, filter });
        }

        Ok(conditions)
    }
}

/// Value at a dotted path, following nested documents only.
fn embedded<'a>(document: &'a Document, path: &FieldPath) -> Option<&'a Bson> {
    let (last, parents) = path.segments().split_last()?;
    let mut current = document;
    for segment in parents {
        current = current.get_document(segment).ok()?;
    }
    current.get(last)
}

fn convert(value: Bson, conversion: Option<Conversion>) -> Result<Bson, DocumentError> {
    if value.kind().is_container() {
        return Ok(value);
    }
    let Some(conversion) = conversion else {
        return Ok(value);
    };
    let text = value.scalar_text().unwrap_or_default();
    match conversion {
        Conversion::String => Ok(Bson::String(text)),
        Conversion::ObjectId => parse_object_id(&text).map(Bson::ObjectId),
    }
}
