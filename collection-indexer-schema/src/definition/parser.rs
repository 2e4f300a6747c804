//! Index definition parser.
//!
//! The definition document is walked once. Each section is read by its own
//! [`Mode`], and the mode for a child is chosen from the parent's mode and the
//! child's key alone:
//!
//! ```text
//! Root ── source ──> Source ── summaryField ──────> Summary
//!                      └──── joinedCollections ──> JoinList ── [i] ──> JoinItem(i) ── summaryField ──> JoinSummary(i)
//! ```
//!
//! Unknown keys are skipped without descending, so newer definition files
//! remain readable.

use collection_indexer_shared::{
    walk, DocumentError, DocumentTree, FieldPath, NodeKind, Step, WalkContext,
};
use serde_json::Value;

use super::index_definition::{IndexDefinition, JoinedCollection};

const NOT_A_VALUE: &str = "Type is not a value node:";
const NOT_A_STRUCTURE: &str = "Type is not a structure node:";
const NOT_CONVERTIBLE: &str = "Convert:";

/// Section of the definition currently being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Root,
    Source,
    Summary,
    JoinList,
    JoinItem(usize),
    JoinSummary(usize),
}

/// Parse a raw definition document.
///
/// # Arguments
///
/// * `raw` - The definition as read from the definition repository
///
/// # Returns
///
/// * `Ok(IndexDefinition)` - The definition with every join finished
/// * `Err(DocumentError)` - A known key holds a leaf where a structure is
///   expected, or the reverse
pub fn parse_definition(raw: &Value) -> Result<IndexDefinition, DocumentError> {
    let mut definition = IndexDefinition::default();

    walk(raw, Mode::Root, &mut |ctx, mode, key, value, kind| {
        read_entry(&mut definition, ctx, *mode, key, value, kind)
    })?;

    for join in &mut definition.joined_collections {
        join.finish();
    }
    Ok(definition)
}

fn read_entry(
    definition: &mut IndexDefinition,
    ctx: &WalkContext,
    mode: Mode,
    key: &str,
    value: &Value,
    kind: NodeKind,
) -> Result<Step<Mode>, DocumentError> {
    match mode {
        Mode::Root => match key {
            "index" => definition.index = text(ctx, key, value)?,
            "title" => definition.title = Some(text(ctx, key, value)?),
            "type" => {
                definition.index_type = Some(text(ctx, key, value)?).filter(|t| !t.is_empty())
            }
            "source" => return enter(ctx, key, value, Mode::Source),
            _ => {}
        },
        Mode::Source => match key {
            "collection" => definition.collection = text(ctx, key, value)?,
            "fields" => definition.fields.extend(field_list(ctx, key, value)?),
            "joinedCollections" => {
                definition.joined_collections.clear();
                return enter(ctx, key, value, Mode::JoinList);
            }
            "summaryField" => return enter(ctx, key, value, Mode::Summary),
            _ => {}
        },
        Mode::Summary => match key {
            "fields" => definition.summary_fields.extend(field_list(ctx, key, value)?),
            "separator" => definition.summary_field_separator = text(ctx, key, value)?,
            "as" => definition.summary_field_name = Some(text(ctx, key, value)?),
            _ => {}
        },
        Mode::JoinList => {
            if !kind.is_container() {
                return Err(DocumentError::data_conversion(NOT_A_STRUCTURE, ctx, key, value));
            }
            definition.joined_collections.push(JoinedCollection::default());
            return Ok(Step::Switch(Mode::JoinItem(definition.joined_collections.len() - 1)));
        }
        Mode::JoinItem(index) => {
            let join = &mut definition.joined_collections[index];
            match key {
                "from" => join.from = text(ctx, key, value)?,
                "as" => join.joined_field_name = text(ctx, key, value)?,
                "localField" => join.local_fields = vec![path(ctx, key, value)?],
                "foreignField" => join.foreign_fields = vec![path(ctx, key, value)?],
                "convertLocalField" => join.convert_local_fields = vec![text(ctx, key, value)?],
                "localFields" => join.local_fields = path_array(ctx, key, value)?,
                "foreignFields" => join.foreign_fields = path_array(ctx, key, value)?,
                "convertLocalFields" => join.convert_local_fields = text_array(ctx, key, value)?,
                "summaryFieldOnly" => {
                    join.summary_field_only = value.as_bool().ok_or_else(|| {
                        DocumentError::data_conversion(NOT_CONVERTIBLE, ctx, key, value)
                    })?
                }
                "fields" => join.fields.extend(field_list(ctx, key, value)?),
                "summaryField" => return enter(ctx, key, value, Mode::JoinSummary(index)),
                _ => {}
            }
        }
        Mode::JoinSummary(index) => {
            let summary = &mut definition.joined_collections[index].summary;
            match key {
                "fields" => summary.fields.extend(field_list(ctx, key, value)?),
                "as" => summary.name = Some(text(ctx, key, value)?),
                _ => {}
            }
        }
    }
    Ok(Step::Stop)
}

fn enter(
    ctx: &WalkContext,
    key: &str,
    value: &Value,
    next: Mode,
) -> Result<Step<Mode>, DocumentError> {
    if value.kind().is_container() {
        Ok(Step::Switch(next))
    } else {
        Err(DocumentError::data_conversion(NOT_A_STRUCTURE, ctx, key, value))
    }
}

fn text(ctx: &WalkContext, key: &str, value: &Value) -> Result<String, DocumentError> {
    value
        .scalar_text()
        .ok_or_else(|| DocumentError::data_conversion(NOT_A_VALUE, ctx, key, value))
}

fn path(ctx: &WalkContext, key: &str, value: &Value) -> Result<FieldPath, DocumentError> {
    let raw = text(ctx, key, value)?;
    FieldPath::split(&raw)
        .ok_or_else(|| DocumentError::data_conversion(NOT_CONVERTIBLE, ctx, key, value))
}

fn text_array(ctx: &WalkContext, key: &str, value: &Value) -> Result<Vec<String>, DocumentError> {
    if value.kind() != NodeKind::Array {
        return Err(DocumentError::data_conversion(NOT_A_STRUCTURE, ctx, key, value));
    }
    value
        .entries()
        .map(|(position, item)| {
            item.scalar_text()
                .ok_or_else(|| DocumentError::data_conversion(NOT_A_VALUE, ctx, &position, item))
        })
        .collect()
}

fn path_array(
    ctx: &WalkContext,
    key: &str,
    value: &Value,
) -> Result<Vec<FieldPath>, DocumentError> {
    text_array(ctx, key, value)?
        .iter()
        .map(|raw| {
            FieldPath::split(raw)
                .ok_or_else(|| DocumentError::data_conversion(NOT_CONVERTIBLE, ctx, key, value))
        })
        .collect()
}

/// Read a field list.
///
/// Every scalar below `value` is a dotted path. Object keys above a scalar
/// are prepended to it, so `{"author": ["name", "age"]}` yields
/// `author.name` and `author.age`. Array positions are ignored.
fn field_list(
    ctx: &WalkContext,
    key: &str,
    value: &Value,
) -> Result<Vec<FieldPath>, DocumentError> {
    if !value.kind().is_container() {
        return Err(DocumentError::data_conversion(NOT_A_STRUCTURE, ctx, key, value));
    }

    let mut fields = Vec::new();
    walk(value, (), &mut |inner, _, item_key, item, item_kind| {
        if item_kind.is_container() {
            return Ok(Step::Continue);
        }
        let raw = text(inner, item_key, item)?;
        if let Some(leaf) = FieldPath::split(&raw) {
            let field = match inner.field_path(item_key) {
                Some(parent) => leaf.prefixed(&parent.dotted()),
                None => leaf,
            };
            fields.push(field);
        }
        Ok(Step::Continue)
    })?;
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::index_definition::DEFAULT_SUMMARY_SEPARATOR;
    use serde_json::json;

    fn path(raw: &str) -> FieldPath {
        FieldPath::split(raw).unwrap()
    }

    #[test]
    fn test_parse_root_and_source() {
        let raw = json!({
            "index": "books",
            "title": "Books",
            "type": "novel",
            "source": {
                "collection": "book",
                "fields": ["title", "author.name", "author.name"],
            }
        });

        let definition = parse_definition(&raw).unwrap();
        assert_eq!(definition.index, "books");
        assert_eq!(definition.title.as_deref(), Some("Books"));
        assert_eq!(definition.index_type.as_deref(), Some("novel"));
        assert_eq!(definition.collection, "book");
        assert_eq!(
            definition.fields.iter().cloned().collect::<Vec<_>>(),
            vec![path("author.name"), path("title")]
        );
        assert_eq!(definition.summary_field_separator, DEFAULT_SUMMARY_SEPARATOR);
        assert!(definition.joined_collections.is_empty());
    }

    #[test]
    fn test_parse_nested_field_list() {
        let raw = json!({
            "index": "books",
            "source": { "fields": { "author": ["name", "address.city"], "other": "isbn" } }
        });

        let definition = parse_definition(&raw).unwrap();
        assert!(definition.fields.contains(&path("author.name")));
        assert!(definition.fields.contains(&path("author.address.city")));
        assert!(definition.fields.contains(&path("other.isbn")));
    }

    #[test]
    fn test_parse_summary() {
        let raw = json!({
            "index": "books",
            "source": {
                "summaryField": { "fields": ["title", "isbn"], "separator": "|", "as": "all" }
            }
        });

        let definition = parse_definition(&raw).unwrap();
        assert_eq!(definition.summary_field_name.as_deref(), Some("all"));
        assert_eq!(definition.summary_field_separator, "|");
        assert_eq!(definition.summary_fields.len(), 2);
    }

    #[test]
    fn test_parse_joins_singular_and_plural() {
        let raw = json!({
            "index": "books",
            "source": {
                "collection": "book",
                "joinedCollections": [
                    {
                        "from": "authors",
                        "localField": "authorId",
                        "foreignField": "_id",
                        "convertLocalField": "ObjectId",
                        "as": "author",
                        "fields": ["name"],
                        "summaryField": { "fields": ["name", "country"], "as": "authorSummary" }
                    },
                    {
                        "from": "reviews",
                        "localFields": ["_id", "edition"],
                        "foreignFields": ["bookId", "edition"],
                        "convertLocalFields": ["String"],
                        "as": "reviews",
                        "summaryFieldOnly": true
                    }
                ]
            }
        });

        let definition = parse_definition(&raw).unwrap();
        assert_eq!(definition.joined_collections.len(), 2);

        let author = &definition.joined_collections[0];
        assert_eq!(author.from, "authors");
        assert_eq!(author.local_fields, vec![path("authorId")]);
        assert_eq!(author.foreign_fields, vec![path("_id")]);
        assert_eq!(author.convert_local_fields, vec!["ObjectId"]);
        assert_eq!(author.summary.name.as_deref(), Some("authorSummary"));
        assert_eq!(author.projection(), [path("country"), path("name")]);
        assert!(author.joined_fields().contains(&path("author.name")));

        let reviews = &definition.joined_collections[1];
        assert_eq!(reviews.local_fields, vec![path("_id"), path("edition")]);
        assert_eq!(reviews.foreign_fields, vec![path("bookId"), path("edition")]);
        assert!(reviews.summary_field_only);
        assert!(reviews.projection().is_empty());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let raw = json!({
            "index": "books",
            "future": { "index": "shadowed" },
            "source": { "collection": "book", "extra": [1, 2, 3] }
        });

        let definition = parse_definition(&raw).unwrap();
        assert_eq!(definition.index, "books");
        assert_eq!(definition.collection, "book");
    }

    #[test]
    fn test_structure_where_value_expected() {
        let raw = json!({ "index": "books", "source": { "collection": { "name": "book" } } });

        let err = parse_definition(&raw).unwrap_err();
        match &err {
            DocumentError::DataConversion { key, path, .. } => {
                assert_eq!(key, "collection");
                assert_eq!(path, "source\\collection");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err
            .to_string()
            .starts_with("Type is not a value node: \"collection\" path source\\collection: "));
    }

    #[test]
    fn test_value_where_structure_expected() {
        let raw = json!({ "index": "books", "source": { "joinedCollections": "authors" } });

        let err = parse_definition(&raw).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::DataConversion { ref key, .. } if key == "joinedCollections"
        ));
    }

    #[test]
    fn test_summary_field_only_must_be_boolean() {
        let raw = json!({
            "index": "books",
            "source": { "joinedCollections": [ { "from": "a", "as": "a", "summaryFieldOnly": "yes" } ] }
        });

        let err = parse_definition(&raw).unwrap_err();
        match err {
            DocumentError::DataConversion { message, path, value, .. } => {
                assert_eq!(message, "Convert:");
                assert_eq!(path, "source\\joinedCollections\\0\\summaryFieldOnly");
                assert_eq!(value, "\"yes\"");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
