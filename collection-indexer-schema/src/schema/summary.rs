//! Summary field extraction.

use std::collections::BTreeSet;
use std::convert::Infallible;

use collection_indexer_shared::{walk, DocumentTree, FieldPath, NodeKind, Step};

/// Append every summary scalar found under `root` to `out`.
///
/// Values are taken in traversal order from scalars whose logical path is in
/// `fields`. `separator` is written only between values, never before the
/// first one.
pub(crate) fn append_summary<T: DocumentTree>(
    root: &T,
    fields: &BTreeSet<FieldPath>,
    separator: &str,
    out: &mut String,
) {
    if fields.is_empty() {
        return;
    }

    let _ = walk(root, (), &mut |ctx, _, key, value, kind| -> Result<Step<()>, Infallible> {
        if kind != NodeKind::Scalar {
            return Ok(Step::Continue);
        }
        let Some(text) = value.summary_text() else {
            return Ok(Step::Continue);
        };
        if ctx.field_path(key).is_some_and(|path| fields.contains(&path)) {
            if !out.is_empty() {
                out.push_str(separator);
            }
            out.push_str(&text);
        }
        Ok(Step::Continue)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, Bson};

    fn fields(raw: &[&str]) -> BTreeSet<FieldPath> {
        raw.iter().filter_map(|f| FieldPath::split(f)).collect()
    }

    #[test]
    fn test_concatenates_in_traversal_order() {
        let value = Bson::Document(doc! {
            "title": "Dune",
            "tags": ["sf", "classic"],
            "year": 1965,
            "price": 9.5,
        });

        let mut out = String::new();
        append_summary(&value, &fields(&["title", "tags", "year", "price"]), " ", &mut out);
        assert_eq!(out, "Dune sf classic 1965");
    }

    #[test]
    fn test_appends_to_existing_text() {
        let value = Bson::Array(vec![
            Bson::Document(doc! { "name": "Frank" }),
            Bson::Document(doc! { "name": "Brian" }),
        ]);

        let mut out = "Dune".to_string();
        append_summary(&value, &fields(&["name"]), ", ", &mut out);
        assert_eq!(out, "Dune, Frank, Brian");
    }

    #[test]
    fn test_nothing_matches() {
        let value = Bson::Document(doc! { "a": { "b": "x" } });
        let mut out = String::new();
        append_summary(&value, &fields(&["a"]), " ", &mut out);
        assert!(out.is_empty());
    }
}
