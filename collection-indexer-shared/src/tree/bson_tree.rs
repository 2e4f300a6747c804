//! [`DocumentTree`] for BSON values returned by the document store.

use std::borrow::Cow;

use bson::Bson;

use super::document_tree::{array_position, DocumentTree, Entries, NodeKind};

impl DocumentTree for Bson {
    fn kind(&self) -> NodeKind {
        match self {
            Bson::Document(_) => NodeKind::Map,
            Bson::Array(_) => NodeKind::Array,
            _ => NodeKind::Scalar,
        }
    }

    fn entries(&self) -> Entries<'_, Self> {
        match self {
            Bson::Document(doc) => {
                Box::new(doc.iter().map(|(k, v)| (Cow::Borrowed(k.as_str()), v)))
            }
            Bson::Array(items) => Box::new(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (Cow::Owned(i.to_string()), v)),
            ),
            _ => Box::new(std::iter::empty()),
        }
    }

    fn size(&self) -> usize {
        match self {
            Bson::Document(doc) => doc.len(),
            Bson::Array(items) => items.len(),
            _ => 0,
        }
    }

    fn child_mut(&mut self, key: &str) -> Option<&mut Self> {
        match self {
            Bson::Document(doc) => doc.get_mut(key),
            Bson::Array(items) => array_position(key).and_then(|i| items.get_mut(i)),
            _ => None,
        }
    }

    fn remove_child(&mut self, key: &str) -> Option<Self> {
        match self {
            Bson::Document(doc) => doc.remove(key),
            Bson::Array(items) => match array_position(key) {
                Some(i) if i < items.len() => Some(items.remove(i)),
                _ => None,
            },
            _ => None,
        }
    }

    fn scalar_text(&self) -> Option<String> {
        match self {
            Bson::Document(_) | Bson::Array(_) => None,
            Bson::String(s) => Some(s.clone()),
            Bson::ObjectId(id) => Some(id.to_hex()),
            Bson::Int32(v) => Some(v.to_string()),
            Bson::Int64(v) => Some(v.to_string()),
            Bson::Double(v) => Some(v.to_string()),
            Bson::Boolean(v) => Some(v.to_string()),
            Bson::Null => Some("null".to_string()),
            other => Some(other.to_string()),
        }
    }

    fn summary_text(&self) -> Option<String> {
        match self {
            Bson::String(s) => Some(s.clone()),
            Bson::Int32(v) => Some(v.to_string()),
            Bson::Int64(v) => Some(v.to_string()),
            _ => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            Bson::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    fn raw_display(&self) -> String {
        self.to_string()
    }
}
