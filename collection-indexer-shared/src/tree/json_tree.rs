//! [`DocumentTree`] for JSON values, used for index definition files.

use std::borrow::Cow;

use serde_json::Value;

use super::document_tree::{array_position, DocumentTree, Entries, NodeKind};

impl DocumentTree for Value {
    fn kind(&self) -> NodeKind {
        match self {
            Value::Object(_) => NodeKind::Map,
            Value::Array(_) => NodeKind::Array,
            _ => NodeKind::Scalar,
        }
    }

    fn entries(&self) -> Entries<'_, Self> {
        match self {
            Value::Object(map) => Box::new(map.iter().map(|(k, v)| (Cow::Borrowed(k.as_str()), v))),
            Value::Array(items) => Box::new(
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
            Value::Object(map) => map.len(),
            Value::Array(items) => items.len(),
            _ => 0,
        }
    }

    fn child_mut(&mut self, key: &str) -> Option<&mut Self> {
        match self {
            Value::Object(map) => map.get_mut(key),
            Value::Array(items) => array_position(key).and_then(|i| items.get_mut(i)),
            _ => None,
        }
    }

    fn remove_child(&mut self, key: &str) -> Option<Self> {
        match self {
            Value::Object(map) => map.shift_remove(key),
            Value::Array(items) => match array_position(key) {
                Some(i) if i < items.len() => Some(items.remove(i)),
                _ => None,
            },
            _ => None,
        }
    }

    fn scalar_text(&self) -> Option<String> {
        match self {
            Value::Object(_) | Value::Array(_) => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    fn summary_text(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
            _ => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        self.as_bool()
    }

    fn raw_display(&self) -> String {
        self.to_string()
    }
}
