use indexmap::IndexMap;
use std::fmt::{Debug, Display, Formatter};

use crate::common::{Value, DOC_ID};
use crate::errors::{ErrorKind, ReldocError, ReldocResult};

/// Represents a document handed to or returned from the CRUD boundary.
///
/// A document is composed of key-value pairs. The key is always a
/// [String] and the value is a [Value]. Keys keep their insertion order;
/// the order is semantic: it decides the column order of compiled INSERT
/// statements and the positional parameter order of compiled filters.
///
/// The eight internal fields (`_id`, `_apiVersion`, `_version`,
/// `_history`, `_createdAt`, `_createdBy`, `_lastModifiedBy`,
/// `_lastModifiedAt`) are reserved bookkeeping columns. `_id` may be
/// assigned by the caller or generated during insertion; once present it
/// cannot be reassigned.
///
/// # Examples
///
/// ```ignore
/// let mut doc = Document::new();
/// doc.put("title", "War and Peace")?;
/// doc.put("edition", 2i64)?;
/// assert_eq!(doc.len(), 2);
/// ```
#[derive(Clone, Default, PartialEq)]
pub struct Document {
    data: IndexMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: IndexMap::new(),
        }
    }

    /// Checks if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of fields in the document.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Associates the specified [Value] with the specified key.
    ///
    /// If the key already exists its value is updated in place, keeping
    /// the key's original position.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty, or if the key is `_id` and
    /// the document already carries an id.
    pub fn put<T: Into<Value>>(&mut self, key: &str, value: T) -> ReldocResult<()> {
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(ReldocError::new(
                "Document does not support empty key",
                ErrorKind::InvalidFieldName,
            ));
        }

        if key == DOC_ID && self.data.contains_key(DOC_ID) {
            log::error!("Document id is immutable once assigned");
            return Err(ReldocError::new(
                "Document id is immutable once assigned",
                ErrorKind::InvalidOperation,
            ));
        }

        self.data.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Returns the [Value] associated with the key, or [Value::Null] if
    /// this document contains no mapping for the key.
    pub fn get(&self, key: &str) -> Value {
        self.data.get(key).cloned().unwrap_or(Value::Null)
    }

    /// Returns true if the document contains the key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Removes the key from the document, returning its value if present.
    ///
    /// Removal preserves the relative order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.shift_remove(key)
    }

    /// Returns the document id, if one is assigned.
    pub fn id(&self) -> Option<&str> {
        match self.data.get(DOC_ID) {
            Some(Value::String(id)) => Some(id),
            _ => None,
        }
    }

    /// Iterates over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    /// Iterates over key-value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    /// Merges all fields of `other` into this document, overwriting
    /// values for keys already present.
    pub fn merge(&mut self, other: &Document) -> ReldocResult<()> {
        for (key, value) in other.iter() {
            if key == DOC_ID && self.data.contains_key(DOC_ID) {
                continue;
            }
            self.put(key, value.clone())?;
        }
        Ok(())
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        write!(f, "}}")
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Document{}", self)
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Document {
            data: iter.into_iter().collect(),
        }
    }
}
