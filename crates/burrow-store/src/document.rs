//! Document payloads and field-level update transforms.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};

/// An opaque key/value record: a JSON object.
///
/// The store never interprets documents beyond applying
/// [`FieldTransform`]s and evaluating array-contains queries.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: Map<String, Value>,
}

impl Document {
    /// An empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value; only objects are documents.
    pub fn from_value(value: Value) -> StoreResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(StoreError::InvalidDocument(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    /// Builder-style field insertion.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// A string field, if present and a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// The string members of an array field. Missing or non-array fields
    /// read as the empty set.
    pub fn string_set(&self, field: &str) -> BTreeSet<String> {
        self.fields
            .get(field)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether an array field holds `value`.
    pub fn array_contains(&self, field: &str, value: &Value) -> bool {
        self.fields
            .get(field)
            .and_then(Value::as_array)
            .is_some_and(|items| items.contains(value))
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// Apply every transform of `update`, in order.
    pub fn apply(&mut self, update: &DocumentUpdate) {
        for (field, transform) in update.transforms() {
            match transform {
                FieldTransform::Set(value) => {
                    self.fields.insert(field.clone(), value.clone());
                }
                FieldTransform::Delete => {
                    self.fields.remove(field);
                }
                FieldTransform::ArrayUnion(values) => {
                    let mut items = self.take_array(field);
                    for value in values {
                        if !items.contains(value) {
                            items.push(value.clone());
                        }
                    }
                    self.fields.insert(field.clone(), Value::Array(items));
                }
                FieldTransform::ArrayRemove(values) => {
                    let mut items = self.take_array(field);
                    items.retain(|existing| !values.contains(existing));
                    self.fields.insert(field.clone(), Value::Array(items));
                }
            }
        }
    }

    /// Remove and return the array stored at `field`; a missing or
    /// non-array value yields an empty array.
    fn take_array(&mut self, field: &str) -> Vec<Value> {
        match self.fields.remove(field) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        }
    }
}

impl From<Map<String, Value>> for Document {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// A server-side field operation.
///
/// The array transforms are set algebra evaluated by the store at commit
/// time, so concurrent writers adding different members do not lose each
/// other's updates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum FieldTransform {
    /// Overwrite the field.
    Set(Value),
    /// Remove the field.
    Delete,
    /// Append each value not already present.
    ArrayUnion(Vec<Value>),
    /// Remove every occurrence of each value.
    ArrayRemove(Vec<Value>),
}

/// An ordered list of field transforms applied to one document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentUpdate {
    transforms: Vec<(String, FieldTransform)>,
}

impl DocumentUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.transforms
            .push((field.into(), FieldTransform::Set(value.into())));
        self
    }

    pub fn delete(mut self, field: impl Into<String>) -> Self {
        self.transforms.push((field.into(), FieldTransform::Delete));
        self
    }

    pub fn array_union<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.transforms
            .push((field.into(), FieldTransform::ArrayUnion(values)));
        self
    }

    pub fn array_remove<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.transforms
            .push((field.into(), FieldTransform::ArrayRemove(values)));
        self
    }

    pub fn transforms(&self) -> &[(String, FieldTransform)] {
        &self.transforms
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}
