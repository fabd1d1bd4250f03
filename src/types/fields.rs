//! Decoded field values

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One decoded field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub name: String,
    /// Raw bits as they appeared on the wire
    pub raw: u32,
    /// Value after the layout's conversion (equal to `raw` without one)
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

/// Ordered set of decoded fields with by-name lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<FieldValue>", into = "Vec<FieldValue>")]
pub struct FieldSet {
    values: Vec<FieldValue>,
    index_map: HashMap<String, usize>,
}

impl FieldSet {
    pub fn new(values: Vec<FieldValue>) -> Self {
        let index_map =
            values.iter().enumerate().map(|(index, field)| (field.name.clone(), index)).collect();
        Self { values, index_map }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.index_map.get(name).and_then(|&index| self.values.get(index))
    }

    pub fn raw(&self, name: &str) -> Option<u32> {
        self.get(name).map(|field| field.raw)
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.get(name).map(|field| field.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldValue> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PartialEq for FieldSet {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl From<Vec<FieldValue>> for FieldSet {
    fn from(values: Vec<FieldValue>) -> Self {
        Self::new(values)
    }
}

impl From<FieldSet> for Vec<FieldValue> {
    fn from(set: FieldSet) -> Self {
        set.values
    }
}
