//! Decoded records.

use crate::layout::{FieldDefinition, LayoutInfo, LayoutItem};
use crate::value::FieldValue;
use serde::Serialize;
use std::collections::HashMap;

/// Server assigned record identifier.
pub type RecordId = i64;

/// Marks a record id that is absent or not yet assigned.
pub const NO_RECORD_ID: RecordId = -1;

/// One named element of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RecordElement {
    Field { name: String, value: FieldValue },
    RelatedSet { name: String, records: Vec<Record> },
}

impl RecordElement {
    pub fn name(&self) -> &str {
        match self {
            RecordElement::Field { name, .. } => name,
            RecordElement::RelatedSet { name, .. } => name,
        }
    }
}

/// A record from a result set, or a row of a related set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub record_id: RecordId,
    /// Modification counter, if the server sent one.
    pub mod_id: Option<u64>,
    pub elements: HashMap<String, RecordElement>,
}

impl Record {
    pub fn new(record_id: RecordId) -> Self {
        Self {
            record_id,
            mod_id: None,
            elements: HashMap::new(),
        }
    }

    pub fn has_record_id(&self) -> bool {
        self.record_id != NO_RECORD_ID
    }

    /// Insert an element unless one with the same name exists. Returns false
    /// if the element was dropped.
    pub fn insert(&mut self, element: RecordElement) -> bool {
        if self.elements.contains_key(element.name()) {
            return false;
        }
        self.elements.insert(element.name().to_string(), element);
        true
    }

    pub fn get(&self, name: &str) -> Option<&RecordElement> {
        self.elements.get(name)
    }

    /// Value of a field element.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        match self.elements.get(name)? {
            RecordElement::Field { value, .. } => Some(value),
            RecordElement::RelatedSet { .. } => None,
        }
    }

    /// Rows of a related-set element.
    pub fn related_set(&self, name: &str) -> Option<&[Record]> {
        match self.elements.get(name)? {
            RecordElement::RelatedSet { records, .. } => Some(records),
            RecordElement::Field { .. } => None,
        }
    }

    /// Elements in the order of the layout. Items the record lacks are skipped.
    pub fn elements_in_layout_order<'a>(
        &'a self,
        layout: &'a LayoutInfo,
    ) -> impl Iterator<Item = &'a RecordElement> + 'a {
        layout
            .items()
            .iter()
            .map(LayoutItem::name)
            .filter_map(|name| self.elements.get(name))
    }

    /// Field elements in the order of `fields`, used for related-set rows.
    pub fn fields_in_order<'a>(
        &'a self,
        fields: &'a [FieldDefinition],
    ) -> impl Iterator<Item = &'a RecordElement> + 'a {
        fields.iter().filter_map(|def| self.elements.get(&def.name))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
