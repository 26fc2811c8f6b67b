//! Layout metadata.
//!
//! A layout lists its fields and portals (related sets) in the order FileMaker
//! reports them. That order is the output order for records decoded against
//! the layout.

use crate::value::FieldType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of field as declared by the `type` attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Normal,
    Calculation,
    Summary,
}

impl FieldKind {
    pub fn from_type(kind: &str) -> Self {
        match kind {
            "calculation" => FieldKind::Calculation,
            "summary" => FieldKind::Summary,
            _ => FieldKind::Normal,
        }
    }
}

/// Definition of a field on a layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: FieldType,
    pub kind: FieldKind,
    /// Number of repetitions.
    pub max_repeat: u32,
    pub global: bool,
    pub auto_enter: bool,
    pub not_empty: bool,
    pub numeric_only: bool,
}

impl FieldDefinition {
    /// A normal, non-repeating field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            kind: FieldKind::Normal,
            max_repeat: 1,
            global: false,
            auto_enter: false,
            not_empty: false,
            numeric_only: false,
        }
    }
}

/// Definition of a portal: the related table and the fields shown from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedSetDefinition {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
}

impl RelatedSetDefinition {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDefinition>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// First field definition with this name.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One entry of a layout, in layout order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LayoutItem {
    Field(FieldDefinition),
    RelatedSet(RelatedSetDefinition),
}

impl LayoutItem {
    pub fn name(&self) -> &str {
        match self {
            LayoutItem::Field(def) => &def.name,
            LayoutItem::RelatedSet(def) => &def.name,
        }
    }
}

/// Ordered field and related-set definitions of a layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutInfo {
    items: Vec<LayoutItem>,
    /// Field definitions by name, including fields inside related sets.
    #[serde(skip)]
    fields_by_name: HashMap<String, FieldDefinition>,
}

impl LayoutInfo {
    /// Build layout info from its items. When two field definitions share a
    /// name, the first one is kept for lookups.
    pub fn new(items: Vec<LayoutItem>) -> Self {
        let mut fields_by_name = HashMap::new();
        for item in &items {
            let defs: &[FieldDefinition] = match item {
                LayoutItem::Field(def) => std::slice::from_ref(def),
                LayoutItem::RelatedSet(set) => &set.fields,
            };
            for def in defs {
                fields_by_name
                    .entry(def.name.clone())
                    .or_insert_with(|| def.clone());
            }
        }
        Self {
            items,
            fields_by_name,
        }
    }

    pub fn items(&self) -> &[LayoutItem] {
        &self.items
    }

    pub fn fields_by_name(&self) -> &HashMap<String, FieldDefinition> {
        &self.fields_by_name
    }

    /// Top-level fields, in layout order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.items.iter().filter_map(|item| match item {
            LayoutItem::Field(def) => Some(def),
            LayoutItem::RelatedSet(_) => None,
        })
    }

    /// Related sets, in layout order.
    pub fn related_sets(&self) -> impl Iterator<Item = &RelatedSetDefinition> {
        self.items.iter().filter_map(|item| match item {
            LayoutItem::RelatedSet(def) => Some(def),
            LayoutItem::Field(_) => None,
        })
    }

    /// First top-level field definition with this name.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields().find(|def| def.name == name)
    }

    pub fn related_set(&self, name: &str) -> Option<&RelatedSetDefinition> {
        self.related_sets().find(|def| def.name == name)
    }

    /// Every field name in layout order, related-set fields in place of their
    /// set, each name once.
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.fields_by_name.len());
        for item in &self.items {
            let defs: &[FieldDefinition] = match item {
                LayoutItem::Field(def) => std::slice::from_ref(def),
                LayoutItem::RelatedSet(set) => &set.fields,
            };
            for def in defs {
                if !names.contains(&def.name) {
                    names.push(def.name.clone());
                }
            }
        }
        names
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
