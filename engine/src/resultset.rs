//! Decoding of fmresultset XML documents.
//!
//! The document has this shape:
//!
//! ```xml
//! <fmresultset xmlns="http://www.filemaker.com/xml/fmresultset" version="1.0">
//!   <error code="0"/>
//!   <product build="..." name="FileMaker Web Publishing Engine" version="..."/>
//!   <datasource database="..." layout="..." table="..." date-format="MM/dd/yyyy"
//!               time-format="HH:mm:ss" timestamp-format="MM/dd/yyyy HH:mm:ss" total-count="3"/>
//!   <metadata>
//!     <field-definition name="Status" result="text" type="normal" max-repeat="1" .../>
//!     <relatedset-definition table="Assignees">
//!       <field-definition name="Assignees::Name" result="text" .../>
//!     </relatedset-definition>
//!   </metadata>
//!   <resultset count="1" fetch-size="1">
//!     <record record-id="1" mod-id="3">
//!       <field name="Status"><data>In Progress</data></field>
//!       <relatedset count="1" table="Assignees">
//!         <record record-id="7" mod-id="0">
//!           <field name="Assignees::Name"><data>Bob</data></field>
//!         </record>
//!       </relatedset>
//!     </record>
//!   </resultset>
//! </fmresultset>
//! ```
//!
//! Whether a record child is a field or a related set is decided by its element
//! name; its type comes from the matching definition in the metadata.

use crate::error::{is_success, Error, Result};
use crate::layout::{FieldDefinition, FieldKind, LayoutInfo, LayoutItem, RelatedSetDefinition};
use crate::record::{Record, RecordElement, RecordId, NO_RECORD_ID};
use crate::value::{DateTimeFormats, FieldType, FieldValue};
use roxmltree::{Document, Node, ParsingOptions};
use serde::Serialize;
use std::collections::HashMap;

/// Namespace of the fmresultset grammar.
pub const FMRS_NAMESPACE: &str = "http://www.filemaker.com/xml/fmresultset";

/// Name of the grammar, used as the root element and in the endpoint path.
pub const FMRS_GRAMMAR: &str = "fmresultset";

const ERROR: &str = "error";
const PRODUCT: &str = "product";
const DATASOURCE: &str = "datasource";
const METADATA: &str = "metadata";
const RESULTSET: &str = "resultset";
const RECORD: &str = "record";
const FIELD: &str = "field";
const DATA: &str = "data";
const RELATEDSET: &str = "relatedset";
const FIELD_DEFINITION: &str = "field-definition";
const RELATEDSET_DEFINITION: &str = "relatedset-definition";

/// The product that answered the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub name: String,
    pub version: String,
    pub build: String,
}

/// The database, layout and formats a result was produced from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    pub database: String,
    pub layout: String,
    pub table: String,
    pub formats: DateTimeFormats,
    /// Records in the table.
    pub total_count: u64,
}

/// A decoded response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    pub product: Product,
    pub datasource: DataSource,
    pub layout_info: LayoutInfo,
    pub records: Vec<Record>,
    /// Records matched by the request.
    pub found_count: u64,
    /// Records included in this response.
    pub fetch_size: u64,
}

impl ResultSet {
    /// Decode a response body.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let xml = std::str::from_utf8(bytes)
            .map_err(|e| Error::Protocol(format!("response is not UTF-8: {e}")))?;
        decode(xml)
    }

    /// Formats used to read and render date and time values.
    pub fn formats(&self) -> &DateTimeFormats {
        &self.datasource.formats
    }
}

/// Decode an fmresultset document.
///
/// Fails with [`Error::Protocol`] for malformed or foreign documents and with
/// [`Error::Server`] when the document carries an error code other than 0 or
/// 200.
pub fn decode(xml: &str) -> Result<ResultSet> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(xml, options)
        .map_err(|e| Error::Protocol(format!("malformed XML: {e}")))?;
    let root = doc.root_element();
    if !root.has_tag_name((FMRS_NAMESPACE, FMRS_GRAMMAR)) {
        return Err(Error::Protocol(format!(
            "expected {FMRS_GRAMMAR} document, found <{}>",
            root.tag_name().name()
        )));
    }

    let code = error_code(root)?;
    if !is_success(code) {
        return Err(Error::server(code));
    }

    let product = child(root, PRODUCT).map(decode_product).unwrap_or_default();
    let datasource = child(root, DATASOURCE)
        .map(decode_datasource)
        .unwrap_or_default();

    let metadata = required_child(root, METADATA)?;
    let layout_info = decode_metadata(metadata);

    let resultset = required_child(root, RESULTSET)?;
    let shape = Shape::of_layout(&layout_info);
    let records = elements(resultset, RECORD)
        .map(|node| decode_record(node, &shape, &datasource.formats))
        .collect();

    Ok(ResultSet {
        product,
        datasource,
        found_count: parse_attr(resultset, "count").unwrap_or(0),
        fetch_size: parse_attr(resultset, "fetch-size").unwrap_or(0),
        layout_info,
        records,
    })
}

fn error_code(root: Node) -> Result<i32> {
    let node = required_child(root, ERROR)?;
    let code = node
        .attribute("code")
        .ok_or_else(|| Error::Protocol("error node has no code".into()))?;
    code.trim()
        .parse()
        .map_err(|_| Error::Protocol(format!("error code is not an integer: {code:?}")))
}

fn decode_product(node: Node) -> Product {
    Product {
        name: attr(node, "name"),
        version: attr(node, "version"),
        build: attr(node, "build"),
    }
}

fn decode_datasource(node: Node) -> DataSource {
    DataSource {
        database: attr(node, "database"),
        layout: attr(node, "layout"),
        table: attr(node, "table"),
        formats: DateTimeFormats::from_attributes(
            node.attribute("date-format"),
            node.attribute("time-format"),
            node.attribute("timestamp-format"),
        ),
        total_count: parse_attr(node, "total-count").unwrap_or(0),
    }
}

fn decode_metadata(metadata: Node) -> LayoutInfo {
    let mut items = Vec::new();
    for node in metadata.children().filter(Node::is_element) {
        if is(node, FIELD_DEFINITION) {
            items.push(LayoutItem::Field(decode_field_definition(node)));
        } else if is(node, RELATEDSET_DEFINITION) {
            let fields = elements(node, FIELD_DEFINITION)
                .map(decode_field_definition)
                .collect();
            items.push(LayoutItem::RelatedSet(RelatedSetDefinition::new(
                attr(node, "table"),
                fields,
            )));
        }
    }
    LayoutInfo::new(items)
}

fn decode_field_definition(node: Node) -> FieldDefinition {
    FieldDefinition {
        name: attr(node, "name"),
        field_type: FieldType::from_result(node.attribute("result").unwrap_or_default()),
        kind: FieldKind::from_type(node.attribute("type").unwrap_or_default()),
        max_repeat: parse_attr(node, "max-repeat").unwrap_or(1),
        global: flag(node, "global"),
        auto_enter: flag(node, "auto-enter"),
        not_empty: flag(node, "not-empty"),
        numeric_only: flag(node, "numeric-only"),
    }
}

/// The names a record may contain and what each one is.
struct Shape<'a> {
    fields: HashMap<&'a str, &'a FieldDefinition>,
    related: Vec<(&'a RelatedSetDefinition, Shape<'a>)>,
}

impl<'a> Shape<'a> {
    fn of_layout(layout: &'a LayoutInfo) -> Self {
        let mut fields = HashMap::new();
        for def in layout.fields() {
            fields.entry(def.name.as_str()).or_insert(def);
        }
        let related = layout
            .related_sets()
            .map(|set| (set, Shape::of_related(set)))
            .collect();
        Self { fields, related }
    }

    fn of_related(set: &'a RelatedSetDefinition) -> Self {
        let mut fields = HashMap::new();
        for def in &set.fields {
            fields.entry(def.name.as_str()).or_insert(def);
        }
        Self {
            fields,
            related: Vec::new(),
        }
    }

    fn related(&self, name: &str) -> Option<&Shape<'a>> {
        self.related
            .iter()
            .find(|(set, _)| set.name == name)
            .map(|(_, shape)| shape)
    }
}

fn decode_record(node: Node, shape: &Shape, formats: &DateTimeFormats) -> Record {
    let mut record = Record::new(parse_attr::<RecordId>(node, "record-id").unwrap_or(NO_RECORD_ID));
    record.mod_id = parse_attr(node, "mod-id");

    for child in node.children().filter(Node::is_element) {
        if is(child, FIELD) {
            let name = attr(child, "name");
            // Fields missing from the metadata have no declared type and are not
            // part of the layout, so they are dropped.
            let Some(def) = shape.fields.get(name.as_str()) else {
                continue;
            };
            let value = FieldValue::parse(&field_text(child), def.field_type, formats);
            record.insert(RecordElement::Field { name, value });
        } else if is(child, RELATEDSET) {
            let name = attr(child, "table");
            let Some(related) = shape.related(&name) else {
                continue;
            };
            let records = elements(child, RECORD)
                .map(|row| decode_record(row, related, formats))
                .collect();
            record.insert(RecordElement::RelatedSet { name, records });
        }
    }

    for (set, _) in &shape.related {
        if !record.elements.contains_key(&set.name) {
            record.insert(RecordElement::RelatedSet {
                name: set.name.clone(),
                records: Vec::new(),
            });
        }
    }

    record
}

/// Text of a field node. Repeating fields carry one `data` node per
/// repetition; the first one is kept.
fn field_text(field: Node) -> String {
    elements(field, DATA)
        .next()
        .and_then(|data| data.text())
        .unwrap_or_default()
        .to_string()
}

fn is(node: Node, name: &str) -> bool {
    node.has_tag_name((FMRS_NAMESPACE, name))
}

fn elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |n| n.is_element() && is(*n, name))
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.is_element() && is(*n, name))
}

fn required_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Result<Node<'a, 'input>> {
    child(node, name).ok_or_else(|| Error::Protocol(format!("missing <{name}> node")))
}

fn attr(node: Node, name: &str) -> String {
    node.attribute(name).unwrap_or_default().to_string()
}

fn parse_attr<T: std::str::FromStr>(node: Node, name: &str) -> Option<T> {
    node.attribute(name)?.trim().parse().ok()
}

fn flag(node: Node, name: &str) -> bool {
    node.attribute(name) == Some("yes")
}
