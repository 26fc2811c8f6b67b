//! Query handler and the JSON projection of result sets.

use crate::client::FileMakerServer;
use crate::error::{AppError, Result};
use fmcwp_engine::{
    Action, DateTimeFormats, FieldDefinition, LayoutInfo, LayoutItem, Query, QueryField,
    QueryFieldGroup, Record, RecordElement, RecordId, ResultSet, SortField,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Body of a query request.
///
/// Find requests use `groups` (ORed, each ANDed internally) or `recordId`.
/// New and edit requests use `fields`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub action: Action,
    #[serde(default)]
    pub record_id: Option<RecordId>,
    #[serde(default)]
    pub mod_id: Option<u64>,
    #[serde(default)]
    pub skip: Option<u32>,
    #[serde(default)]
    pub max: Option<u32>,
    #[serde(default)]
    pub sort: Vec<SortField>,
    #[serde(default)]
    pub groups: Vec<QueryFieldGroup>,
    #[serde(default)]
    pub fields: Vec<QueryField>,
}

impl QueryRequest {
    /// Build the engine query for a database and layout.
    pub fn into_query(self, database: &str, layout: &str) -> Result<Query> {
        if !self.groups.is_empty() && !self.fields.is_empty() {
            return Err(AppError::BadRequest(
                "use either groups or fields, not both".into(),
            ));
        }

        let mut query = Query::new(database, layout, self.action)
            .skip_records(self.skip.unwrap_or(0))
            .sort_fields(self.sort)
            .query_groups(self.groups);
        if !self.fields.is_empty() {
            query = query.query_fields(self.fields);
        }
        if let Some(max) = self.max {
            query = query.max_records(max);
        }
        if let Some(record_id) = self.record_id {
            query = query.record_id(record_id);
        }
        if let Some(mod_id) = self.mod_id {
            query = query.mod_id(mod_id);
        }
        Ok(query)
    }
}

/// Run a query and project the records.
pub async fn handle_query(
    server: &FileMakerServer,
    database: &str,
    layout: &str,
    request: QueryRequest,
) -> Result<Value> {
    let query = request.into_query(database, layout)?;
    let result = server.query(&query).await?;
    tracing::debug!(
        records = result.records.len(),
        found = result.found_count,
        "query completed"
    );
    Ok(project_records(&result))
}

/// Project a result set as `[{"record": [{name: value}, ...]}, ...]`.
///
/// Fields follow layout order. A related set becomes
/// `{"relatedSet": [{name: value}, ...]}` at its layout position: one flat list
/// covering every related row, each row in related-definition order.
pub fn project_records(result: &ResultSet) -> Value {
    let formats = result.formats();
    Value::Array(
        result
            .records
            .iter()
            .map(|record| project_record(record, &result.layout_info, formats))
            .collect(),
    )
}

fn project_record(record: &Record, layout: &LayoutInfo, formats: &DateTimeFormats) -> Value {
    let mut entries = Vec::with_capacity(record.len());
    for item in layout.items() {
        match (item, record.get(item.name())) {
            (LayoutItem::Field(_), Some(RecordElement::Field { name, value })) => {
                entries.push(field_entry(name, value.render(formats)));
            }
            (LayoutItem::RelatedSet(def), Some(RecordElement::RelatedSet { records, .. })) => {
                let related: Vec<Value> = records
                    .iter()
                    .flat_map(|row| project_row(row, &def.fields, formats))
                    .collect();
                entries.push(json!({ "relatedSet": related }));
            }
            _ => {}
        }
    }
    json!({ "record": entries })
}

fn project_row(row: &Record, fields: &[FieldDefinition], formats: &DateTimeFormats) -> Vec<Value> {
    row.fields_in_order(fields)
        .filter_map(|element| match element {
            RecordElement::Field { name, value } => Some(field_entry(name, value.render(formats))),
            RecordElement::RelatedSet { .. } => None,
        })
        .collect()
}

fn field_entry(name: &str, value: String) -> Value {
    let mut entry = Map::with_capacity(1);
    entry.insert(name.to_string(), Value::String(value));
    Value::Object(entry)
}
