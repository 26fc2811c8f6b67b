//! Query descriptions and their CWP query-string encoding.
//!
//! A [`Query`] names a database, a layout and an [`Action`], and carries the
//! parameters that action needs. [`Query::to_query_string`] renders it as the
//! `key=value&...` string appended to the fmresultset endpoint.

use crate::encoding::encode;
use crate::error::{Error, Result};
use crate::record::{RecordId, NO_RECORD_ID};
use serde::{Deserialize, Serialize};

/// Comparison applied to a field in a find request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldOp {
    /// Exact match: `==value`.
    Equal,
    /// Default FileMaker match: `==value*`.
    #[default]
    Contains,
    /// `==value*`
    BeginsWith,
    /// `==*value`
    EndsWith,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
}

impl FieldOp {
    /// Wrap an already encoded value with this operator's markers.
    fn apply(self, encoded: &str) -> String {
        match self {
            FieldOp::Equal => format!("=={encoded}"),
            FieldOp::Contains | FieldOp::BeginsWith => format!("=={encoded}*"),
            FieldOp::EndsWith => format!("==*{encoded}"),
            FieldOp::GreaterThan => format!(">{encoded}"),
            FieldOp::GreaterThanEqual => format!(">={encoded}"),
            FieldOp::LessThan => format!("<{encoded}"),
            FieldOp::LessThanEqual => format!("<={encoded}"),
        }
    }
}

/// One predicate (find) or one assignment (new/edit) on a named field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub op: FieldOp,
}

impl QueryField {
    /// A field using the default operator.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_op(name, value, FieldOp::default())
    }

    pub fn with_op(name: impl Into<String>, value: impl Into<String>, op: FieldOp) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            op,
        }
    }
}

/// How the fields of a group combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOp {
    /// All fields must match: `(q1,q2)`.
    #[default]
    And,
    /// Any field may match: `(q1);(q2)`.
    Or,
    /// Omit records matching all fields: `!(q1,q2)`.
    Not,
}

/// An ordered group of query fields. Groups in a query are ORed together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFieldGroup {
    pub fields: Vec<QueryField>,
    #[serde(default)]
    pub op: LogicalOp,
}

impl QueryFieldGroup {
    /// A group whose fields are ANDed.
    pub fn new(fields: Vec<QueryField>) -> Self {
        Self {
            fields,
            op: LogicalOp::And,
        }
    }

    pub fn with_op(fields: Vec<QueryField>, op: LogicalOp) -> Self {
        Self { fields, op }
    }
}

/// Sort direction for a sort field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
    /// Sort by the order of the named value list.
    Custom(String),
}

impl SortOrder {
    fn param(&self) -> &str {
        match self {
            SortOrder::Ascending => "ascend",
            SortOrder::Descending => "descend",
            SortOrder::Custom(value_list) => value_list,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortField {
    pub name: String,
    #[serde(default)]
    pub order: SortOrder,
}

impl SortField {
    pub fn new(name: impl Into<String>, order: SortOrder) -> Self {
        Self {
            name: name.into(),
            order,
        }
    }
}

/// The CWP command a query performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    FindAll,
    Find,
    /// Return one random record.
    FindAny,
    New,
    Edit,
    Delete,
    Duplicate,
}

impl Action {
    /// The terminal command token.
    pub fn command(self) -> &'static str {
        match self {
            Action::FindAll => "-findall",
            Action::Find => "-findquery",
            Action::FindAny => "-findany",
            Action::New => "-new",
            Action::Edit => "-edit",
            Action::Delete => "-delete",
            Action::Duplicate => "-dup",
        }
    }

    fn is_find(self) -> bool {
        matches!(self, Action::FindAll | Action::Find | Action::FindAny)
    }

    fn requires_record_id(self) -> bool {
        matches!(self, Action::Edit | Action::Delete | Action::Duplicate)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.command())
    }
}

/// Command used for a find by record id.
const FIND_BY_ID: &str = "-find";

/// A request against one layout of one database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub database: String,
    pub layout: String,
    pub action: Action,
    pub record_id: RecordId,
    /// Modification id checked by an edit.
    pub mod_id: Option<u64>,
    pub skip: u32,
    /// `None` returns all records.
    pub max: Option<u32>,
    pub sort_fields: Vec<SortField>,
    pub groups: Vec<QueryFieldGroup>,
}

impl Query {
    /// Create a query with no parameters beyond its target and action.
    pub fn new(database: impl Into<String>, layout: impl Into<String>, action: Action) -> Self {
        Self {
            database: database.into(),
            layout: layout.into(),
            action,
            record_id: NO_RECORD_ID,
            mod_id: None,
            skip: 0,
            max: None,
            sort_fields: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn skip_records(mut self, skip: u32) -> Self {
        self.skip = skip;
        self
    }

    pub fn max_records(mut self, max: u32) -> Self {
        self.max = Some(max);
        self
    }

    pub fn record_id(mut self, record_id: RecordId) -> Self {
        self.record_id = record_id;
        self
    }

    pub fn mod_id(mut self, mod_id: u64) -> Self {
        self.mod_id = Some(mod_id);
        self
    }

    pub fn sort_fields(mut self, sort_fields: Vec<SortField>) -> Self {
        self.sort_fields = sort_fields;
        self
    }

    /// Add `fields` as one ANDed group. For new and edit these are the
    /// values to store.
    pub fn query_fields(mut self, fields: Vec<QueryField>) -> Self {
        self.groups.push(QueryFieldGroup::new(fields));
        self
    }

    pub fn query_groups(mut self, groups: Vec<QueryFieldGroup>) -> Self {
        self.groups.extend(groups);
        self
    }

    fn has_record_id(&self) -> bool {
        self.record_id != NO_RECORD_ID
    }

    fn fields(&self) -> impl Iterator<Item = &QueryField> {
        self.groups.iter().flat_map(|g| g.fields.iter())
    }

    fn validate(&self) -> Result<()> {
        let action = self.action;
        if action.requires_record_id() && !self.has_record_id() {
            return Err(Error::InvalidQuery(format!("{action} requires a record id")));
        }
        if matches!(action, Action::FindAll | Action::FindAny | Action::New) && self.has_record_id()
        {
            return Err(Error::InvalidQuery(format!(
                "{action} does not take a record id"
            )));
        }
        let has_fields = self.fields().next().is_some();
        if matches!(
            action,
            Action::FindAll | Action::FindAny | Action::Delete | Action::Duplicate
        ) && has_fields
        {
            return Err(Error::InvalidQuery(format!(
                "{action} does not take query fields"
            )));
        }
        if action == Action::Find {
            if self.has_record_id() && has_fields {
                return Err(Error::InvalidQuery(
                    "find takes either a record id or query fields, not both".into(),
                ));
            }
            if !self.has_record_id() && !has_fields {
                return Err(Error::InvalidQuery(
                    "find requires query fields or a record id".into(),
                ));
            }
        }
        Ok(())
    }

    /// Render the query as a CWP query string.
    pub fn to_query_string(&self) -> Result<String> {
        self.validate()?;

        let mut params = Params::default();
        params.push("-db", &self.database);
        params.push("-lay", &self.layout);

        if self.action == Action::Find && self.has_record_id() {
            params.push("-recid", &self.record_id.to_string());
            params.command(FIND_BY_ID);
            return Ok(params.finish());
        }

        if self.action.is_find() {
            params.push("-skip", &self.skip.to_string());
            match self.max {
                Some(max) => params.push("-max", &max.to_string()),
                None => params.push("-max", "all"),
            }
            for (i, sort) in self.sort_fields.iter().enumerate() {
                let n = i + 1;
                params.push(&format!("-sortfield.{n}"), &sort.name);
                params.push(&format!("-sortorder.{n}"), sort.order.param());
            }
        }

        match self.action {
            Action::Find => self.push_compound_query(&mut params),
            Action::New | Action::Edit => {
                for field in self.fields() {
                    params.push(&field.name, &field.value);
                }
            }
            _ => {}
        }

        if self.has_record_id() {
            params.push("-recid", &self.record_id.to_string());
        }
        if let (Action::Edit, Some(mod_id)) = (self.action, self.mod_id) {
            params.push("-modid", &mod_id.to_string());
        }

        params.command(self.action.command());
        Ok(params.finish())
    }

    fn push_compound_query(&self, params: &mut Params) {
        let mut clauses = Vec::new();
        let mut predicates = Vec::new();
        let mut n = 0;

        for group in self.groups.iter().filter(|g| !g.fields.is_empty()) {
            let mut ids = Vec::with_capacity(group.fields.len());
            for field in &group.fields {
                n += 1;
                ids.push(format!("q{n}"));
                predicates.push((n, field));
            }
            clauses.push(match group.op {
                LogicalOp::And => format!("({})", ids.join(",")),
                LogicalOp::Or => ids
                    .iter()
                    .map(|id| format!("({id})"))
                    .collect::<Vec<_>>()
                    .join(";"),
                LogicalOp::Not => format!("!({})", ids.join(",")),
            });
        }

        params.push("-query", &clauses.join(";"));
        for (n, field) in predicates {
            params.push(&format!("-q{n}"), &field.name);
            params.push_raw(
                &format!("-q{n}.value"),
                field.op.apply(&encode(&field.value)),
            );
        }
    }
}

/// Request listing the databases hosted by the server.
pub fn database_names_query() -> String {
    "-dbnames".to_string()
}

/// Request listing the layouts of `database`.
pub fn layout_names_query(database: &str) -> String {
    format!("-db={}&-layoutnames", encode(database))
}

/// Request returning the field metadata of a layout without records.
pub fn layout_info_query(database: &str, layout: &str) -> String {
    format!("-db={}&-lay={}&-view", encode(database), encode(layout))
}

/// Ordered query-string parameters.
#[derive(Default)]
struct Params {
    parts: Vec<String>,
}

impl Params {
    fn push(&mut self, key: &str, value: &str) {
        self.push_raw(key, encode(value));
    }

    /// Push a value that is already encoded.
    fn push_raw(&mut self, key: &str, value: String) {
        self.parts.push(format!("{}={}", encode(key), value));
    }

    fn command(&mut self, command: &str) {
        self.parts.push(command.to_string());
    }

    fn finish(self) -> String {
        self.parts.join("&")
    }
}
