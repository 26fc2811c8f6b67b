//! # fmcwp Engine
//!
//! Query encoding and response decoding for FileMaker Server's Custom Web
//! Publishing (CWP) XML interface, using the "fmresultset" grammar.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine never touches the network; it turns queries into
//!   query strings and response bodies into result sets
//! - **Schema-less**: layout shape is read from each response, never declared
//!   up front
//! - **Lenient values, strict structure**: a malformed field value degrades to
//!   text, a malformed document is an error
//!
//! ## Core Concepts
//!
//! ### Queries
//!
//! A [`Query`] targets a database and layout with an [`Action`]:
//! - find requests take [`QueryFieldGroup`]s of [`QueryField`] predicates, sort
//!   fields and skip/max paging
//! - new and edit requests take field values
//! - edit, delete and duplicate requests take a record id
//!
//! ### Result sets
//!
//! [`decode`] turns a response into a [`ResultSet`]: the [`LayoutInfo`] the
//! server reported and the [`Record`]s found. Records map names to
//! [`RecordElement`]s, either a typed [`FieldValue`] or the rows of a related
//! set (portal).
//!
//! ## Quick Start
//!
//! ```rust
//! use fmcwp_engine::{decode, Action, Query, QueryField};
//!
//! // 1. Encode a find request
//! let query = Query::new("FMServer_Sample", "Task Details", Action::Find)
//!     .query_fields(vec![QueryField::new("Status", "In Progress")]);
//! assert_eq!(
//!     query.to_query_string().unwrap(),
//!     "-db=FMServer_Sample&-lay=Task%20Details&-skip=0&-max=all\
//!      &-query=(q1)&-q1=Status&-q1.value===In%20Progress*&-findquery"
//! );
//!
//! // 2. Decode the response
//! let xml = r#"<fmresultset xmlns="http://www.filemaker.com/xml/fmresultset">
//!   <error code="0"/>
//!   <metadata><field-definition name="Status" result="text"/></metadata>
//!   <resultset count="1" fetch-size="1">
//!     <record record-id="4"><field name="Status"><data>In Progress</data></field></record>
//!   </resultset>
//! </fmresultset>"#;
//! let result = decode(xml).unwrap();
//! assert_eq!(result.records[0].record_id, 4);
//! assert_eq!(result.records[0].field("Status").unwrap().to_string(), "In Progress");
//! ```

pub mod encoding;
pub mod error;
pub mod layout;
pub mod query;
pub mod record;
pub mod resultset;
pub mod value;

// Re-export main types at crate root
pub use encoding::encode;
pub use error::{error_message, is_success, Error};
pub use layout::{FieldDefinition, FieldKind, LayoutInfo, LayoutItem, RelatedSetDefinition};
pub use query::{
    database_names_query, layout_info_query, layout_names_query, Action, FieldOp, LogicalOp,
    Query, QueryField, QueryFieldGroup, SortField, SortOrder,
};
pub use record::{Record, RecordElement, RecordId, NO_RECORD_ID};
pub use resultset::{decode, DataSource, Product, ResultSet, FMRS_GRAMMAR, FMRS_NAMESPACE};
pub use value::{DateTimeFormats, FieldType, FieldValue};
