//! Edge case tests for fmcwp-engine
//!
//! These tests cover boundary conditions and unusual inputs.

use fmcwp_engine::{
    decode, encode, Action, Error, FieldOp, FieldValue, LayoutItem, Query, QueryField,
    QueryFieldGroup, RecordElement, NO_RECORD_ID,
};
use std::collections::HashSet;

const DB: &str = "FMServer_Sample";
const LAYOUT: &str = "Task Details";

fn response(code: i32, metadata: &str, records: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<!DOCTYPE fmresultset PUBLIC "-//FMI//DTD fmresultset//EN" "/fmi/xml/fmresultset.dtd">
<fmresultset xmlns="http://www.filemaker.com/xml/fmresultset" version="1.0">
<error code="{code}"/>
<product build="11/11/2016" name="FileMaker Web Publishing Engine" version="15.0.3.305"/>
<datasource database="FMServer_Sample" date-format="MM/dd/yyyy" layout="Task Details" table="Tasks" time-format="HH:mm:ss" timestamp-format="MM/dd/yyyy HH:mm:ss" total-count="20"/>
<metadata>{metadata}</metadata>
<resultset count="0" fetch-size="0">{records}</resultset>
</fmresultset>"#
    )
}

fn field_def(name: &str, result: &str) -> String {
    format!(r#"<field-definition auto-enter="no" global="no" max-repeat="1" name="{name}" not-empty="no" numeric-only="no" result="{result}" type="normal"/>"#)
}

fn field(name: &str, value: &str) -> String {
    format!(r#"<field name="{name}"><data>{value}</data></field>"#)
}

// ============================================================================
// String Edge Cases
// ============================================================================

#[test]
fn unicode_values_are_escaped_bytewise() {
    let values = vec![
        ("日本語", "%E6%97%A5%E6%9C%AC%E8%AA%9E"),
        ("Привет", "%D0%9F%D1%80%D0%B8%D0%B2%D0%B5%D1%82"),
        ("🎉", "%F0%9F%8E%89"),
        ("Hello\nWorld\tTab", "Hello%0AWorld%09Tab"),
    ];

    for (value, expected) in values {
        assert_eq!(encode(value), expected, "failed for {value:?}");
    }
}

#[test]
fn very_long_values() {
    let long_value = "x ".repeat(64 * 1024);
    let query = Query::new(DB, LAYOUT, Action::New)
        .query_fields(vec![QueryField::new("Description", long_value)]);

    let qs = query.to_query_string().unwrap();
    assert!(qs.starts_with("-db=FMServer_Sample&-lay=Task%20Details&Description=x%20x%20"));
    assert!(qs.ends_with("&-new"));
    assert_eq!(qs.matches("%20").count(), 64 * 1024 + 1);
}

#[test]
fn empty_field_value() {
    let query = Query::new(DB, LAYOUT, Action::Edit)
        .query_fields(vec![QueryField::new("Description", "")])
        .record_id(3);
    assert_eq!(
        query.to_query_string().unwrap(),
        "-db=FMServer_Sample&-lay=Task%20Details&Description=&-recid=3&-edit"
    );
}

#[test]
fn operator_characters_in_values_are_escaped() {
    let query = Query::new(DB, LAYOUT, Action::Find).query_fields(vec![QueryField::with_op(
        "Notes",
        "a=b+c",
        FieldOp::Equal,
    )]);
    assert!(query
        .to_query_string()
        .unwrap()
        .contains("&-q1.value===a%3Db%2Bc&"));
}

#[test]
fn field_names_with_special_characters() {
    let query = Query::new(DB, LAYOUT, Action::Find).query_fields(vec![QueryField::new(
        "Related | Sort Selection",
        "1",
    )]);
    assert!(query
        .to_query_string()
        .unwrap()
        .contains("&-q1=Related%20%7C%20Sort%20Selection&"));
}

// ============================================================================
// Query Ordering Edge Cases
// ============================================================================

#[test]
fn many_groups_keep_caller_order() {
    let groups: Vec<QueryFieldGroup> = (0..12)
        .map(|i| QueryFieldGroup::new(vec![QueryField::new(format!("F{i}"), i.to_string())]))
        .collect();
    let qs = Query::new(DB, LAYOUT, Action::Find)
        .query_groups(groups)
        .to_query_string()
        .unwrap();

    let expected: Vec<String> = (1..=12).map(|n| format!("(q{n})")).collect();
    assert!(qs.contains(&format!("-query={}&", expected.join(";"))));
    for i in 0..12 {
        let n = i + 1;
        assert!(qs.contains(&format!("&-q{n}=F{i}&-q{n}.value==={i}*")));
    }
    let pos_q2 = qs.find("&-q2=").unwrap();
    let pos_q10 = qs.find("&-q10=").unwrap();
    assert!(pos_q2 < pos_q10);
}

#[test]
fn record_id_boundaries() {
    let query = Query::new(DB, LAYOUT, Action::Delete).record_id(i64::MAX);
    assert!(query
        .to_query_string()
        .unwrap()
        .ends_with(&format!("-recid={}&-delete", i64::MAX)));

    let sentinel = Query::new(DB, LAYOUT, Action::Delete).record_id(NO_RECORD_ID);
    assert!(matches!(
        sentinel.to_query_string(),
        Err(Error::InvalidQuery(_))
    ));
}

// ============================================================================
// Decoding Edge Cases
// ============================================================================

#[test]
fn zero_records_is_not_an_error() {
    let xml = response(0, &field_def("Status", "text"), "");
    let rs = decode(&xml).unwrap();
    assert!(rs.records.is_empty());
    assert_eq!(rs.layout_info.items().len(), 1);
}

#[test]
fn element_keys_are_layout_names() {
    let metadata = format!(
        "{}{}<relatedset-definition table=\"Assignees\">{}</relatedset-definition>",
        field_def("Status", "text"),
        field_def("Days Till Due", "number"),
        field_def("Assignees::Name", "text"),
    );
    let records: String = (1..=50)
        .map(|i| {
            format!(
                r#"<record mod-id="0" record-id="{i}">{}{}{}<relatedset count="1" table="Assignees"><record record-id="{}">{}</record></relatedset></record>"#,
                field("Status", "Open"),
                field("Days Till Due", &i.to_string()),
                field("Unlisted", "x"),
                i + 1000,
                field("Assignees::Name", "Bob"),
            )
        })
        .collect();
    let rs = decode(&response(0, &metadata, &records)).unwrap();
    assert_eq!(rs.records.len(), 50);

    let allowed: HashSet<&str> = rs.layout_info.items().iter().map(LayoutItem::name).collect();
    for record in &rs.records {
        assert_ne!(record.record_id, NO_RECORD_ID);
        for key in record.elements.keys() {
            assert!(allowed.contains(key.as_str()), "unexpected key {key}");
        }
        let rows = record.related_set("Assignees").unwrap();
        assert_eq!(rows[0].record_id, record.record_id + 1000);
    }
}

#[test]
fn elements_follow_layout_order_not_document_order() {
    let metadata = format!(
        "{}{}{}",
        field_def("C", "text"),
        field_def("A", "text"),
        field_def("B", "text")
    );
    let records = format!(
        r#"<record record-id="1">{}{}{}</record>"#,
        field("A", "1"),
        field("B", "2"),
        field("C", "3")
    );
    let rs = decode(&response(0, &metadata, &records)).unwrap();
    let names: Vec<&str> = rs.records[0]
        .elements_in_layout_order(&rs.layout_info)
        .map(RecordElement::name)
        .collect();
    assert_eq!(names, vec!["C", "A", "B"]);
}

#[test]
fn malformed_values_do_not_abort_the_record() {
    let metadata = format!(
        "{}{}{}{}",
        field_def("Amount", "number"),
        field_def("Due", "date"),
        field_def("At", "timestamp"),
        field_def("Status", "text")
    );
    let records = format!(
        r#"<record record-id="1">{}{}{}{}</record>"#,
        field("Amount", "12,5 EUR"),
        field("Due", "31/31/2017"),
        field("At", "yesterday"),
        field("Status", "Open")
    );
    let rs = decode(&response(0, &metadata, &records)).unwrap();
    let record = &rs.records[0];
    assert_eq!(record.field("Amount"), Some(&FieldValue::Text("12,5 EUR".into())));
    assert_eq!(record.field("Due"), Some(&FieldValue::Text("31/31/2017".into())));
    assert_eq!(record.field("At"), Some(&FieldValue::Text("yesterday".into())));
    assert_eq!(record.field("Status"), Some(&FieldValue::Text("Open".into())));
}

#[test]
fn server_error_codes_carry_their_code() {
    for code in [1, 100, 101, 401, 802, 958, 959] {
        let err = decode(&response(code, "", "")).unwrap_err();
        assert!(matches!(err, Error::Server { code: c, .. } if c == code));
    }
    assert!(decode(&response(401, "", "")).unwrap_err().is_no_records_match());
}

#[test]
fn doctype_and_whitespace_are_ignored() {
    let xml = response(
        200,
        &format!("\n   {}\n", field_def("Status", "text")),
        &format!("\n  <record record-id=\"9\">\n    {}\n  </record>\n", field("Status", "  padded  ")),
    );
    let rs = decode(&xml).unwrap();
    assert_eq!(
        rs.records[0].field("Status"),
        Some(&FieldValue::Text("  padded  ".into()))
    );
}
