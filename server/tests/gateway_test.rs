//! Integration tests for the gateway.
//!
//! The router runs against an in-memory FileMaker Server that understands
//! the subset of CWP the gateway emits.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use fmcwp_engine::{Action, FieldOp, Query, QueryField, NO_RECORD_ID};
use fmcwp_server::client::{Credentials, FileMakerServer, Transport, TransportError};
use fmcwp_server::config::Config;
use fmcwp_server::{app, AppState};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

const DATABASE: &str = "FMServer_Sample";
const LAYOUT: &str = "Task Details";
const FIELDS: [&str; 2] = ["Task", "Status"];

// ============================================================================
// Fake FileMaker Server
// ============================================================================

#[derive(Default)]
struct FakeState {
    next_id: i64,
    records: BTreeMap<i64, BTreeMap<String, String>>,
    authorizations: Vec<String>,
}

#[derive(Default)]
struct FakeFileMaker {
    state: Mutex<FakeState>,
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap();
            out.push(u8::from_str_radix(hex, 16).unwrap());
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).unwrap()
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn document(code: i32, metadata: &str, records: &str, count: usize) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE fmresultset PUBLIC "-//FMI//DTD fmresultset//EN" "/fmi/xml/fmresultset.dtd">
<fmresultset xmlns="http://www.filemaker.com/xml/fmresultset" version="1.0">
<error code="{code}"/>
<product build="03/09/2017" name="FileMaker Web Publishing Engine" version="16.0.1.184"/>
<datasource database="{DATABASE}" date-format="MM/dd/yyyy" layout="{LAYOUT}" table="Tasks" time-format="HH:mm:ss" timestamp-format="MM/dd/yyyy HH:mm:ss" total-count="{count}"/>
<metadata>{metadata}</metadata>
<resultset count="{count}" fetch-size="{count}">{records}</resultset>
</fmresultset>"#
    )
    .into_bytes()
}

fn field_definitions(names: &[&str]) -> String {
    names
        .iter()
        .map(|n| format!(r#"<field-definition name="{n}" result="text" type="normal"/>"#))
        .collect()
}

fn name_records(field: &str, names: &[&str]) -> String {
    names
        .iter()
        .enumerate()
        .map(|(i, n)| {
            format!(r#"<record record-id="{i}"><field name="{field}"><data>{n}</data></field></record>"#)
        })
        .collect()
}

impl FakeFileMaker {
    fn authorizations(&self) -> Vec<String> {
        self.state.lock().unwrap().authorizations.clone()
    }

    fn tasks(&self, state: &FakeState, ids: &[i64]) -> Vec<u8> {
        if ids.is_empty() {
            return document(401, &field_definitions(&FIELDS), "", 0);
        }
        let records: String = ids
            .iter()
            .map(|id| {
                let values = &state.records[id];
                let fields: String = FIELDS
                    .iter()
                    .map(|f| {
                        let value = values.get(*f).map(String::as_str).unwrap_or("");
                        format!(
                            r#"<field name="{f}"><data>{}</data></field>"#,
                            escape_xml(value)
                        )
                    })
                    .collect();
                format!(r#"<record mod-id="0" record-id="{id}">{fields}</record>"#)
            })
            .collect();
        document(0, &field_definitions(&FIELDS), &records, ids.len())
    }

    fn respond(&self, query: &str, authorization: &str) -> Vec<u8> {
        let mut state = self.state.lock().unwrap();
        state.authorizations.push(authorization.to_string());

        let mut params = BTreeMap::new();
        let mut command = String::new();
        for part in query.split('&') {
            match part.split_once('=') {
                Some((k, v)) => {
                    params.insert(percent_decode(k), v.to_string());
                }
                None => command = part.to_string(),
            }
        }
        let recid = params.get("-recid").and_then(|v| v.parse::<i64>().ok());

        match command.as_str() {
            "-dbnames" => document(
                0,
                &field_definitions(&["DATABASE_NAME"]),
                &name_records("DATABASE_NAME", &[DATABASE]),
                1,
            ),
            "-layoutnames" => document(
                0,
                &field_definitions(&["LAYOUT_NAME"]),
                &name_records("LAYOUT_NAME", &[LAYOUT, "Tasks"]),
                2,
            ),
            "-view" => document(0, &field_definitions(&FIELDS), "", 0),
            "-new" => {
                state.next_id += 1;
                let id = state.next_id;
                let values = FIELDS
                    .iter()
                    .filter_map(|f| params.get(*f).map(|v| (f.to_string(), percent_decode(v))))
                    .collect();
                state.records.insert(id, values);
                self.tasks(&state, &[id])
            }
            "-find" => match recid {
                Some(id) if state.records.contains_key(&id) => self.tasks(&state, &[id]),
                _ => document(101, "", "", 0),
            },
            "-delete" => match recid.and_then(|id| state.records.remove(&id)) {
                Some(_) => document(0, &field_definitions(&FIELDS), "", 0),
                None => document(101, "", "", 0),
            },
            "-findall" => {
                let ids: Vec<i64> = state.records.keys().copied().collect();
                self.tasks(&state, &ids)
            }
            "-findquery" => {
                // Single ANDed group: -q1..-qN with exact or contains matching.
                let mut criteria = Vec::new();
                let mut n = 1;
                while let Some(name) = params.get(&format!("-q{n}")) {
                    let raw = &params[&format!("-q{n}.value")];
                    let marker = raw.strip_prefix("==").unwrap_or(raw);
                    let (needle, contains) = match marker.strip_suffix('*') {
                        Some(needle) => (percent_decode(needle), true),
                        None => (percent_decode(marker), false),
                    };
                    criteria.push((percent_decode(name), needle, contains));
                    n += 1;
                }
                let ids: Vec<i64> = state
                    .records
                    .iter()
                    .filter(|(_, values)| {
                        criteria.iter().all(|(name, needle, contains)| {
                            let value = values.get(name).map(String::as_str).unwrap_or("");
                            if *contains {
                                value.contains(needle.as_str())
                            } else {
                                value == needle
                            }
                        })
                    })
                    .map(|(id, _)| *id)
                    .collect();
                self.tasks(&state, &ids)
            }
            _ => document(3, "", "", 0),
        }
    }
}

#[async_trait]
impl Transport for FakeFileMaker {
    async fn get(&self, url: &str, authorization: &str) -> Result<Vec<u8>, TransportError> {
        let (_, query) = url
            .split_once('?')
            .ok_or_else(|| TransportError::Unavailable("no query string".into()))?;
        Ok(self.respond(query, authorization))
    }
}

/// Transport whose server is never reachable.
struct Offline;

#[async_trait]
impl Transport for Offline {
    async fn get(&self, _url: &str, _authorization: &str) -> Result<Vec<u8>, TransportError> {
        Err(TransportError::Unavailable("connection refused".into()))
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn test_app(transport: Arc<dyn Transport>) -> Router {
    let config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        fm_host: "fms.local".to_string(),
        fm_port: 80,
        fm_username: "web".to_string(),
        fm_password: "secret".to_string(),
        fm_timeout: Duration::from_secs(5),
    };
    let server = FileMakerServer::new(
        config.fm_host.clone(),
        config.fm_port,
        Credentials::new(config.fm_username.clone(), config.fm_password.clone()),
        transport,
    );
    app(AppState {
        server,
        config: Arc::new(config),
    })
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn query(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/databases/FMServer_Sample/layouts/Task%20Details/query")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn health_does_not_contact_filemaker() {
    let app = test_app(Arc::new(Offline));
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["upstream"], "http://fms.local:80/fmi/xml/fmresultset.xml");
    assert_eq!(body["upstream_timeout_secs"], 5);
}

#[tokio::test]
async fn lists_databases_layouts_and_fields() {
    let app = test_app(Arc::new(FakeFileMaker::default()));

    let (status, body) = send(&app, get("/databases")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"databases": [DATABASE]}));

    let (status, body) = send(&app, get("/databases/FMServer_Sample/layouts")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"layouts": [LAYOUT, "Tasks"]}));

    let (status, body) = send(
        &app,
        get("/databases/FMServer_Sample/layouts/Task%20Details"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"fieldNames": ["Task", "Status"]}));
}

#[tokio::test]
async fn create_find_delete_round_trip() {
    let app = test_app(Arc::new(FakeFileMaker::default()));

    let (status, body) = send(
        &app,
        query(json!({
            "action": "new",
            "fields": [
                {"name": "Task", "value": "Write report: draft"},
                {"name": "Status", "value": "In Progress"}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{"record": [{"Task": "Write report: draft"}, {"Status": "In Progress"}]}])
    );

    let find = json!({
        "action": "find",
        "groups": [{"fields": [{"name": "Task", "value": "Write report: draft", "op": "equal"}]}]
    });
    let (status, body) = send(&app, query(find.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, query(json!({"action": "delete", "recordId": 1}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, query(find)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 401);
}

#[tokio::test]
async fn client_new_find_delete_by_found_record_id() {
    let fms = FileMakerServer::new(
        "fms.local",
        80,
        Credentials::new("web", "secret"),
        Arc::new(FakeFileMaker::default()),
    );
    let task = "Add a new record @ 1490371200";
    let new = |value: &str| {
        Query::new(DATABASE, LAYOUT, Action::New)
            .query_fields(vec![QueryField::new("Task", value)])
    };

    fms.query(&new("Unrelated task")).await.unwrap();
    fms.query(&new(task)).await.unwrap();

    let find = Query::new(DATABASE, LAYOUT, Action::Find)
        .query_fields(vec![QueryField::with_op("Task", task, FieldOp::Equal)]);
    let found = fms.query(&find).await.unwrap();
    assert_eq!(found.records.len(), 1);
    let record_id = found.records[0].record_id;
    assert_ne!(record_id, NO_RECORD_ID);

    let by_id = Query::new(DATABASE, LAYOUT, Action::Find).record_id(record_id);
    let fetched = fms.query(&by_id).await.unwrap();
    assert_eq!(fetched.records.len(), 1);
    assert_eq!(fetched.records[0].record_id, record_id);
    assert_eq!(fetched.records[0].field("Task").unwrap().to_string(), task);

    let delete = Query::new(DATABASE, LAYOUT, Action::Delete).record_id(record_id);
    fms.query(&delete).await.unwrap();

    let err = fms.query(&find).await.unwrap_err();
    assert_eq!(err.code(), Some(401));

    let remaining = Query::new(DATABASE, LAYOUT, Action::FindAll);
    let rest = fms.query(&remaining).await.unwrap();
    assert_eq!(rest.records.len(), 1);
    assert_ne!(rest.records[0].record_id, record_id);
}

#[tokio::test]
async fn find_by_record_id() {
    let app = test_app(Arc::new(FakeFileMaker::default()));
    send(
        &app,
        query(json!({"action": "new", "fields": [{"name": "Task", "value": "A"}]})),
    )
    .await;

    let (status, body) = send(&app, query(json!({"action": "find", "recordId": 1}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"record": [{"Task": "A"}, {"Status": ""}]}]));

    let (status, body) = send(&app, query(json!({"action": "find", "recordId": 9}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 101);
}

#[tokio::test]
async fn invalid_query_is_bad_request() {
    let app = test_app(Arc::new(FakeFileMaker::default()));
    let (status, _) = send(&app, query(json!({"action": "delete"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, query(json!({"action": "find"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn caller_credentials_override_configured_account() {
    let fake = Arc::new(FakeFileMaker::default());
    let app = test_app(fake.clone());

    send(&app, get("/databases")).await;
    let request = Request::builder()
        .uri("/databases")
        .header(header::AUTHORIZATION, "Basic Z3Vlc3Q6")
        .body(Body::empty())
        .unwrap();
    send(&app, request).await;

    assert_eq!(
        fake.authorizations(),
        vec!["Basic d2ViOnNlY3JldA==".to_string(), "Basic Z3Vlc3Q6".to_string()]
    );
}

#[tokio::test]
async fn malformed_authorization_is_rejected() {
    let fake = Arc::new(FakeFileMaker::default());
    let app = test_app(fake.clone());
    let request = Request::builder()
        .uri("/databases")
        .header(header::AUTHORIZATION, "Bearer token")
        .body(Body::empty())
        .unwrap();

    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(fake.authorizations().is_empty());
}

#[tokio::test]
async fn unreachable_server_is_bad_gateway() {
    let app = test_app(Arc::new(Offline));
    let (status, body) = send(&app, get("/databases")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "FileMaker Server unreachable");
}
