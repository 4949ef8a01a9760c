#![allow(dead_code)]

use std::sync::{Arc, Once};

use chrono::{Local, TimeZone, Utc};
use qdmsync_domain::{PersistenceConfig, QdmConfig, TimeWindow};
use qdmsync_infra::SqliteDocumentRepository;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

static TRACING: Once = Once::new();

/// Route tracing output through the test harness.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("qdmsync=debug")
            .with_test_writer()
            .try_init();
    });
}

/// Temporary document store that keeps its file alive for the duration of a
/// test run.
pub struct TestStore {
    pub repository: Arc<SqliteDocumentRepository>,
    _temp_dir: TempDir,
}

impl TestStore {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let config = PersistenceConfig {
            path: temp_dir.path().join("qdm.db").to_string_lossy().into_owned(),
            pool_size: 2,
        };
        let repository =
            SqliteDocumentRepository::open(&config).expect("document store should open");
        Self { repository: Arc::new(repository), _temp_dir: temp_dir }
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

pub fn qdm_config(server: &MockServer, page_size: u32) -> QdmConfig {
    QdmConfig {
        base_url: server.uri(),
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        page_size,
        request_timeout_secs: 5,
    }
}

pub fn window() -> TimeWindow {
    TimeWindow::new(
        Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        Local.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
    )
    .unwrap()
}

pub fn envelope(data: Value) -> Value {
    json!({ "meta": { "error": false, "status": 200 }, "data": data })
}

pub fn error_envelope(status: u16, message: &str) -> Value {
    json!({ "meta": { "error": true, "status": status }, "data": { "message": message } })
}

/// Accept the test credentials and issue a token valid for an hour.
pub async fn mount_authorize(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/v1/token/authorize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "store_uid": "store-1",
            "access_token": token,
            "token_type": "Bearer",
            "expires_in": Utc::now().timestamp() + 3600,
            "message": "ok"
        }))))
        .mount(server)
        .await;
}

pub async fn mount_count(server: &MockServer, endpoint: &str, count: usize) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/{endpoint}/count")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(json!({ "count": count.to_string() }))),
        )
        .mount(server)
        .await;
}

/// Serve `total` records of `endpoint` in pages of `page_size`, building each
/// record with `record(id)`.
pub async fn mount_pages(
    server: &MockServer,
    endpoint: &str,
    total: usize,
    page_size: usize,
    record: fn(usize) -> Value,
) {
    let page_count = total.div_ceil(page_size);
    for page in 1..=page_count {
        let first = (page - 1) * page_size + 1;
        let last = (page * page_size).min(total);
        let result: Vec<Value> = (first..=last).map(record).collect();

        Mock::given(method("GET"))
            .and(path(format!("/api/v1/{endpoint}")))
            .and(query_param("page_number", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
                "count": result.len(),
                "total_count": total,
                "search_criteria": {
                    "page_size": page_size,
                    "page_number": page,
                    "page_count": page_count
                },
                "result": result
            }))))
            .expect(1)
            .mount(server)
            .await;
    }
}

pub fn order(id: usize) -> Value {
    json!({
        "order_id": id,
        "order_status": 1,
        "customer_id": 100 + id,
        "total": 250,
        "currency_code": "TWD",
        "date_added": "2024-02-01T10:00:00",
        "order_items": [{ "product_id": 9, "name": "tea", "quantity": 2, "price": 125, "total": 250 }]
    })
}

pub fn customer(id: usize) -> Value {
    json!({
        "customer_id": id,
        "customer_group_id": 1,
        "name": format!("member {id}"),
        "email": format!("member{id}@example.com"),
        "date_added": ""
    })
}
