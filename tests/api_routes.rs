use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use bid_sheet_api::client::ZipClient;
use bid_sheet_api::models::MailMessage;
use bid_sheet_api::service::{MailSession, MailSource, TextGenerator};
use bid_sheet_api::{api, AppConfig, AppError, BidStore, MailBidExtractor, Result, SharedStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const SHEET: &str = "Date,Customer,Equipment,Won/Lost,Pick,Del, Bid Rate ,Bid Count\n\
                     44927,ACME,Reefer,WON,\"Chicago, IL 60601\",\"Dallas, TX\",200,1\n\
                     2023-01-02,Beta,Van,LOST,\"Springfield, IL\",\"Austin, TX\",abc,2\n\
                     2023-01-02,ACME,Van,TBD,\"Chicago, IL 60601\",\"Dallas, TX\",150abc,3\n\
                     bad date,CHOOSE A CUSTOMER,Flatbed,WON,\"Denver, CO\",\"Reno, NV\",999,4\n";

/// 空邮箱
struct EmptyMailbox;

#[async_trait]
impl MailSource for EmptyMailbox {
    async fn authorize(&self) -> Result<Box<dyn MailSession>> {
        Ok(Box::new(EmptyMailbox))
    }
}

#[async_trait]
impl MailSession for EmptyMailbox {
    async fn list_unread(&self, _max_results: u32) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn fetch_message(&self, id: &str) -> Result<MailMessage> {
        Err(AppError::upstream(format!("no message {}", id)))
    }
}

/// 授权失败, 错误信息带上游响应内容
struct RejectingMailbox;

#[async_trait]
impl MailSource for RejectingMailbox {
    async fn authorize(&self) -> Result<Box<dyn MailSession>> {
        Err(AppError::upstream(
            "token exchange failed: {\"error\":\"invalid_grant\",\"client_secret\":\"s3cr3t\"}",
        ))
    }
}

struct NoGenerator;

#[async_trait]
impl TextGenerator for NoGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(AppError::upstream("not configured"))
    }
}

struct TestApp {
    _dir: TempDir,
    path: std::path::PathBuf,
    store: SharedStore,
    router: Router,
}

fn test_app() -> TestApp {
    test_app_with_mailbox(Arc::new(EmptyMailbox))
}

fn test_app_with_mailbox(mailbox: Arc<dyn MailSource>) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bids.csv");
    std::fs::write(&path, SHEET).unwrap();

    let store = BidStore::load(&path).unwrap().into_shared();
    let extractor = Arc::new(MailBidExtractor::new(
        mailbox,
        Arc::new(NoGenerator),
        "",
        10,
    ));
    let config = AppConfig::default();
    let zip = Arc::new(ZipClient::new(&config.zip, &config.http).unwrap());

    TestApp {
        _dir: dir,
        path,
        store: store.clone(),
        router: api::router(store, extractor, zip),
    }
}

async fn call(app: &TestApp, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn get(app: &TestApp, uri: &str) -> Value {
    let (status, body) = call(app, Method::GET, uri, None).await;
    assert_eq!(status, StatusCode::OK, "GET {uri}");
    body
}

#[tokio::test]
async fn test_columns_headers() {
    let app = test_app();
    let headers = get(&app, "/columns-headers").await;
    assert_eq!(
        headers,
        json!(["Date", "Customer", "Equipment", "Won/Lost", "Pick", "Del", " Bid Rate ", "Bid Count"])
    );
}

#[tokio::test]
async fn test_bid_sheet_pagination() {
    let app = test_app();
    let page = get(&app, "/march-bid-sheet?page=2&pageSize=3").await;

    assert_eq!(page["page"], 2);
    assert_eq!(page["pageSize"], 3);
    assert_eq!(page["total"], 4);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["entries"].as_array().unwrap().len(), 1);
    assert_eq!(page["entries"][0]["Id"], 4);
    assert_eq!(page["entries"][0]["Date"], Value::Null);

    let defaults = get(&app, "/march-bid-sheet?pageSize=abc").await;
    assert_eq!(defaults["page"], 1);
    assert_eq!(defaults["pageSize"], 10);

    let beyond = get(&app, "/march-bid-sheet?page=5").await;
    assert_eq!(beyond["entries"], json!([]));
}

#[tokio::test]
async fn test_filtered_combines_conditions() {
    let app = test_app();
    let page = get(
        &app,
        "/march-bid-sheet-filtered?customer=acme&pick=chicago,%20il&fromDate=2023-01-01&toDate=2023-01-02",
    )
    .await;

    assert_eq!(page["total"], 2);
    let ids: Vec<i64> = page["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["Id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 3]);

    let won = get(&app, "/march-bid-sheet-filtered?filter=won&equipment=all").await;
    assert_eq!(won["total"], 2);
}

#[tokio::test]
async fn test_lost_and_tbd_pages() {
    let app = test_app();
    let lost = get(&app, "/march-bid-sheet/lost").await;
    assert_eq!(lost["total"], 1);
    assert_eq!(lost["entries"][0]["Customer"], "Beta");

    let tbd = get(&app, "/march-bid-sheet/tbd?pageSize=1").await;
    assert_eq!(tbd["total"], 1);
    assert_eq!(tbd["entries"][0]["Id"], 3);
}

#[tokio::test]
async fn test_add_new_entry_appends_and_persists() {
    let app = test_app();
    let (status, body) = call(
        &app,
        Method::POST,
        "/add-new-entry",
        Some(json!({"Customer": "Delta", "Won/Lost": "TBD", "Notes": "new column"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "message": "Entry added successfully"}));

    let page = get(&app, "/march-bid-sheet?page=1&pageSize=10").await;
    assert_eq!(page["total"], 5);
    assert_eq!(page["entries"][4]["Id"], 5);
    assert_eq!(page["entries"][4]["Notes"], "new column");

    let reloaded = BidStore::load(&app.path).unwrap();
    assert_eq!(reloaded.len(), 5);
    assert_eq!(reloaded.records()[4].customer(), Some("Delta"));
}

#[tokio::test]
async fn test_patch_status_by_position() {
    let app = test_app();
    let (status, body) = call(
        &app,
        Method::PATCH,
        "/patch-bid-with-new-status",
        Some(json!({"id": "2", "newStatus": "WON"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    // 位置 2 是 Id 3 的记录
    let store = app.store.read().await;
    assert_eq!(store.records()[2].id, 3);
    assert_eq!(store.records()[2].status(), Some("WON"));
}

#[tokio::test]
async fn test_patch_status_out_of_range() {
    let app = test_app();
    let before = app.store.read().await.records().to_vec();

    let (status, body) = call(
        &app,
        Method::PATCH,
        "/patch-bid-with-new-status",
        Some(json!({"id": 4, "newStatus": "WON"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(app.store.read().await.records(), before.as_slice());

    let (status, _) = call(
        &app,
        Method::PATCH,
        "/patch-bid-with-new-status",
        Some(json!({"id": "abc", "newStatus": "WON"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_history_sorted_desc() {
    let app = test_app();
    let (status, body) = call(
        &app,
        Method::POST,
        "/get-history",
        Some(json!({"Pick": "chicago, il 60601 ", "Del": "DALLAS, TX"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["Id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![3, 1]);

    let (_, empty) = call(&app, Method::POST, "/get-history", Some(json!({}))).await;
    assert_eq!(empty, json!([]));
}

#[tokio::test]
async fn test_reports() {
    let app = test_app();

    let counts = get(&app, "/num-of-bids").await;
    assert_eq!(counts["all"], 4);
    assert_eq!(counts["won"], 2);
    assert_eq!(counts["lost"], 1);
    assert_eq!(counts["tbd"], 1);
    assert_eq!(counts["thisMonth"], 0);

    let graph = get(&app, "/graph-data").await;
    assert_eq!(
        graph,
        json!([
            {"date": "2023-01-01", "bids": 1, "won": 1, "lost": 0, "tbd": 0},
            {"date": "2023-01-02", "bids": 2, "won": 0, "lost": 1, "tbd": 1}
        ])
    );

    let revenue = get(&app, "/revenue-by-customers").await;
    assert_eq!(
        revenue,
        json!([
            {"Name": "ACME", "Bids": 2, "Won": 1, "Lost": 0, "Revenue": 200},
            {"Name": "Beta", "Bids": 1, "Won": 0, "Lost": 1, "Revenue": 0}
        ])
    );

    let recent = get(&app, "/recent-bids").await;
    assert_eq!(recent.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_mailed_bid_requests_empty_mailbox() {
    let app = test_app();
    let emails = get(&app, "/mailed-bid-requests").await;
    assert_eq!(emails, json!([]));
}

#[tokio::test]
async fn test_mailed_bid_requests_hides_upstream_error() {
    let app = test_app_with_mailbox(Arc::new(RejectingMailbox));
    let (status, body) = call(&app, Method::GET, "/mailed-bid-requests", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Error reading mailed bid requests"}));
    assert!(!body.to_string().contains("s3cr3t"));
}
