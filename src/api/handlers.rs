use crate::client::ZipClient;
use crate::error::AppError;
use crate::models::{parse_leading_int, BidRecord, Page};
use crate::service::mail_pipeline::MailBidExtractor;
use crate::service::query::{self, BidFilter, PageParams, RECENT_COUNT};
use crate::service::store::SharedStore;
use crate::sheet::Row;
use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// 分页查询参数
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<String>,
}

impl PageQuery {
    fn params(&self) -> PageParams {
        PageParams::parse(self.page.as_deref(), self.page_size.as_deref())
    }
}

/// 组合过滤查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterQuery {
    pub filter: Option<String>,
    pub customer: Option<String>,
    pub equipment: Option<String>,
    pub pick: Option<String>,
    pub del: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl FilterQuery {
    fn into_parts(self) -> (BidFilter, PageParams) {
        let params = PageParams::parse(self.page.as_deref(), self.page_size.as_deref());
        let filter = BidFilter {
            status: self.filter,
            customer: self.customer,
            equipment: self.equipment,
            pick: self.pick,
            del: self.del,
            from_date: self.from_date,
            to_date: self.to_date,
        };
        (filter, params)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipQuery {
    pub zip_code: Option<String>,
}

/// 线路历史请求体
#[derive(Debug, Default, Deserialize)]
pub struct HistoryRequest {
    #[serde(rename = "Pick", default)]
    pub pick: String,
    #[serde(rename = "Del", default)]
    pub del: String,
}

/// 改状态请求体; id 可以是数字或数字字符串
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchStatusRequest {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub new_status: Value,
}

/// 变更类接口的响应体
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub success: bool,
    pub message: String,
}

impl MutationResponse {
    fn reply(status: StatusCode, success: bool, message: impl Into<String>) -> Response {
        let body = Self {
            success,
            message: message.into(),
        };
        (status, Json(body)).into_response()
    }
}

fn page_of(records: &[&BidRecord], params: PageParams) -> Page<BidRecord> {
    let page = query::paginate(records, params);
    Page {
        page: page.page,
        page_size: page.page_size,
        total: page.total,
        total_pages: page.total_pages,
        entries: page.entries.into_iter().cloned().collect(),
    }
}

/// 位置索引: 数字取整数部分, 字符串取前导整数
fn parse_index(id: &Value) -> Option<i64> {
    match id {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => parse_leading_int(s),
        _ => None,
    }
}

/// 表头列名
pub async fn columns_headers(State(store): State<SharedStore>) -> Json<Vec<String>> {
    Json(store.read().await.headers().to_vec())
}

/// 全量分页
pub async fn bid_sheet(
    State(store): State<SharedStore>,
    Query(q): Query<PageQuery>,
) -> Json<Page<BidRecord>> {
    let store = store.read().await;
    let all: Vec<&BidRecord> = store.records().iter().collect();
    Json(page_of(&all, q.params()))
}

/// 组合过滤 + 分页
pub async fn bid_sheet_filtered(
    State(store): State<SharedStore>,
    Query(q): Query<FilterQuery>,
) -> Json<Page<BidRecord>> {
    tracing::info!("Filters: {:?}", q);
    let (filter, params) = q.into_parts();
    let store = store.read().await;
    let matched = filter.apply(store.records());
    Json(page_of(&matched, params))
}

async fn status_page(store: SharedStore, status: &str, q: PageQuery) -> Json<Page<BidRecord>> {
    let store = store.read().await;
    let matched = BidFilter::status(status).apply(store.records());
    Json(page_of(&matched, q.params()))
}

pub async fn lost_bids(
    State(store): State<SharedStore>,
    Query(q): Query<PageQuery>,
) -> Json<Page<BidRecord>> {
    status_page(store, "lost", q).await
}

pub async fn tbd_bids(
    State(store): State<SharedStore>,
    Query(q): Query<PageQuery>,
) -> Json<Page<BidRecord>> {
    status_page(store, "tbd", q).await
}

/// 追加记录并写回表格
pub async fn add_new_entry(
    State(store): State<SharedStore>,
    Json(entry): Json<Row>,
) -> Response {
    let mut store = store.write().await;
    match store.append(entry) {
        Ok(_) => MutationResponse::reply(StatusCode::OK, true, "Entry added successfully"),
        Err(e) => {
            tracing::error!("Error adding entry: {}", e);
            MutationResponse::reply(StatusCode::INTERNAL_SERVER_ERROR, false, "Error adding entry")
        }
    }
}

/// 按位置索引修改 Won/Lost 并写回表格
pub async fn patch_bid_status(
    State(store): State<SharedStore>,
    Json(req): Json<PatchStatusRequest>,
) -> Response {
    let Some(index) = parse_index(&req.id) else {
        return MutationResponse::reply(
            StatusCode::BAD_REQUEST,
            false,
            format!("Invalid id: {}", req.id),
        );
    };

    let mut store = store.write().await;
    match store.patch_status(index, req.new_status) {
        Ok(()) => MutationResponse::reply(StatusCode::OK, true, "Status updated"),
        Err(e @ AppError::OutOfRange { .. }) => {
            tracing::warn!("Patch rejected: {}", e);
            MutationResponse::reply(StatusCode::NOT_FOUND, false, e.to_string())
        }
        Err(e) => {
            tracing::error!("Error updating status: {}", e);
            MutationResponse::reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                false,
                "Error updating status",
            )
        }
    }
}

/// 同一线路的历史报价, 按日期降序
pub async fn get_history(
    State(store): State<SharedStore>,
    Json(req): Json<HistoryRequest>,
) -> Json<Vec<BidRecord>> {
    let store = store.read().await;
    let history = query::history(store.records(), &req.pick, &req.del);
    Json(history.into_iter().cloned().collect())
}

/// 状态计数, "本月" 以服务器本地日期为准
pub async fn num_of_bids(State(store): State<SharedStore>) -> Response {
    let today = chrono::Local::now().date_naive();
    let counts = query::counts(store.read().await.records(), today);
    (StatusCode::OK, Json(counts)).into_response()
}

pub async fn graph_data(State(store): State<SharedStore>) -> Response {
    let series = query::time_series(store.read().await.records());
    (StatusCode::OK, Json(series)).into_response()
}

pub async fn revenue_by_customers(State(store): State<SharedStore>) -> Response {
    let report = query::revenue_by_customer(store.read().await.records());
    (StatusCode::OK, Json(report)).into_response()
}

pub async fn recent_bids(State(store): State<SharedStore>) -> Response {
    let store = store.read().await;
    let recent = query::recent(store.records(), RECENT_COUNT).to_vec();
    (StatusCode::OK, Json(recent)).into_response()
}

/// 邮编查询代理
pub async fn zip_code_lookup(
    State(zip): State<Arc<ZipClient>>,
    Query(q): Query<ZipQuery>,
) -> Response {
    let zip_code = q.zip_code.unwrap_or_default();
    match zip.lookup(&zip_code).await {
        Ok(Some(data)) => (StatusCode::OK, Json(data)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "ZIP code not found"})),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Error fetching ZIP code data: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Error fetching ZIP code data"})),
            )
                .into_response()
        }
    }
}

/// 按需运行一次邮件报价提取
pub async fn mailed_bid_requests(State(extractor): State<Arc<MailBidExtractor>>) -> Response {
    match extractor.run().await {
        Ok(emails) => (StatusCode::OK, Json(emails)).into_response(),
        Err(e) => {
            tracing::error!("Mail extraction failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Error reading mailed bid requests"})),
            )
                .into_response()
        }
    }
}
