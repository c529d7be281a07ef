pub mod handlers;

pub use handlers::*;

use crate::client::ZipClient;
use crate::service::mail_pipeline::MailBidExtractor;
use crate::service::store::SharedStore;
use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

/// 构建路由: 报价表 / 邮编 / 邮件三组路由各自持有状态后合并
pub fn router(
    store: SharedStore,
    extractor: Arc<MailBidExtractor>,
    zip: Arc<ZipClient>,
) -> Router {
    let sheet_routes = Router::new()
        .route("/columns-headers", get(columns_headers))
        .route("/march-bid-sheet", get(bid_sheet))
        .route("/march-bid-sheet-filtered", get(bid_sheet_filtered))
        .route("/march-bid-sheet/lost", get(lost_bids))
        .route("/march-bid-sheet/tbd", get(tbd_bids))
        .route("/add-new-entry", post(add_new_entry))
        .route("/get-history", post(get_history))
        .route("/patch-bid-with-new-status", patch(patch_bid_status))
        .route("/num-of-bids", get(num_of_bids))
        .route("/graph-data", get(graph_data))
        .route("/revenue-by-customers", get(revenue_by_customers))
        .route("/recent-bids", get(recent_bids))
        .with_state(store);

    let zip_routes = Router::new()
        .route("/getzipcodeepls", get(zip_code_lookup))
        .with_state(zip);

    let mail_routes = Router::new()
        .route("/mailed-bid-requests", get(mailed_bid_requests))
        .with_state(extractor);

    Router::new()
        .merge(sheet_routes)
        .merge(zip_routes)
        .merge(mail_routes)
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
}
