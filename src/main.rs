use bid_sheet_api::client::{GeminiClient, GmailClient, ZipClient};
use bid_sheet_api::{api, AppConfig, BidStore, MailBidExtractor};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    dotenv::dotenv().ok();

    // 加载配置
    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config.redacted());

    // 启动时加载报价表, 之后不再读取文件
    let store = BidStore::load(&config.sheet.path)?.into_shared();

    // 外部服务
    let gmail = Arc::new(GmailClient::new(&config.mail, &config.http)?);
    let gemini = Arc::new(GeminiClient::new(&config.genai, &config.http)?);
    let extractor = Arc::new(MailBidExtractor::new(
        gmail,
        gemini,
        config.genai.prompt.clone(),
        config.mail.max_results,
    ));
    let zip = Arc::new(ZipClient::new(&config.zip, &config.http)?);

    let app = api::router(store, extractor, zip);

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
