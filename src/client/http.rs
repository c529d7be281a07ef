use crate::config::HttpConfig;
use crate::error::{AppError, Result};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

/// 重试间隔基数, 第 n 次重试等待 n * BASE
const RETRY_BACKOFF_BASE: Duration = Duration::from_millis(250);

/// 带超时的出站 HTTP 客户端
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// 幂等 GET 的有限重试: 连接失败 / 超时 / 5xx 时重试, 其余直接返回
pub async fn get_with_retry(request: RequestBuilder, retry_attempts: u32) -> Result<Response> {
    let mut attempt = 0u32;
    loop {
        let req = request
            .try_clone()
            .ok_or_else(|| AppError::upstream("request body cannot be retried"))?;
        let retries_left = attempt < retry_attempts;

        match req.send().await {
            Ok(resp) if resp.status().is_server_error() && retries_left => {
                tracing::warn!(
                    "{} returned {}, retrying ({}/{})",
                    resp.url(),
                    resp.status(),
                    attempt + 1,
                    retry_attempts
                );
            }
            Ok(resp) => return Ok(resp),
            Err(e) if (e.is_timeout() || e.is_connect()) && retries_left => {
                tracing::warn!("Request failed: {}, retrying ({}/{})", e, attempt + 1, retry_attempts);
            }
            Err(e) => return Err(e.into()),
        }

        attempt += 1;
        tokio::time::sleep(RETRY_BACKOFF_BASE * attempt).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::StatusCode, routing::get, Router};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// 本地服务: 前 `failures` 次请求返回 `fail_status`, 之后返回 200; 返回 URL 和计数器
    async fn flaky_server(failures: u32, fail_status: StatusCode) -> (String, Arc<AtomicU32>) {
        let hits = Arc::new(AtomicU32::new(0));
        let app = Router::new()
            .route(
                "/",
                get(move |State(hits): State<Arc<AtomicU32>>| async move {
                    if hits.fetch_add(1, Ordering::SeqCst) < failures {
                        fail_status
                    } else {
                        StatusCode::OK
                    }
                }),
            )
            .with_state(hits.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/", addr), hits)
    }

    fn client() -> Client {
        build_client(&HttpConfig {
            timeout_secs: 5,
            retry_attempts: 2,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_retries_after_server_error() {
        let (url, hits) = flaky_server(1, StatusCode::SERVICE_UNAVAILABLE).await;

        let resp = get_with_retry(client().get(&url), 2).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_retry_attempts() {
        let (url, hits) = flaky_server(u32::MAX, StatusCode::SERVICE_UNAVAILABLE).await;

        let resp = get_with_retry(client().get(&url), 2).await.unwrap();
        // 重试耗尽后返回最后一次的 5xx
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let (url, hits) = flaky_server(u32::MAX, StatusCode::NOT_FOUND).await;

        let resp = get_with_retry(client().get(&url), 2).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_connect_error_is_retried_then_returned() {
        // 绑定后立即释放端口, 连接会被拒绝
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let err = get_with_retry(client().get(&url), 1).await.unwrap_err();
        assert!(matches!(err, AppError::Http(ref e) if e.is_connect()));
    }
}
