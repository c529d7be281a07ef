use crate::config::{HttpConfig, ZipConfig};
use crate::error::{AppError, Result};
use crate::client::http::{build_client, get_with_retry};
use reqwest::Url;
use serde_json::Value;

/// 公共邮编查询 (zippopotam.us)
pub struct ZipClient {
    http: reqwest::Client,
    base_url: String,
    retry_attempts: u32,
}

impl ZipClient {
    pub fn new(config: &ZipConfig, http: &HttpConfig) -> Result<Self> {
        Ok(Self {
            http: build_client(http)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry_attempts: http.retry_attempts,
        })
    }

    /// 邮编作为单个路径段追加, `/` 等字符被转义
    fn lookup_url(&self, zip_code: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::upstream(format!("invalid ZIP base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::upstream(format!("ZIP base URL {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .push(zip_code);
        Ok(url)
    }

    /// 查询成功返回原始 JSON; 服务端非 2xx 时为 None
    pub async fn lookup(&self, zip_code: &str) -> Result<Option<Value>> {
        let url = self.lookup_url(zip_code)?;
        let response = get_with_retry(self.http.get(url), self.retry_attempts).await?;
        if !response.status().is_success() {
            tracing::info!("ZIP lookup {} returned {}", zip_code, response.status());
            return Ok(None);
        }
        Ok(Some(response.json().await?))
    }
}
