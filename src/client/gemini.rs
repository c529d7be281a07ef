use crate::config::{GenAiConfig, HttpConfig};
use crate::client::http::build_client;
use crate::error::{AppError, Result};
use crate::service::mail_pipeline::TextGenerator;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

/// generateContent 单次调用, 不重试
pub struct GeminiClient {
    http: reqwest::Client,
    config: GenAiConfig,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &GenAiConfig, http: &HttpConfig) -> Result<Self> {
        Ok(Self {
            http: build_client(http)?,
            config: config.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }
}

/// 第一个候选的所有文本片段拼接
fn reply_text(response: GenerateResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    Some(text)
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}]
        });
        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::upstream(format!(
                "text generation returned {}",
                response.status()
            )));
        }

        let parsed: GenerateResponse = response.json().await?;
        reply_text(parsed).ok_or_else(|| AppError::upstream("text generation returned no candidates"))
    }
}
