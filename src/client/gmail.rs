use crate::client::http::{build_client, get_with_retry};
use crate::config::{HttpConfig, MailConfig};
use crate::error::{AppError, Result};
use crate::models::{MailMessage, MessageList};
use crate::service::mail_pipeline::{MailSession, MailSource};
use async_trait::async_trait;
use serde::Deserialize;

/// Gmail REST 客户端, 使用 refresh token 换取 access token
pub struct GmailClient {
    http: reqwest::Client,
    config: MailConfig,
    retry_attempts: u32,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl GmailClient {
    pub fn new(config: &MailConfig, http: &HttpConfig) -> Result<Self> {
        Ok(Self {
            http: build_client(http)?,
            config: config.clone(),
            retry_attempts: http.retry_attempts,
        })
    }
}

#[async_trait]
impl MailSource for GmailClient {
    async fn authorize(&self) -> Result<Box<dyn MailSession>> {
        if self.config.refresh_token.is_empty() {
            return Err(AppError::upstream("mail refresh token is not configured"));
        }

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", self.config.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(format!(
                "token exchange failed: {} {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await?;
        tracing::debug!("Mail access token refreshed");

        Ok(Box::new(GmailSession {
            http: self.http.clone(),
            messages_url: format!(
                "{}/users/{}/messages",
                self.config.api_base.trim_end_matches('/'),
                self.config.user_id
            ),
            query: self.config.query.clone(),
            access_token: token.access_token,
            retry_attempts: self.retry_attempts,
        }))
    }
}

struct GmailSession {
    http: reqwest::Client,
    messages_url: String,
    query: String,
    access_token: String,
    retry_attempts: u32,
}

impl GmailSession {
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let request = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .query(query);
        let response = get_with_retry(request, self.retry_attempts).await?;
        if !response.status().is_success() {
            return Err(AppError::upstream(format!(
                "mail API {} returned {}",
                url,
                response.status()
            )));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl MailSession for GmailSession {
    async fn list_unread(&self, max_results: u32) -> Result<Vec<String>> {
        let list: MessageList = self
            .get_json(
                &self.messages_url,
                &[("q", self.query.clone()), ("maxResults", max_results.to_string())],
            )
            .await?;
        Ok(list.messages.into_iter().map(|m| m.id).collect())
    }

    async fn fetch_message(&self, id: &str) -> Result<MailMessage> {
        let url = format!("{}/{}", self.messages_url, id);
        self.get_json(&url, &[("format", "full".to_string())]).await
    }
}
