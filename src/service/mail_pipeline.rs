use crate::error::{AppError, Result};
use crate::models::{EmailBidExtraction, MailMessage, MessagePart};
use async_trait::async_trait;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde_json::Value;
use std::sync::Arc;

/// 回复中 parsedInfo 所在的键
const PARSED_INFO_KEY: &str = "parsedInfo";

/// Date header 只保留前 25 个字符
const DATE_HEADER_CHARS: usize = 25;

/// 宽松的 base64 解码 (填充可有可无)
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// 邮箱服务: 授权后得到一个会话
#[async_trait]
pub trait MailSource: Send + Sync {
    async fn authorize(&self) -> Result<Box<dyn MailSession>>;
}

/// 已授权的邮箱会话
#[async_trait]
pub trait MailSession: Send + Sync {
    /// 未读邮件 ID, 最多 max_results 个
    async fn list_unread(&self, max_results: u32) -> Result<Vec<String>>;

    async fn fetch_message(&self, id: &str) -> Result<MailMessage>;
}

/// 文本生成服务 (单次 prompt -> 文本)
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// 邮件报价提取
/// 授权 -> 列出未读 -> 逐封 (获取 -> 取正文 -> 生成 -> 解析)
/// 单封失败只记录日志并跳过, 不重试
pub struct MailBidExtractor {
    source: Arc<dyn MailSource>,
    generator: Arc<dyn TextGenerator>,
    prompt_suffix: String,
    max_results: u32,
}

impl MailBidExtractor {
    pub fn new(
        source: Arc<dyn MailSource>,
        generator: Arc<dyn TextGenerator>,
        prompt_suffix: impl Into<String>,
        max_results: u32,
    ) -> Self {
        Self {
            source,
            generator,
            prompt_suffix: prompt_suffix.into(),
            max_results,
        }
    }

    /// 授权或列表失败时整体返回错误, 其余失败逐封跳过
    pub async fn run(&self) -> Result<Vec<EmailBidExtraction>> {
        let session = self.source.authorize().await?;
        let ids = session.list_unread(self.max_results).await?;
        tracing::info!("Found {} unread messages", ids.len());

        let mut emails = Vec::new();
        for (idx, message_id) in ids.iter().enumerate() {
            let seq = idx + 1;
            match self.process_message(session.as_ref(), seq, message_id).await {
                Ok(Some(email)) => emails.push(email),
                Ok(None) => tracing::warn!("No parsedInfo for email {}", seq),
                Err(e) => tracing::error!("Error processing email {}: {}", seq, e),
            }
        }

        tracing::info!(
            "Extracted bid info from {}/{} messages",
            emails.len(),
            ids.len()
        );
        Ok(emails)
    }

    async fn process_message(
        &self,
        session: &dyn MailSession,
        seq: usize,
        message_id: &str,
    ) -> Result<Option<EmailBidExtraction>> {
        let message = session.fetch_message(message_id).await?;
        let payload = &message.payload;

        let from = sender_address(payload.header("From"));
        let subject = payload.header("Subject").to_string();
        let date: String = payload.header("Date").chars().take(DATE_HEADER_CHARS).collect();
        let body = extract_body(payload)?;

        let prompt = format!("{}{}", body, self.prompt_suffix);
        let reply = self.generator.generate(&prompt).await?;
        let parsed = parse_reply(&reply).map_err(|e| {
            tracing::error!("Failed to parse AI response for email {}: {}", seq, e);
            e
        })?;

        let parsed_info = match parsed.get(PARSED_INFO_KEY) {
            Some(info) if is_truthy(info) => info.clone(),
            _ => return Ok(None),
        };

        Ok(Some(EmailBidExtraction {
            id: seq,
            body,
            from,
            subject,
            date,
            parsed_info,
        }))
    }
}

/// "Name <addr>" -> addr
pub fn sender_address(from: &str) -> String {
    match from.find('<') {
        Some(start) => {
            let rest = &from[start + 1..];
            let mut chars = rest.chars();
            chars.next_back();
            chars.as_str().to_string()
        }
        None => from.to_string(),
    }
}

/// URL-safe base64 (-, _) 转标准字母表后解码, 非法 UTF-8 按替换字符处理
pub fn decode_body(data: &str) -> Result<String> {
    let standard: String = data
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    let bytes = LENIENT_BASE64.decode(standard.as_bytes())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// 正文: 优先顶层 body, 否则第一个 text/plain 或 text/html 的 part
pub fn extract_body(payload: &MessagePart) -> Result<String> {
    if let Some(data) = payload.body_data() {
        return Ok(decode_body(data)?.trim().to_string());
    }
    let part = payload.parts.iter().find(|p| {
        matches!(p.mime_type.as_deref(), Some("text/plain") | Some("text/html"))
    });
    match part.and_then(MessagePart::body_data) {
        Some(data) => Ok(decode_body(data)?.trim().to_string()),
        None => Ok(String::new()),
    }
}

/// 去掉 Markdown 代码块标记后按 JSON 解析
pub fn parse_reply(reply: &str) -> Result<Value> {
    let cleaned = reply.replace("```json", "").replace("```", "");
    let value: Value = serde_json::from_str(cleaned.trim())?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(AppError::upstream(format!(
            "generated reply is not an object: {}",
            value
        )))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
