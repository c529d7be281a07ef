use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// 统一错误类型
#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Base64 decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    /// 位置索引越界 (PatchStatus)
    #[error("Index {index} out of range (store has {len} records)")]
    OutOfRange { index: i64, len: usize },

    /// 外部服务返回了非预期结果
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl AppError {
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }
}
