use serde::{Deserialize, Serialize};

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub sheet: SheetConfig,
    pub mail: MailConfig,
    pub genai: GenAiConfig,
    pub zip: ZipConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 表格数据源 (CSV 文件)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    pub path: String,
}

/// 邮箱服务 (OAuth refresh token 授权)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub api_base: String,
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub user_id: String,
    pub query: String,
    pub max_results: u32,
}

/// 文本生成服务
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenAiConfig {
    pub api_base: String,
    pub model: String,
    pub api_key: String,
    /// 拼接在邮件正文之后的固定指令
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZipConfig {
    pub base_url: String,
}

/// 出站请求的超时与重试
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub retry_attempts: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3222,
            },
            sheet: SheetConfig {
                path: "./bid_sheets_merged.csv".to_string(),
            },
            mail: MailConfig {
                api_base: "https://gmail.googleapis.com/gmail/v1".to_string(),
                token_url: "https://oauth2.googleapis.com/token".to_string(),
                client_id: String::new(),
                client_secret: String::new(),
                refresh_token: String::new(),
                user_id: "me".to_string(),
                query: "is:unread".to_string(),
                max_results: 10,
            },
            genai: GenAiConfig {
                api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                model: "gemini-2.0-flash-lite".to_string(),
                api_key: String::new(),
                prompt: String::new(),
            },
            zip: ZipConfig {
                base_url: "http://api.zippopotam.us/us".to_string(),
            },
            http: HttpConfig {
                timeout_secs: 30,
                retry_attempts: 2,
            },
        }
    }
}

impl AppConfig {
    /// 加载配置: 默认值 -> bidsheet.toml (可选) -> BIDSHEET_* 环境变量 -> 旧环境变量名 (GEMINI_API_KEY 等)
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = |name: &str| std::env::var(name).ok();

        config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("bidsheet").required(false))
            .add_source(
                config::Environment::with_prefix("BIDSHEET")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", env("SERVER_HOST"))?
            .set_override_option("server.port", env("SERVER_PORT"))?
            .set_override_option("genai.api_key", env("GEMINI_API_KEY"))?
            .set_override_option("genai.prompt", env("PROMPT"))?
            .set_override_option("mail.client_id", env("GMAIL_CLIENT_ID"))?
            .set_override_option("mail.client_secret", env("GMAIL_CLIENT_SECRET"))?
            .set_override_option("mail.refresh_token", env("GMAIL_REFRESH_TOKEN"))?
            .build()?
            .try_deserialize()
    }

    /// 用于启动日志, 隐去凭据
    pub fn redacted(&self) -> Self {
        let mask = |s: &str| if s.is_empty() { String::new() } else { "***".to_string() };
        let mut cfg = self.clone();
        cfg.mail.client_secret = mask(&cfg.mail.client_secret);
        cfg.mail.refresh_token = mask(&cfg.mail.refresh_token);
        cfg.genai.api_key = mask(&cfg.genai.api_key);
        cfg
    }
}
