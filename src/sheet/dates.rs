use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// 表格日期序列号的起点 (序列号 0)
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// 序列号的合理范围, 超出视为无效
const MAX_SERIAL_DAYS: f64 = 2_958_465.0;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// 序列号 N -> 1899-12-30 + N 天 (小数部分是时间, 舍去)
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial.abs() > MAX_SERIAL_DAYS {
        return None;
    }
    let (y, m, d) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// 宽松的文本日期解析
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.date_naive());
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
                .map(|dt| dt.date())
        })
}

/// 加载时的日期列归一化: 数字按序列号, 字符串按文本解析, 结果为 "YYYY-MM-DD" 或 null
pub fn normalize_date(raw: Option<&Value>) -> Value {
    let date = match raw {
        Some(Value::Number(n)) => n.as_f64().and_then(serial_to_date),
        Some(Value::String(s)) => parse_date_text(s),
        _ => None,
    };
    date.map(|d| Value::String(format_date(d)))
        .unwrap_or(Value::Null)
}
