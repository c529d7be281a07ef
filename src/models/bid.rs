use indexmap::IndexMap;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

pub const COL_ID: &str = "Id";
pub const COL_DATE: &str = "Date";
pub const COL_CUSTOMER: &str = "Customer";
pub const COL_EQUIPMENT: &str = "Equipment";
pub const COL_PICK: &str = "Pick";
pub const COL_DEL: &str = "Del";
pub const COL_STATUS: &str = "Won/Lost";
/// 原表列名两侧带空格
pub const COL_BID_RATE: &str = " Bid Rate ";

/// 加载时丢弃的辅助列
pub const DROPPED_COLUMNS: [&str; 2] = ["__EMPTY", "Bid Count"];

/// "未选择客户" 占位值, 不参与客户汇总
pub const SENTINEL_CUSTOMER: &str = "CHOOSE A CUSTOMER";

pub const STATUS_WON: &str = "WON";
pub const STATUS_LOST: &str = "LOST";
pub const STATUS_TBD: &str = "TBD";

/// 报价记录 (表格中的一行)
///
/// `id` 是加载/追加时分配的 1-based 序号, 不写回表格.
/// 其余列原样保存在 `fields` 中, 保持列顺序.
#[derive(Debug, Clone, PartialEq)]
pub struct BidRecord {
    pub id: usize,
    pub fields: IndexMap<String, Value>,
}

impl BidRecord {
    pub fn new(id: usize, mut fields: IndexMap<String, Value>) -> Self {
        fields.shift_remove(COL_ID);
        Self { id, fields }
    }

    /// 字符串列的值; 缺失或非字符串视为无值
    pub fn text(&self, column: &str) -> Option<&str> {
        match self.fields.get(column) {
            Some(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn date(&self) -> Option<&str> {
        self.text(COL_DATE).filter(|d| !d.is_empty())
    }

    pub fn status(&self) -> Option<&str> {
        self.text(COL_STATUS)
    }

    pub fn customer(&self) -> Option<&str> {
        self.text(COL_CUSTOMER)
    }

    pub fn equipment(&self) -> Option<&str> {
        self.text(COL_EQUIPMENT)
    }

    pub fn pick(&self) -> Option<&str> {
        self.text(COL_PICK)
    }

    pub fn del(&self) -> Option<&str> {
        self.text(COL_DEL)
    }

    /// 状态精确匹配 (区分大小写)
    pub fn has_status(&self, status: &str) -> bool {
        self.status() == Some(status)
    }

    /// 报价金额: 只取前导整数部分, 无法解析时为 None
    pub fn bid_rate(&self) -> Option<i64> {
        match self.fields.get(COL_BID_RATE)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
            Value::String(s) => parse_leading_int(s),
            _ => None,
        }
    }

    pub fn set_status(&mut self, status: Value) {
        self.fields.insert(COL_STATUS.to_string(), status);
    }
}

impl Serialize for BidRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(COL_ID, &self.id)?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// 前导整数解析: 跳过前导空白, 可选符号, 之后的数字; "150abc" -> 150, "abc" -> None
pub fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_end = rest
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    let value: i64 = rest[..digits_end].parse().ok()?;
    Some(if negative { -value } else { value })
}
