use serde::Serialize;

/// 分页结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
    pub entries: Vec<T>,
}

/// 状态计数 (GET /num-of-bids)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidCounts {
    pub all: usize,
    pub won: usize,
    pub lost: usize,
    pub tbd: usize,
    pub this_month: usize,
}

/// 按日期汇总 (GET /graph-data)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyBids {
    pub date: String,
    pub bids: usize,
    pub won: usize,
    pub lost: usize,
    pub tbd: usize,
}

/// 按客户汇总 (GET /revenue-by-customers)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomerRevenue {
    pub name: String,
    pub bids: usize,
    pub won: usize,
    pub lost: usize,
    pub revenue: i64,
}
