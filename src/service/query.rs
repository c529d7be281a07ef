use crate::models::bid::{
    BidRecord, SENTINEL_CUSTOMER, STATUS_LOST, STATUS_TBD, STATUS_WON,
};
use crate::models::{parse_leading_int, BidCounts, CustomerRevenue, DailyBids, Page};
use crate::sheet::parse_date_text;
use chrono::NaiveDate;
use indexmap::IndexMap;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const RECENT_COUNT: usize = 5;

/// "不过滤" 的字面值
const MATCH_ALL: &str = "all";

const KNOWN_STATUSES: [&str; 3] = ["won", "lost", "tbd"];

/// 分页参数, 页码从 1 开始
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: usize,
    pub page_size: usize,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageParams {
    /// 从查询串解析; 非数字或小于 1 时取默认值
    pub fn parse(page: Option<&str>, page_size: Option<&str>) -> Self {
        let positive = |raw: Option<&str>, default: usize| {
            raw.and_then(parse_leading_int)
                .filter(|&v| v >= 1)
                .and_then(|v| usize::try_from(v).ok())
                .unwrap_or(default)
        };
        Self {
            page: positive(page, DEFAULT_PAGE),
            page_size: positive(page_size, DEFAULT_PAGE_SIZE),
        }
    }
}

/// 取 [(page-1)*size, page*size) 区间; 越界页返回空列表
pub fn paginate<T: Clone>(items: &[T], params: PageParams) -> Page<T> {
    let total = items.len();
    let start = (params.page - 1).saturating_mul(params.page_size);
    let entries = if start >= total {
        Vec::new()
    } else {
        let end = start.saturating_add(params.page_size).min(total);
        items[start..end].to_vec()
    };
    Page {
        page: params.page,
        page_size: params.page_size,
        total,
        total_pages: total.div_ceil(params.page_size),
        entries,
    }
}

/// 组合过滤条件, 空值或 "all" 表示不过滤
#[derive(Debug, Clone, Default)]
pub struct BidFilter {
    pub status: Option<String>,
    pub customer: Option<String>,
    pub equipment: Option<String>,
    pub pick: Option<String>,
    pub del: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

impl BidFilter {
    pub fn status(status: &str) -> Self {
        Self {
            status: Some(status.to_string()),
            ..Default::default()
        }
    }

    pub fn matches(&self, bid: &BidRecord) -> bool {
        status_matches(bid, self.status.as_deref())
            && contains_matches(bid.customer(), self.customer.as_deref())
            && contains_matches(bid.equipment(), self.equipment.as_deref())
            && location_matches(bid.pick(), self.pick.as_deref())
            && location_matches(bid.del(), self.del.as_deref())
            && date_in_range(bid, self.from_date.as_deref(), self.to_date.as_deref())
    }

    pub fn apply<'a>(&self, records: &'a [BidRecord]) -> Vec<&'a BidRecord> {
        records.iter().filter(|bid| self.matches(bid)).collect()
    }
}

fn active(filter: Option<&str>) -> Option<&str> {
    filter.filter(|f| !f.is_empty())
}

/// 状态过滤: 不区分大小写; 只识别 won/lost/tbd, 其他值不过滤
pub fn status_matches(bid: &BidRecord, filter: Option<&str>) -> bool {
    let Some(filter) = active(filter).map(str::to_lowercase) else {
        return true;
    };
    if !KNOWN_STATUSES.contains(&filter.as_str()) {
        return true;
    }
    bid.status()
        .filter(|s| !s.is_empty())
        .is_some_and(|s| s.to_lowercase() == filter)
}

/// 子串过滤 (客户 / 设备), 不区分大小写
pub fn contains_matches(field: Option<&str>, filter: Option<&str>) -> bool {
    let Some(filter) = active(filter).filter(|f| *f != MATCH_ALL) else {
        return true;
    };
    field
        .filter(|v| !v.is_empty())
        .is_some_and(|v| v.to_lowercase().contains(&filter.to_lowercase()))
}

/// 地点过滤 (Pick / Del)
///
/// 先按整串子串匹配; 不中时若过滤值是 "city, state", 要求同时包含城市 (小写) 与州 (大写).
pub fn location_matches(field: Option<&str>, filter: Option<&str>) -> bool {
    let Some(filter) = active(filter).filter(|f| *f != MATCH_ALL) else {
        return true;
    };
    let Some(field) = field.filter(|v| !v.is_empty()) else {
        return false;
    };

    let field_lower = field.to_lowercase();
    let filter_lower = filter.to_lowercase();
    let filter_lower = filter_lower.trim();
    if field_lower.contains(filter_lower) {
        return true;
    }

    let parts: Vec<&str> = filter_lower.split(',').collect();
    if let [city, state] = parts.as_slice() {
        let city = city.trim();
        let state = state.trim().to_uppercase();
        return field_lower.contains(city) && field.to_uppercase().contains(&state);
    }
    false
}

/// 日期区间 [from, to], 两端都给出时才生效; 依赖 YYYY-MM-DD 的字典序
pub fn date_in_range(bid: &BidRecord, from: Option<&str>, to: Option<&str>) -> bool {
    match (active(from), active(to)) {
        (Some(from), Some(to)) => bid
            .date()
            .is_some_and(|d| d >= from && d <= to),
        _ => true,
    }
}

/// 总数 / 各状态数 (精确匹配) / 本月数 ([月初, today])
pub fn counts(records: &[BidRecord], today: NaiveDate) -> BidCounts {
    let today_str = today.format("%Y-%m-%d").to_string();
    let month_start = today.format("%Y-%m-01").to_string();
    let count_status = |status: &str| records.iter().filter(|b| b.has_status(status)).count();

    BidCounts {
        all: records.len(),
        won: count_status(STATUS_WON),
        lost: count_status(STATUS_LOST),
        tbd: count_status(STATUS_TBD),
        this_month: records
            .iter()
            .filter_map(BidRecord::date)
            .filter(|d| *d >= month_start.as_str() && *d <= today_str.as_str())
            .count(),
    }
}

/// 按日期分组计数, 无日期的记录不输出; 按日期升序
pub fn time_series(records: &[BidRecord]) -> Vec<DailyBids> {
    let mut groups: IndexMap<&str, DailyBids> = IndexMap::new();
    for bid in records {
        let Some(date) = bid.date() else { continue };
        let entry = groups.entry(date).or_insert_with(|| DailyBids {
            date: date.to_string(),
            bids: 0,
            won: 0,
            lost: 0,
            tbd: 0,
        });
        entry.bids += 1;
        match bid.status() {
            Some(STATUS_WON) => entry.won += 1,
            Some(STATUS_LOST) => entry.lost += 1,
            Some(STATUS_TBD) => entry.tbd += 1,
            _ => {}
        }
    }

    let mut series: Vec<DailyBids> = groups.into_values().collect();
    // 无法解析的日期排在最后
    series.sort_by_key(|d| {
        let parsed = parse_date_text(&d.date);
        (parsed.is_none(), parsed)
    });
    series
}

/// 按客户汇总; 收入只累加 WON 记录中为正的前导整数报价
pub fn revenue_by_customer(records: &[BidRecord]) -> Vec<CustomerRevenue> {
    let mut groups: IndexMap<&str, Vec<&BidRecord>> = IndexMap::new();
    for bid in records {
        match bid.customer() {
            Some(c) if !c.is_empty() && c != SENTINEL_CUSTOMER => {
                groups.entry(c).or_default().push(bid);
            }
            _ => {}
        }
    }

    groups
        .into_iter()
        .map(|(name, bids)| {
            let won: Vec<&&BidRecord> = bids.iter().filter(|b| b.has_status(STATUS_WON)).collect();
            CustomerRevenue {
                name: name.to_string(),
                bids: bids.len(),
                won: won.len(),
                lost: bids.iter().filter(|b| b.has_status(STATUS_LOST)).count(),
                revenue: won
                    .iter()
                    .filter_map(|b| b.bid_rate())
                    .filter(|&rate| rate > 0)
                    .fold(0i64, i64::saturating_add),
            }
        })
        .collect()
}

/// 最后 n 条 (按存储顺序)
pub fn recent(records: &[BidRecord], n: usize) -> &[BidRecord] {
    &records[records.len().saturating_sub(n)..]
}

/// 同一线路 (Pick + Del, 去空白后不区分大小写相等) 的历史报价, 按日期降序
pub fn history<'a>(records: &'a [BidRecord], pick: &str, del: &str) -> Vec<&'a BidRecord> {
    let pick = pick.trim().to_lowercase();
    let del = del.trim().to_lowercase();
    let same = |field: Option<&str>, wanted: &str| {
        field
            .filter(|v| !v.is_empty())
            .is_some_and(|v| v.to_lowercase().trim() == wanted)
    };

    let mut matched: Vec<&BidRecord> = records
        .iter()
        .filter(|b| same(b.pick(), &pick) && same(b.del(), &del))
        .collect();
    // 无日期视为最旧
    matched.sort_by_key(|b| std::cmp::Reverse(b.date().and_then(parse_date_text)));
    matched
}
