use crate::error::{AppError, Result};
use crate::models::bid::{BidRecord, COL_DATE, COL_ID, DROPPED_COLUMNS};
use crate::sheet::{self, normalize_date, Row, SheetData};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// 在多个 handler 间共享的报价表
/// 变更 + 写回在同一把写锁内完成
pub type SharedStore = Arc<RwLock<BidStore>>;

/// 报价表 (进程内唯一数据源)
///
/// 启动时从表格文件加载一次, 之后只在追加/改状态时整表写回, 不再读取文件.
/// 行顺序即追加顺序, `id` 严格递增.
#[derive(Debug)]
pub struct BidStore {
    path: PathBuf,
    headers: Vec<String>,
    records: Vec<BidRecord>,
}

impl BidStore {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let sheet = sheet::read_sheet(&path)?;
        let store = Self::from_sheet(path, sheet);
        tracing::info!(
            "Loaded {} bid records ({} columns) from {}",
            store.records.len(),
            store.headers.len(),
            store.path.display()
        );
        Ok(store)
    }

    /// 由已读取的表格构建, 计算派生字段 (Id, Date)
    pub fn from_sheet(path: impl Into<PathBuf>, sheet: SheetData) -> Self {
        let records = sheet
            .rows
            .into_iter()
            .enumerate()
            .map(|(idx, row)| normalize_row(idx + 1, row))
            .collect();
        Self {
            path: path.into(),
            headers: sheet.headers,
            records,
        }
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 表头行 (非空列名, 原顺序)
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[BidRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 追加一条记录, Id = 当前条数 + 1, 然后整表写回
    ///
    /// 写回失败时内存中的追加不回滚.
    pub fn append(&mut self, mut fields: Row) -> Result<usize> {
        fields.shift_remove(COL_ID);
        let id = self.records.len() + 1;
        self.records.push(BidRecord::new(id, fields));
        tracing::info!("Appended bid record {}", id);
        self.persist()?;
        Ok(id)
    }

    /// 按位置索引 (不是 Id) 修改 Won/Lost, 然后整表写回
    pub fn patch_status(&mut self, index: i64, status: Value) -> Result<()> {
        let len = self.records.len();
        let record = usize::try_from(index)
            .ok()
            .and_then(|i| self.records.get_mut(i))
            .ok_or(AppError::OutOfRange { index, len })?;

        tracing::info!(
            "Patching status of record at index {} (Id {}) to {}",
            index,
            record.id,
            status
        );
        record.set_status(status);
        self.persist()
    }

    /// 整表覆盖写回 (不含 Id 列)
    pub fn persist(&self) -> Result<()> {
        let rows: Vec<&Row> = self.records.iter().map(|r| &r.fields).collect();
        sheet::write_sheet(&self.path, &rows).map_err(|e| {
            tracing::error!("Failed to persist {}: {}", self.path.display(), e);
            e
        })
    }
}

fn normalize_row(id: usize, mut row: Row) -> BidRecord {
    for col in DROPPED_COLUMNS {
        row.shift_remove(col);
    }
    let date = normalize_date(row.get(COL_DATE));
    row.insert(COL_DATE.to_string(), date);
    BidRecord::new(id, row)
}
