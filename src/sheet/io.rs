use crate::error::Result;
use indexmap::{IndexMap, IndexSet};
use serde_json::{Number, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// 空表头单元格的占位列名
const EMPTY_HEADER: &str = "__EMPTY";

pub type Row = IndexMap<String, Value>;

/// 读取结果: 原始表头 (去掉空单元格) + 数据行
#[derive(Debug, Clone, Default)]
pub struct SheetData {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

pub fn read_sheet(path: &Path) -> Result<SheetData> {
    let file = File::open(path)?;
    read_sheet_from(file)
}

/// 从 CSV 读取
/// 空单元格不生成字段, 全空行跳过, 能原样写回的数字单元格转为 JSON 数字
pub fn read_sheet_from<R: Read>(reader: R) -> Result<SheetData> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let raw_headers = rdr.headers()?.clone();
    let headers: Vec<String> = raw_headers
        .iter()
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .collect();
    let keys = column_keys(raw_headers.iter());

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let row: Row = record
            .iter()
            .zip(keys.iter())
            .filter(|(cell, _)| !cell.is_empty())
            .map(|(cell, key)| (key.clone(), cell_value(cell)))
            .collect();
        if !row.is_empty() {
            rows.push(row);
        }
    }

    Ok(SheetData { headers, rows })
}

/// 表头 -> 字段名: 空表头命名为 __EMPTY, __EMPTY_1, ...; 重名追加 _1, _2
fn column_keys<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .map(|h| {
            let base = if h.is_empty() { EMPTY_HEADER } else { h };
            let n = seen.entry(base.to_string()).or_insert(0);
            let key = if *n == 0 {
                base.to_string()
            } else {
                format!("{}_{}", base, n)
            };
            *n += 1;
            key
        })
        .collect()
}

/// 单元格类型推断: 数字写回后与原文完全一致时才转为 JSON 数字, 否则保留原字符串
/// (前导零, 正号, 尾随零, 超出 i64 精度的长数字都保持原样)
fn cell_value(cell: &str) -> Value {
    let number = cell
        .parse::<i64>()
        .ok()
        .map(Number::from)
        .or_else(|| cell.parse::<f64>().ok().and_then(Number::from_f64));
    match number {
        Some(n) if n.to_string() == cell => Value::Number(n),
        _ => Value::String(cell.to_string()),
    }
}

fn value_cell(value: Option<&Value>) -> Result<String> {
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => serde_json::to_string(other)?,
    })
}

/// 整表写回: 表头为所有行字段的并集 (按首次出现顺序)
pub fn write_sheet_to<W: Write>(writer: W, rows: &[&Row]) -> Result<()> {
    let header: IndexSet<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .collect();

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(header.iter())?;
    for row in rows {
        let cells = header
            .iter()
            .map(|key| value_cell(row.get(*key)))
            .collect::<Result<Vec<_>>>()?;
        wtr.write_record(&cells)?;
    }
    wtr.flush()?;
    Ok(())
}

/// 覆盖写入: 先写同目录临时文件再 rename
pub fn write_sheet(path: &Path, rows: &[&Row]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sheet.csv".to_string());
    let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));

    let file = File::create(&tmp_path)?;
    write_sheet_to(file, rows)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
