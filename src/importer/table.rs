// ==========================================
// 销售对账系统 - 原始网格与表
// ==========================================
// 阶段 0: 文件 → RawGrid（保留物理行号）
// 阶段 1: RawGrid + 表头行 → Table（列名 → 单元格）
// ==========================================
// 红线: 表头行为 1 起的物理行号,与后台导出的 "从第 N 行开始" 一致
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// RawGrid - 原始单元格网格
// ==========================================
// rows[i] 即源文件第 i+1 行,空行保留
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawGrid {
    pub rows: Vec<Vec<String>>,
}

impl RawGrid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// 便于测试/内存数据源构造
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ==========================================
// HeaderRow - 表头行号（1 起）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct HeaderRow(usize);

impl HeaderRow {
    pub fn new(row: usize) -> Option<Self> {
        (row >= 1).then_some(Self(row))
    }

    /// 解析用户输入的表头行号
    ///
    /// # 错误
    /// - 非数字 / 0 → InvalidOffset
    pub fn parse(source_name: &str, text: &str) -> ImportResult<Self> {
        let trimmed = text.trim();
        let invalid = |reason: &str| ImportError::InvalidOffset {
            source_name: source_name.to_string(),
            value: trimmed.to_string(),
            reason: reason.to_string(),
        };

        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("必须为正整数"));
        }
        let row: usize = trimmed.parse().map_err(|_| invalid("数值超出范围"))?;
        Self::new(row).ok_or_else(|| invalid("行号从 1 开始"))
    }

    /// 1 起行号
    pub fn get(self) -> usize {
        self.0
    }

    /// 0 起网格下标
    pub fn index(self) -> usize {
        self.0 - 1
    }
}

impl Default for HeaderRow {
    fn default() -> Self {
        Self(1)
    }
}

impl TryFrom<usize> for HeaderRow {
    type Error = String;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        HeaderRow::new(value).ok_or_else(|| "表头行号从 1 开始".to_string())
    }
}

impl From<HeaderRow> for usize {
    fn from(value: HeaderRow) -> Self {
        value.0
    }
}

impl fmt::Display for HeaderRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ==========================================
// Table - 带列名的数据表
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub line: usize, // 源文件行号（1 起）
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub source_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl Table {
    /// 以配置的表头行读取
    pub fn from_grid(source_name: &str, grid: &RawGrid, header_row: HeaderRow) -> ImportResult<Table> {
        if header_row.index() >= grid.len() {
            return Err(ImportError::InvalidOffset {
                source_name: source_name.to_string(),
                value: header_row.to_string(),
                reason: format!("超出文件行数 ({} 行)", grid.len()),
            });
        }
        Ok(Self::from_grid_at(source_name, grid, header_row.index()))
    }

    /// 以网格下标为表头重新读取（分段切片使用）
    ///
    /// - 空表头列（"Unnamed"）连同数据一起丢弃
    /// - 完全空白的数据行跳过
    pub fn from_grid_at(source_name: &str, grid: &RawGrid, header_index: usize) -> Table {
        let header_cells = grid.rows.get(header_index).cloned().unwrap_or_default();
        let kept: Vec<usize> = header_cells
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.trim().is_empty())
            .map(|(idx, _)| idx)
            .collect();

        let headers = kept
            .iter()
            .map(|&idx| header_cells[idx].trim().to_string())
            .collect();

        let rows = grid
            .rows
            .iter()
            .enumerate()
            .skip(header_index + 1)
            .filter_map(|(grid_idx, raw)| {
                let cells: Vec<String> = kept
                    .iter()
                    .map(|&idx| raw.get(idx).map(|c| c.trim().to_string()).unwrap_or_default())
                    .collect();
                if cells.iter().all(|c| c.is_empty()) {
                    None
                } else {
                    Some(TableRow {
                        line: grid_idx + 1,
                        cells,
                    })
                }
            })
            .collect();

        Table {
            source_name: source_name.to_string(),
            headers,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// 必需列
    ///
    /// # 错误
    /// - 列不存在 → MalformedInput
    pub fn require_column(&self, name: &str) -> ImportResult<usize> {
        self.column_index(name).ok_or_else(|| ImportError::MalformedInput {
            source_name: self.source_name.clone(),
            column: name.to_string(),
        })
    }

    /// 按前缀匹配列名（长列头带格式说明时使用）
    pub fn column_with_prefix(&self, prefix: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.starts_with(prefix))
    }

    pub fn require_column_with_prefix(&self, prefix: &str) -> ImportResult<usize> {
        self.column_with_prefix(prefix)
            .ok_or_else(|| ImportError::MalformedInput {
                source_name: self.source_name.clone(),
                column: prefix.to_string(),
            })
    }

    /// 丢弃末行（销售台账末尾的合计行）
    pub fn without_last_row(mut self) -> Table {
        self.rows.pop();
        self
    }
}

impl TableRow {
    pub fn cell(&self, idx: usize) -> &str {
        self.cells.get(idx).map(String::as_str).unwrap_or("")
    }

    pub fn opt_cell(&self, idx: Option<usize>) -> &str {
        idx.map(|i| self.cell(i)).unwrap_or("")
    }
}
