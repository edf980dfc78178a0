// ==========================================
// 销售对账系统 - 数据源抽象
// ==========================================
// 职责: "从数据源 S 读取网格",与文件系统解耦
// ==========================================

use crate::importer::error::ImportResult;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::table::{HeaderRow, RawGrid, Table};
use std::path::PathBuf;
use tracing::debug;

// ==========================================
// GridSource Trait
// ==========================================
pub trait GridSource {
    /// 数据源名称（出现在错误信息中）
    fn name(&self) -> String;

    /// 读取原始网格
    fn load_grid(&self) -> ImportResult<RawGrid>;

    /// 读取网格并按表头行生成表
    fn load_table(&self, header_row: HeaderRow) -> ImportResult<Table> {
        let grid = self.load_grid()?;
        Table::from_grid(&self.name(), &grid, header_row)
    }
}

// ==========================================
// FileSource - 文件数据源
// ==========================================
#[derive(Debug, Clone)]
pub struct FileSource {
    pub path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl GridSource for FileSource {
    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    fn load_grid(&self) -> ImportResult<RawGrid> {
        let grid = UniversalFileParser.parse(&self.path)?;
        debug!(path = %self.path.display(), rows = grid.len(), "网格读取完成");
        Ok(grid)
    }
}

// ==========================================
// MemorySource - 内存数据源（测试/嵌入使用）
// ==========================================
#[derive(Debug, Clone)]
pub struct MemorySource {
    pub name: String,
    pub grid: RawGrid,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, grid: RawGrid) -> Self {
        Self {
            name: name.into(),
            grid,
        }
    }
}

impl GridSource for MemorySource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn load_grid(&self) -> ImportResult<RawGrid> {
        Ok(self.grid.clone())
    }
}
