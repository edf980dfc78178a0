// ==========================================
// 销售对账系统 - 导入层
// ==========================================
// 职责: 外部导出文件读取,生成台账/成本/单据记录
// 支持: Excel, CSV, HTML 表格
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod source;
pub mod table;

// 重导出核心类型
pub use data_cleaner::DataCleaner;
pub use error::{ImportError, ImportResult};
pub use field_mapper::{CostRecord, FieldMapper};
pub use file_parser::{CsvParser, ExcelParser, FileParser, HtmlTableParser, UniversalFileParser};
pub use source::{FileSource, GridSource, MemorySource};
pub use table::{HeaderRow, RawGrid, Table, TableRow};
