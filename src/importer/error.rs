// ==========================================
// 销售对账系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.ods/.csv/.html）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("HTML 表格解析失败: {0}")]
    HtmlParseError(String),

    // ===== 表结构错误 =====
    #[error("缺少必需列 ({source_name}): {column}")]
    MalformedInput { source_name: String, column: String },

    #[error("表头行配置无效 ({source_name}, 值 {value}): {reason}")]
    InvalidOffset {
        source_name: String,
        value: String,
        reason: String,
    },

    // ===== 数据映射错误 =====
    #[error("类型转换失败 ({source_name} 行 {line}, 字段 {field}): {message}")]
    TypeConversionError {
        source_name: String,
        line: usize,
        field: String,
        message: String,
    },
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
