// ==========================================
// 销售对账系统 - 对账引擎错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 非致命问题（查找未命中、重复单据号）走 RunWarning,不走错误
// ==========================================

use crate::importer::error::ImportError;
use thiserror::Error;

/// 对账运行错误类型（致命,运行中止且不落盘）
#[derive(Error, Debug)]
pub enum ReconError {
    // ===== 输入错误 =====
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("年度导出中未找到分段: {literal}")]
    SectionNotFound { literal: String },

    // ===== 配置错误 =====
    #[error("过滤配置不一致: {columns} 个列名, {groups} 组排除值")]
    FilterConfigMismatch { columns: usize, groups: usize },

    #[error("配置错误: {0}")]
    Config(String),

    // ===== 输出错误 =====
    #[error("工作簿生成失败: {0}")]
    Export(String),

    #[error("文件写入失败: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rust_xlsxwriter::XlsxError> for ReconError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ReconError::Export(err.to_string())
    }
}

impl From<tempfile::PersistError> for ReconError {
    fn from(err: tempfile::PersistError) -> Self {
        ReconError::Io(err.error)
    }
}

/// Result 类型别名
pub type ReconResult<T> = Result<T, ReconError>;
