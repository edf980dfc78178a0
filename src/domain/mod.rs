// ==========================================
// 销售对账系统 - 领域模型层
// ==========================================
// 职责: 定义台账、单据、报表实体与类型
// 红线: 不含文件读写逻辑,不含引擎逻辑
// ==========================================

pub mod columns;
pub mod document;
pub mod ledger;
pub mod report;
pub mod types;

// 重导出核心类型
pub use document::{DocumentRef, DocumentRow, SubTable};
pub use ledger::{CellValue, Ledger, LedgerRow};
pub use report::{
    BranchSummary, MarginRow, ProductRank, RunReport, RunWarning, SalesReport, WarningKind,
    TOTAL_KEY, WARNING_SAMPLE_LIMIT,
};
pub use types::{DocumentKind, NO_DATA};
