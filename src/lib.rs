// ==========================================
// 销售对账系统 - 核心库
// ==========================================
// 职责: 销售台账对账 + 市场归因 + 汇总报表
// 技术栈: Rust + calamine/csv/scraper 读取 + rust_xlsxwriter 写出
// 系统定位: 批处理工具（一次运行 = 一份配置 = 两个输出工作簿）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 运行配置与解析规则
pub mod config;

// 引擎层 - 业务规则
pub mod engine;

// 导出层 - 工作簿输出
pub mod exporter;

// 分析层 - 只读视图
pub mod analytics;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DocumentKind, NO_DATA};

// 领域实体
pub use domain::{
    DocumentRef, DocumentRow, Ledger, LedgerRow, RunReport, RunWarning, SalesReport, SubTable,
    WarningKind,
};

// 配置
pub use config::{FilterSet, ReportSettings, ResolverRules, RunConfig, RunConfigFile};

// 引擎
pub use engine::{
    Aggregator, CostAssigner, CostMap, LedgerMerger, MarketplaceResolver, ReconError,
    ReconResult, ReconciliationPipeline, ResolvedSections, RunOutput, SectionClassifier,
};

// 导入
pub use importer::{FileSource, GridSource, ImportError, MemorySource};

// 导出
pub use exporter::{OutputPaths, WorkbookExporter};

// ==========================================
// 版本信息
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "销售对账系统";
