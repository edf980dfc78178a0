// ==========================================
// 销售对账系统 - 引擎层
// ==========================================
// 职责: 分段、市场解析、成本分配、合并与汇总规则
// 红线: 引擎不读写文件（数据源经 GridSource 注入）
// 红线: 每个阶段返回新表,不修改输入
// ==========================================

pub mod aggregator;
pub mod classifier;
pub mod cost;
pub mod error;
pub mod merger;
pub mod orchestrator;
pub mod reference;
pub mod resolver;

// 重导出核心引擎
pub use aggregator::{margin_pct, Aggregator};
pub use classifier::{SectionClassifier, Sections};
pub use cost::{CostAssigner, CostEntry, CostMap};
pub use error::{ReconError, ReconResult};
pub use merger::LedgerMerger;
pub use orchestrator::{ReconciliationPipeline, RunOutput};
pub use reference::parse_reference;
pub use resolver::{MarketplaceResolver, ResolvedSections};
