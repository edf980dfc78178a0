// ==========================================
// 销售对账系统 - 配置层
// ==========================================
// 职责: 运行配置 + 解析规则字面量
// 来源: 默认值 < JSON 配置文件 < 命令行参数
// ==========================================

pub mod rules;
pub mod run_config;

// 重导出核心配置类型
pub use rules::ResolverRules;
pub use run_config::{
    ExclusionFilter, FilterSet, ReportSettings, RunConfig, RunConfigFile, SourceSpec,
};
