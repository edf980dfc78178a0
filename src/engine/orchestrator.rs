// ==========================================
// 销售对账系统 - 对账流水线编排器
// ==========================================
// 用途: 协调导入 → 分段 → 市场解析 → 成本分配 → 合并 → 过滤 → 汇总
// 红线: 一次运行只读取一份不可变 RunConfig
// 红线: 任一致命错误立即返回,不产生任何输出
// ==========================================

use crate::config::run_config::RunConfig;
use crate::domain::ledger::Ledger;
use crate::domain::report::{RunReport, SalesReport};
use crate::engine::aggregator::{apply_filters, Aggregator};
use crate::engine::classifier::SectionClassifier;
use crate::engine::cost::{CostAssigner, CostMap};
use crate::engine::error::ReconResult;
use crate::engine::merger::LedgerMerger;
use crate::engine::resolver::{MarketplaceResolver, ResolvedSections};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::source::{FileSource, GridSource};
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

// ==========================================
// RunOutput - 运行结果
// ==========================================
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// 对账后的完整台账（未过滤）
    pub ledger: Ledger,

    /// 已解析的六张子表
    pub sections: ResolvedSections,

    /// 汇总报表（基于过滤后的台账）
    pub report: SalesReport,

    /// 运行报告
    pub run_report: RunReport,
}

// ==========================================
// ReconciliationPipeline - 对账流水线
// ==========================================
pub struct ReconciliationPipeline {
    config: RunConfig,
}

impl ReconciliationPipeline {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// 按配置中的文件路径执行
    pub fn run(&self) -> ReconResult<RunOutput> {
        let ledger = FileSource::new(&self.config.ledger.path);
        let costs = self.config.costs.as_ref().map(|s| FileSource::new(&s.path));
        let annual = self.config.annual.as_ref().map(|s| FileSource::new(&s.path));

        self.run_with_sources(
            &ledger,
            costs.as_ref().map(|s| s as &dyn GridSource),
            annual.as_ref().map(|s| s as &dyn GridSource),
        )
    }

    /// 以任意数据源执行（表头行仍取自配置）
    pub fn run_with_sources(
        &self,
        ledger_source: &dyn GridSource,
        cost_source: Option<&dyn GridSource>,
        annual_source: Option<&dyn GridSource>,
    ) -> ReconResult<RunOutput> {
        let config = &self.config;
        let mut run_report = RunReport::new(Uuid::new_v4().to_string());
        let span = info_span!("reconcile", run_id = %run_report.run_id);
        let _guard = span.enter();

        info!(ledger = %ledger_source.name(), "开始对账");

        // ==========================================
        // 步骤1: 读取销售台账
        // ==========================================
        let mut table = ledger_source.load_table(config.ledger.header_row)?;
        if config.drop_ledger_total_row {
            table = table.without_last_row();
        }
        let ledger = FieldMapper.map_ledger(
            &table,
            config.report.product_code_len,
            &config.rules.no_data_label,
        )?;
        run_report.ledger_rows = ledger.len();
        debug!(rows = ledger.len(), "步骤1: 销售台账读取完成");

        // ==========================================
        // 步骤2: 成本分配
        // ==========================================
        let ledger = match cost_source {
            Some(source) => {
                let header_row = config
                    .costs
                    .as_ref()
                    .map(|s| s.header_row)
                    .unwrap_or_default();
                let records = FieldMapper.map_cost_records(&source.load_table(header_row)?)?;
                run_report.cost_rows = records.len();
                let cost_map = CostMap::build(&records);
                CostAssigner::new(&cost_map).assign(&ledger)
            }
            None => {
                info!("步骤2: 未提供成本导出,跳过成本查找");
                CostAssigner::sign_only(&ledger)
            }
        };

        // ==========================================
        // 步骤3: 年度导出分段 + 市场解析 + 回写
        // ==========================================
        let (ledger, sections) = match annual_source {
            Some(source) => {
                let header_row = config
                    .annual
                    .as_ref()
                    .map(|s| s.header_row)
                    .unwrap_or_default();
                let classifier =
                    SectionClassifier::new(&source.name(), source.load_grid()?, header_row)?;
                let sections = classifier.slice_all(&config.optional_sections)?;
                run_report.extend(sections.warnings.iter().cloned());

                let (resolved, warnings) =
                    MarketplaceResolver::new(&config.rules).resolve(&sections);
                run_report.extend(warnings);
                run_report.sub_table_rows = resolved.row_counts();

                let (merged, warnings) =
                    LedgerMerger::new(&config.rules).attach_marketplaces(&ledger, &resolved);
                run_report.extend(warnings);
                (merged, resolved)
            }
            None => {
                info!("步骤3: 未提供年度导出,跳过市场解析");
                (ledger, ResolvedSections::default())
            }
        };

        // ==========================================
        // 步骤4: 排除过滤 + 汇总
        // ==========================================
        let (filtered, warnings) = apply_filters(&ledger, &config.filters);
        run_report.extend(warnings);
        run_report.filtered_rows = filtered.len();

        let report = Aggregator::new(config.report).summarize(&filtered);

        for (kind, count) in run_report.warning_summary() {
            warn!(kind = ?kind, count, "运行告警");
        }
        info!(
            ledger_rows = run_report.ledger_rows,
            filtered_rows = run_report.filtered_rows,
            warnings = run_report.total_warnings(),
            "对账完成"
        );

        Ok(RunOutput {
            ledger,
            sections,
            report,
            run_report,
        })
    }
}
