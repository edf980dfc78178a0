// ==========================================
// 销售对账系统 - 分析层
// ==========================================
// 职责: 对账后台账的只读分析（过滤、KPI、趋势、分组汇总、排名）
// 红线: 不修改台账,不参与对账流水线
// ==========================================

pub mod filter;
pub mod summary;
pub mod trend;

pub use filter::{is_sale, ColumnFilter, ViewFilter};
pub use summary::{
    by_marketplace, by_product_type, rankings, GroupSummary, Kpis, Rankings, DEFAULT_RANKING_SIZE,
};
pub use trend::{trend, with_moving_average, Period, TrendPoint};

use crate::config::rules::ResolverRules;
use crate::config::run_config::ReportSettings;
use crate::domain::ledger::Ledger;
use crate::engine::error::{ReconError, ReconResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::source::GridSource;
use crate::importer::table::HeaderRow;
use serde::Serialize;
use tracing::{debug, instrument};

/// 对账工作簿中表头所在行（上方留 2 行空白）
pub const RECONCILED_HEADER_ROW: usize = 3;

/// 读取对账工作簿的第一张工作表（Actualizado）为台账
#[instrument(skip_all, fields(source = %source.name()))]
pub fn load_reconciled(source: &dyn GridSource) -> ReconResult<Ledger> {
    let header_row = HeaderRow::new(RECONCILED_HEADER_ROW)
        .ok_or_else(|| ReconError::Config("表头行号从 1 开始".to_string()))?;
    let table = source.load_table(header_row)?;
    let ledger = FieldMapper.map_ledger(
        &table,
        ReportSettings::default().product_code_len,
        &ResolverRules::default().no_data_label,
    )?;
    debug!(rows = ledger.len(), "对账台账读取完成");
    Ok(ledger)
}

// ==========================================
// AnalyticsSummary - 一次分析的完整结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub rows: usize,
    pub kpis: Kpis,
    pub period: Period,
    pub trend: Vec<TrendPoint>,
    pub by_marketplace: Vec<GroupSummary>,
    pub by_product_type: Vec<GroupSummary>,
    pub rankings: Rankings,
}

/// 过滤后计算全部指标
pub fn analyze(
    ledger: &Ledger,
    filter: &ViewFilter,
    period: Period,
    moving_average: Option<usize>,
    ranking_size: usize,
) -> AnalyticsSummary {
    let view = filter.apply(ledger);
    let points = trend(&view.rows, period);
    let points = match moving_average {
        Some(window) => with_moving_average(points, window),
        None => points,
    };

    AnalyticsSummary {
        rows: view.len(),
        kpis: Kpis::from_rows(&view.rows),
        period,
        trend: points,
        by_marketplace: by_marketplace(&view.rows),
        by_product_type: by_product_type(&view.rows),
        rankings: rankings(&view.rows, ranking_size),
    }
}
