// ==========================================
// 销售对账系统 - 汇总引擎
// ==========================================
// 职责: 排除过滤 + 门店透视 + 销售/成本/毛利率透视 + 销量排名
// ==========================================
// 红线: 毛利率在销售额为 0 时返回 0,永不除零
// 红线: 透视按键排序,末尾追加 Total 行（Total 覆盖全部行,含空键行）
// 红线: 排名为稳定降序,同量按键升序
// ==========================================

use crate::config::run_config::{FilterSet, ReportSettings};
use crate::domain::ledger::{Ledger, LedgerRow};
use crate::domain::report::{
    BranchSummary, MarginRow, ProductRank, RunWarning, SalesReport, WarningKind, TOTAL_KEY,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// 毛利率 = (销售额 - |成本|) / 销售额 × 100,保留 2 位小数
pub fn margin_pct(total_sale: Decimal, total_cost: Decimal) -> Decimal {
    if total_sale.is_zero() {
        return Decimal::ZERO;
    }
    ((total_sale - total_cost.abs()) / total_sale * Decimal::ONE_HUNDRED).round_dp(2)
}

// ==========================================
// 排除过滤
// ==========================================

/// 应用排除过滤器
///
/// 任一过滤列不存在时放弃全部过滤,返回原台账 + UnknownFilterColumn 告警
pub fn apply_filters(ledger: &Ledger, filters: &FilterSet) -> (Ledger, Vec<RunWarning>) {
    if filters.is_empty() {
        return (ledger.clone(), Vec::new());
    }

    let unknown: Vec<&str> = filters
        .iter()
        .map(|f| f.column.as_str())
        .filter(|column| !ledger.has_column(column))
        .collect();
    if !unknown.is_empty() {
        warn!(columns = ?unknown, "过滤列不存在,本次不应用过滤");
        let warnings = unknown
            .into_iter()
            .map(|column| RunWarning {
                kind: WarningKind::UnknownFilterColumn,
                document_kind: None,
                line: None,
                message: format!("过滤列不存在: {}", column),
            })
            .collect();
        return (ledger.clone(), warnings);
    }

    let rows: Vec<LedgerRow> = ledger
        .rows
        .iter()
        .filter(|row| {
            filters.iter().all(|f| {
                let value = ledger.value_of(row, &f.column).unwrap_or_default();
                !f.excludes(&value)
            })
        })
        .cloned()
        .collect();

    info!(before = ledger.len(), after = rows.len(), "排除过滤完成");
    (ledger.with_rows(rows), Vec::new())
}

// ==========================================
// 透视
// ==========================================

/// 门店透视: 数量/含税/税额求和并取整,按门店排序
pub fn branch_pivot(rows: &[LedgerRow]) -> Vec<BranchSummary> {
    let mut groups: BTreeMap<&str, (i64, Decimal, Decimal)> = BTreeMap::new();
    for row in rows.iter().filter(|r| !r.branch.is_empty()) {
        let entry = groups
            .entry(row.branch.as_str())
            .or_insert((0, Decimal::ZERO, Decimal::ZERO));
        entry.0 += row.quantity;
        entry.1 += row.gross_amount;
        entry.2 += row.tax_amount;
    }

    groups
        .into_iter()
        .map(|(branch, (quantity, gross, tax))| BranchSummary {
            branch: branch.to_string(),
            quantity,
            gross_amount: to_whole(gross),
            tax_amount: to_whole(tax),
        })
        .collect()
}

/// 销售/成本/毛利率透视（按键排序 + Total 行）
pub fn margin_pivot<F>(rows: &[LedgerRow], key: F) -> Vec<MarginRow>
where
    F: Fn(&LedgerRow) -> &str,
{
    let mut groups: BTreeMap<&str, (Decimal, Decimal)> = BTreeMap::new();
    let mut total = (Decimal::ZERO, Decimal::ZERO);
    for row in rows {
        total.0 += row.total_sale();
        total.1 += row.total_cost;

        let k = key(row);
        if k.is_empty() {
            continue;
        }
        let entry = groups.entry(k).or_insert((Decimal::ZERO, Decimal::ZERO));
        entry.0 += row.total_sale();
        entry.1 += row.total_cost;
    }

    let mut pivot: Vec<MarginRow> = groups
        .into_iter()
        .map(|(k, (sale, cost))| margin_row(k, sale, cost))
        .collect();
    pivot.push(margin_row(TOTAL_KEY, total.0, total.1));
    pivot
}

fn margin_row(key: &str, total_sale: Decimal, total_cost: Decimal) -> MarginRow {
    MarginRow {
        key: key.to_string(),
        total_sale,
        total_cost,
        margin_pct: margin_pct(total_sale, total_cost),
    }
}

/// 整数毛利率 <= 阈值的行（含 Total）
pub fn below_threshold(pivot: &[MarginRow], threshold: i64) -> Vec<MarginRow> {
    pivot
        .iter()
        .filter(|row| row.margin_whole() <= threshold)
        .cloned()
        .collect()
}

// ==========================================
// 排名
// ==========================================

/// 按 (产品类型, 产品族) 汇总数量并降序排列
pub fn product_ranking(rows: &[LedgerRow]) -> Vec<ProductRank> {
    let mut groups: BTreeMap<(&str, &str), i64> = BTreeMap::new();
    for row in rows
        .iter()
        .filter(|r| !r.product_type.is_empty() && !r.product.is_empty())
    {
        *groups
            .entry((row.product_type.as_str(), row.product.as_str()))
            .or_insert(0) += row.quantity;
    }

    let mut ranking: Vec<ProductRank> = groups
        .into_iter()
        .map(|((product_type, product), quantity)| ProductRank {
            product_type: product_type.to_string(),
            product: product.to_string(),
            quantity,
        })
        .collect();
    // 键已有序,稳定排序保证同量按键升序
    ranking.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    ranking
}

/// 前 N / 后 N（后 N 保持降序）
pub fn top_and_bottom(ranking: &[ProductRank], n: usize) -> (Vec<ProductRank>, Vec<ProductRank>) {
    let top = ranking.iter().take(n).cloned().collect();
    let bottom = ranking[ranking.len().saturating_sub(n)..].to_vec();
    (top, bottom)
}

fn to_whole(value: Decimal) -> i64 {
    value.round().to_i64().unwrap_or_default()
}

// ==========================================
// Aggregator - 汇总入口
// ==========================================
pub struct Aggregator {
    settings: ReportSettings,
}

impl Aggregator {
    pub fn new(settings: ReportSettings) -> Self {
        Self { settings }
    }

    /// 生成全部报表（调用方已完成过滤）
    pub fn summarize(&self, ledger: &Ledger) -> SalesReport {
        let rows = &ledger.rows;

        let by_product_type = margin_pivot(rows, |r| r.product_type.as_str());
        let by_marketplace = margin_pivot(rows, |r| r.marketplace.as_str());
        let ranking = product_ranking(rows);
        let (top_products, bottom_products) = top_and_bottom(&ranking, self.settings.ranking_size);

        let report = SalesReport {
            by_branch: branch_pivot(rows),
            product_type_below_threshold: below_threshold(
                &by_product_type,
                self.settings.margin_threshold,
            ),
            marketplace_below_threshold: below_threshold(
                &by_marketplace,
                self.settings.margin_threshold,
            ),
            by_product_type,
            by_marketplace,
            top_products,
            bottom_products,
        };

        debug!(
            branches = report.by_branch.len(),
            product_types = report.by_product_type.len() - 1,
            marketplaces = report.by_marketplace.len() - 1,
            "汇总完成"
        );
        report
    }
}
