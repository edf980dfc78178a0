// ==========================================
// 销售对账系统 - KPI 与分组汇总
// ==========================================
// 毛利按组计算: 销售额 − |成本合计|（先求和再取绝对值）
// ==========================================

use crate::domain::ledger::LedgerRow;
use crate::engine::aggregator::margin_pct;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

// ==========================================
// Kpis - 主要指标
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub net_sales: Decimal,
    pub costs: Decimal, // 绝对值
    pub margin: Decimal,
    pub margin_pct: Decimal,
    pub units: i64,
    pub documents: usize, // 不同单据号数量
}

impl Kpis {
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a LedgerRow>) -> Self {
        let mut net_sales = Decimal::ZERO;
        let mut cost_sum = Decimal::ZERO;
        let mut units = 0i64;
        let mut documents = HashSet::new();

        for row in rows {
            net_sales += row.total_sale();
            cost_sum += row.total_cost;
            units += row.quantity;
            if !row.document_number.is_empty() {
                documents.insert(row.document_number.as_str());
            }
        }

        let costs = cost_sum.abs();
        Kpis {
            net_sales,
            costs,
            margin: net_sales - costs,
            margin_pct: margin_pct(net_sales, cost_sum),
            units,
            documents: documents.len(),
        }
    }
}

// ==========================================
// GroupSummary - 分组汇总行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub key: String,
    #[serde(flatten)]
    pub kpis: Kpis,
}

/// 按键分组汇总,结果按销售额降序（同额按键升序）
pub fn summarize_by<F>(rows: &[LedgerRow], key: F) -> Vec<GroupSummary>
where
    F: Fn(&LedgerRow) -> &str,
{
    let mut groups: BTreeMap<&str, Vec<&LedgerRow>> = BTreeMap::new();
    for row in rows {
        let k = key(row);
        if k.is_empty() {
            continue;
        }
        groups.entry(k).or_default().push(row);
    }

    let mut summaries: Vec<GroupSummary> = groups
        .into_iter()
        .map(|(k, members)| GroupSummary {
            key: k.to_string(),
            kpis: Kpis::from_rows(members),
        })
        .collect();
    // BTreeMap 已按键排序,稳定排序保留同额时的键序
    summaries.sort_by(|a, b| b.kpis.net_sales.cmp(&a.kpis.net_sales));
    summaries
}

pub fn by_marketplace(rows: &[LedgerRow]) -> Vec<GroupSummary> {
    summarize_by(rows, |r| r.marketplace.as_str())
}

pub fn by_product_type(rows: &[LedgerRow]) -> Vec<GroupSummary> {
    summarize_by(rows, |r| r.product_type.as_str())
}

// ==========================================
// Rankings - 产品类型排名
// ==========================================

/// 排名默认条数
pub const DEFAULT_RANKING_SIZE: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Rankings {
    pub top_by_sales: Vec<GroupSummary>,     // 销售额最高的前 N 个产品类型
    pub bottom_by_margin: Vec<GroupSummary>, // 毛利额最低的前 N 个产品类型（升序）
}

/// 按产品类型排名: 销售额前 N + 毛利额后 N
pub fn rankings(rows: &[LedgerRow], n: usize) -> Rankings {
    let groups = by_product_type(rows);
    let top_by_sales = groups.iter().take(n).cloned().collect();

    let mut by_margin = groups;
    by_margin.sort_by(|a, b| a.kpis.margin.cmp(&b.kpis.margin));
    by_margin.truncate(n);

    Rankings {
        top_by_sales,
        bottom_by_margin: by_margin,
    }
}
