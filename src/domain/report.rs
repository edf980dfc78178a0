// ==========================================
// 销售对账系统 - 报表与运行报告实体
// ==========================================
// 职责: 透视汇总结果 + 非致命告警（数据质量报告）
// ==========================================

use crate::domain::types::DocumentKind;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 透视表合计行的键
pub const TOTAL_KEY: &str = "Total";

// ==========================================
// BranchSummary - 门店汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchSummary {
    pub branch: String,
    pub quantity: i64,
    pub gross_amount: i64,
    pub tax_amount: i64,
}

// ==========================================
// MarginRow - 销售/成本/毛利率透视行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginRow {
    pub key: String,
    pub total_sale: Decimal,
    pub total_cost: Decimal,
    pub margin_pct: Decimal, // 保留 2 位小数
}

impl MarginRow {
    /// 整数毛利率（向零截断,与输出工作表一致）
    pub fn margin_whole(&self) -> i64 {
        self.margin_pct.trunc().to_i64().unwrap_or(0)
    }

    pub fn is_total(&self) -> bool {
        self.key == TOTAL_KEY
    }
}

// ==========================================
// ProductRank - 产品销量排名
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRank {
    pub product_type: String,
    pub product: String,
    pub quantity: i64,
}

// ==========================================
// SalesReport - 汇总报表
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesReport {
    pub by_branch: Vec<BranchSummary>,
    pub by_product_type: Vec<MarginRow>, // 末行为 Total
    pub by_marketplace: Vec<MarginRow>,  // 末行为 Total
    pub product_type_below_threshold: Vec<MarginRow>,
    pub marketplace_below_threshold: Vec<MarginRow>,
    pub top_products: Vec<ProductRank>,
    pub bottom_products: Vec<ProductRank>,
}

// ==========================================
// WarningKind - 非致命告警类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningKind {
    UnresolvedReference,     // 关联单据查找未命中
    DuplicateDocumentNumber, // 子表内单据号重复
    MissingSection,          // 可选分段缺失
    UnknownFilterColumn,     // 过滤列不存在,过滤被忽略
    UnresolvedMarketplace,   // 台账行最终落到哨兵值
}

// ==========================================
// RunWarning - 告警明细
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunWarning {
    pub kind: WarningKind,
    pub document_kind: Option<DocumentKind>,
    pub line: Option<usize>,
    pub message: String,
}

// ==========================================
// RunReport - 运行报告
// ==========================================
// 红线: 告警计数完整;明细每类只保留前 WARNING_SAMPLE_LIMIT 条样本
// ==========================================

/// 每类告警保留的样本条数
pub const WARNING_SAMPLE_LIMIT: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub ledger_rows: usize,
    pub cost_rows: usize,
    pub filtered_rows: usize,
    pub sub_table_rows: BTreeMap<DocumentKind, usize>,
    pub warning_counts: BTreeMap<WarningKind, usize>,
    pub warnings: Vec<RunWarning>, // 样本
}

impl RunReport {
    pub fn new(run_id: String) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            ledger_rows: 0,
            cost_rows: 0,
            filtered_rows: 0,
            sub_table_rows: BTreeMap::new(),
            warning_counts: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn warn(&mut self, warning: RunWarning) {
        let seen = self.warning_counts.entry(warning.kind).or_insert(0);
        *seen += 1;
        if *seen <= WARNING_SAMPLE_LIMIT {
            self.warnings.push(warning);
        }
    }

    pub fn extend(&mut self, warnings: impl IntoIterator<Item = RunWarning>) {
        for warning in warnings {
            self.warn(warning);
        }
    }

    pub fn count(&self, kind: WarningKind) -> usize {
        self.warning_counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_warnings(&self) -> usize {
        self.warning_counts.values().sum()
    }

    /// 按告警类型汇总
    pub fn warning_summary(&self) -> BTreeMap<WarningKind, usize> {
        self.warning_counts.clone()
    }
}
