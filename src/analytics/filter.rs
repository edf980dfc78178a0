// ==========================================
// 销售对账系统 - 分析视图过滤器
// ==========================================
// 职责: 在对账后台账上选取分析子集（只读）
// 红线: 过滤只挑选行,不改写任何字段
// ==========================================

use crate::domain::ledger::{Ledger, LedgerRow};
use crate::domain::types::DocumentKind;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 销售类变动的 Tipo Movimiento 取值
pub const SALE_MOVEMENT: &str = "venta";

// ==========================================
// ColumnFilter - 任意列的值集合过滤
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ColumnFilter {
    /// 只保留取值在集合内的行
    Include {
        column: String,
        values: BTreeSet<String>,
    },
    /// 剔除取值在集合内的行
    Exclude {
        column: String,
        values: BTreeSet<String>,
    },
}

impl ColumnFilter {
    pub fn include<I, S>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnFilter::Include {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn exclude<I, S>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnFilter::Exclude {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    fn matches(&self, ledger: &Ledger, row: &LedgerRow) -> bool {
        let (column, values, include) = match self {
            ColumnFilter::Include { column, values } => (column, values, true),
            ColumnFilter::Exclude { column, values } => (column, values, false),
        };
        // 空集合不过滤
        if values.is_empty() {
            return true;
        }
        let hit = ledger
            .value_of(row, column)
            .map(|v| values.contains(&v))
            .unwrap_or(false);
        hit == include
    }
}

// ==========================================
// ViewFilter - 分析视图过滤条件
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewFilter {
    pub include_returns: bool,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub marketplace: Option<String>,
    pub branch: Option<String>,
    pub product_types: BTreeSet<String>,
    pub columns: Vec<ColumnFilter>,
}

impl ViewFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_returns(mut self, include: bool) -> Self {
        self.include_returns = include;
        self
    }

    pub fn date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn marketplace(mut self, marketplace: impl Into<String>) -> Self {
        self.marketplace = Some(marketplace.into());
        self
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn product_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.product_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn column(mut self, filter: ColumnFilter) -> Self {
        self.columns.push(filter);
        self
    }

    /// 返回满足全部条件的新台账
    pub fn apply(&self, ledger: &Ledger) -> Ledger {
        let rows = ledger
            .rows
            .iter()
            .filter(|row| self.matches(ledger, row))
            .cloned()
            .collect();
        ledger.with_rows(rows)
    }

    pub fn matches(&self, ledger: &Ledger, row: &LedgerRow) -> bool {
        if !self.include_returns && !is_sale(row) {
            return false;
        }

        if self.from.is_some() || self.to.is_some() {
            let Some(date) = row.issue_date else {
                return false;
            };
            if self.from.is_some_and(|from| date < from) || self.to.is_some_and(|to| date > to) {
                return false;
            }
        }

        if self.marketplace.as_ref().is_some_and(|m| *m != row.marketplace) {
            return false;
        }
        if self.branch.as_ref().is_some_and(|b| *b != row.branch) {
            return false;
        }
        if !self.product_types.is_empty() && !self.product_types.contains(&row.product_type) {
            return false;
        }

        self.columns.iter().all(|f| f.matches(ledger, row))
    }
}

/// 是否为销售行
///
/// 有 Tipo Movimiento 时按其取值判断;台账没有该列时按单据类型剔除贷项通知单
pub fn is_sale(row: &LedgerRow) -> bool {
    match &row.movement_type {
        Some(movement) => movement.trim().eq_ignore_ascii_case(SALE_MOVEMENT),
        None => !row.is_kind(DocumentKind::CreditNote),
    }
}
