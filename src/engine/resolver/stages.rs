// ==========================================
// 销售对账系统 - 各单据类型的市场解析阶段
// ==========================================
// 每个阶段是纯函数: 输入子表 + 已解析的前序子表 → 新子表
// ==========================================

use super::lookup::{lookup_chain, lookup_related, Lookup};
use crate::config::rules::ResolverRules;
use crate::domain::document::{DocumentRow, SubTable};
use crate::domain::report::{RunWarning, WarningKind};
use crate::domain::types::DocumentKind;
use std::collections::BTreeMap;
use tracing::debug;

/// 阶段输出
#[derive(Debug, Clone)]
pub(crate) struct StageOutput {
    pub table: SubTable,
    pub warnings: Vec<RunWarning>,
}

// ==========================================
// 叶子阶段（不依赖其他子表）
// ==========================================

/// 小票: 批发门店 → 批发小票标签,其余沿用导出自带市场
pub(crate) fn resolve_receipts(input: &SubTable, rules: &ResolverRules) -> SubTable {
    let rows = input
        .rows()
        .iter()
        .map(|row| {
            if row.branch == rules.wholesale_branch {
                row.with_marketplace(Some(rules.wholesale_receipt_label.clone()))
            } else {
                row.with_marketplace(row.source_marketplace.clone())
            }
        })
        .collect();
    input.with_rows(rows)
}

/// 出口发票: 固定标签
pub(crate) fn resolve_export_invoices(input: &SubTable, rules: &ResolverRules) -> SubTable {
    let rows = input
        .rows()
        .iter()
        .map(|row| row.with_marketplace(Some(rules.export_label.clone())))
        .collect();
    input.with_rows(rows)
}

/// 发货单: 仅作为查找目标,沿用导出自带市场
pub(crate) fn resolve_dispatch_guides(input: &SubTable) -> SubTable {
    let rows = input
        .rows()
        .iter()
        .map(|row| row.with_marketplace(row.source_marketplace.clone()))
        .collect();
    input.with_rows(rows)
}

// ==========================================
// 依赖阶段（沿查找链引用前序子表）
// ==========================================

/// 发票: 查找 → 批发门店覆盖 → 线上销售员覆盖（最后执行,优先级最高）
pub(crate) fn resolve_invoices(
    input: &SubTable,
    resolved: &BTreeMap<DocumentKind, SubTable>,
    rules: &ResolverRules,
) -> StageOutput {
    resolve_with_lookup(input, resolved, rules, |row, current| {
        let mut marketplace = current;
        if row.branch == rules.wholesale_branch {
            marketplace = rules.wholesale_label.clone();
        }
        if row.seller == rules.online_seller {
            marketplace = rules.online_label.clone();
        }
        marketplace
    })
}

/// 贷项通知单: 查找 → 仍为哨兵且批发门店 → 线上订单（销售员+总店+主数据客户）
pub(crate) fn resolve_credit_notes(
    input: &SubTable,
    resolved: &BTreeMap<DocumentKind, SubTable>,
    rules: &ResolverRules,
) -> StageOutput {
    resolve_with_lookup(input, resolved, rules, |row, current| {
        let mut marketplace = current;
        if rules.is_no_data(&marketplace) && row.branch == rules.wholesale_branch {
            marketplace = rules.wholesale_label.clone();
        }
        if row.seller == rules.online_seller
            && row.branch == rules.head_office_branch
            && row.customer == rules.online_customer
        {
            marketplace = rules.online_label.clone();
        }
        marketplace
    })
}

/// 借项通知单: 仅查找,无覆盖规则
pub(crate) fn resolve_debit_notes(
    input: &SubTable,
    resolved: &BTreeMap<DocumentKind, SubTable>,
    rules: &ResolverRules,
) -> StageOutput {
    resolve_with_lookup(input, resolved, rules, |_, current| current)
}

fn resolve_with_lookup<F>(
    input: &SubTable,
    resolved: &BTreeMap<DocumentKind, SubTable>,
    rules: &ResolverRules,
    overrides: F,
) -> StageOutput
where
    F: Fn(&DocumentRow, String) -> String,
{
    let chain = lookup_chain(input.kind);
    let mut warnings = Vec::new();

    let rows = input
        .rows()
        .iter()
        .map(|row| {
            let looked_up = match lookup_related(row, chain, resolved, rules) {
                Lookup::Hit(marketplace) => marketplace,
                Lookup::Miss { target, number } => {
                    debug!(
                        kind = %input.kind,
                        document = %row.document_number,
                        target = %target,
                        related = %number,
                        "关联单据未命中"
                    );
                    warnings.push(RunWarning {
                        kind: WarningKind::UnresolvedReference,
                        document_kind: Some(input.kind),
                        line: Some(row.line),
                        message: format!(
                            "{} {} → {} {} 未命中",
                            input.kind, row.document_number, target, number
                        ),
                    });
                    rules.no_data_label.clone()
                }
                Lookup::NoReference | Lookup::NoTarget => rules.no_data_label.clone(),
            };
            row.with_marketplace(Some(overrides(row, looked_up)))
        })
        .collect();

    StageOutput {
        table: input.with_rows(rows),
        warnings,
    }
}
