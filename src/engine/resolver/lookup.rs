// ==========================================
// 销售对账系统 - 关联单据查找链
// ==========================================
// 红线: 按链中顺序取第一个被关联类型包含的标记,只查该目标子表（elif 语义）
// ==========================================

use crate::config::rules::ResolverRules;
use crate::domain::document::{DocumentRow, SubTable};
use crate::domain::types::DocumentKind;
use std::collections::BTreeMap;

/// 各类型的查找目标顺序
pub(crate) fn lookup_chain(kind: DocumentKind) -> &'static [DocumentKind] {
    match kind {
        DocumentKind::Invoice => &[
            DocumentKind::DispatchGuide,
            DocumentKind::Receipt,
            DocumentKind::ExportInvoice,
        ],
        DocumentKind::CreditNote => &[
            DocumentKind::DispatchGuide,
            DocumentKind::Receipt,
            DocumentKind::ExportInvoice,
            DocumentKind::Invoice,
        ],
        DocumentKind::DebitNote => &[
            DocumentKind::DispatchGuide,
            DocumentKind::Invoice,
            DocumentKind::Receipt,
            DocumentKind::ExportInvoice,
            DocumentKind::CreditNote,
        ],
        _ => &[],
    }
}

/// 查找结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Lookup {
    /// 无关联单据或无法解析
    NoReference,
    /// 关联类型不在查找链中
    NoTarget,
    /// 命中且目标已解析
    Hit(String),
    /// 目标子表中不存在或目标未解析
    Miss { target: DocumentKind, number: String },
}

/// 沿查找链查找关联单据的市场
pub(crate) fn lookup_related(
    row: &DocumentRow,
    chain: &[DocumentKind],
    resolved: &BTreeMap<DocumentKind, SubTable>,
    rules: &ResolverRules,
) -> Lookup {
    let Some(reference) = row.related.as_ref() else {
        return Lookup::NoReference;
    };

    let related_type = reference.related_type.to_uppercase();
    let Some(target) = chain
        .iter()
        .copied()
        .find(|kind| related_type.contains(kind.reference_marker()))
    else {
        return Lookup::NoTarget;
    };

    let hit = resolved
        .get(&target)
        .and_then(|table| table.marketplace_of(&reference.related_number))
        .filter(|m| !rules.is_no_data(m));

    match hit {
        Some(marketplace) => Lookup::Hit(marketplace.to_string()),
        None => Lookup::Miss {
            target,
            number: reference.related_number.clone(),
        },
    }
}
