// ==========================================
// 销售对账系统 - 市场解析引擎
// ==========================================
// 职责: 按固定拓扑顺序为六张子表解析市场标签
// 顺序: 小票 → 出口发票 → 发货单 → 发票 → 贷项通知单 → 借项通知单
// ==========================================
// 红线: 后序阶段只能读取前序阶段的解析结果,不得修改
// 红线: 查找未命中不丢行,保持哨兵值并记录 UnresolvedReference
// ==========================================

mod lookup;
mod stages;


use crate::config::rules::ResolverRules;
use crate::domain::document::SubTable;
use crate::domain::report::RunWarning;
use crate::domain::types::DocumentKind;
use crate::engine::classifier::Sections;
use std::collections::BTreeMap;
use tracing::{info, instrument};

// ==========================================
// ResolvedSections - 已解析的子表集合
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ResolvedSections {
    tables: BTreeMap<DocumentKind, SubTable>,
}

impl ResolvedSections {
    pub fn get(&self, kind: DocumentKind) -> Option<&SubTable> {
        self.tables.get(&kind)
    }

    /// 按解析顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &SubTable> {
        DocumentKind::RESOLUTION_ORDER
            .iter()
            .filter_map(|kind| self.tables.get(kind))
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn row_counts(&self) -> BTreeMap<DocumentKind, usize> {
        self.tables.iter().map(|(k, t)| (*k, t.len())).collect()
    }
}

// ==========================================
// MarketplaceResolver - 市场解析引擎
// ==========================================
pub struct MarketplaceResolver<'a> {
    rules: &'a ResolverRules,
}

impl<'a> MarketplaceResolver<'a> {
    pub fn new(rules: &'a ResolverRules) -> Self {
        Self { rules }
    }

    /// 解析全部子表
    ///
    /// # 返回
    /// - 已解析子表 + UnresolvedReference 告警
    #[instrument(skip_all)]
    pub fn resolve(&self, sections: &Sections) -> (ResolvedSections, Vec<RunWarning>) {
        let mut resolved = BTreeMap::new();
        let mut warnings = Vec::new();

        for kind in DocumentKind::RESOLUTION_ORDER {
            let input = sections.get(kind);
            let table = match kind {
                DocumentKind::Receipt => stages::resolve_receipts(&input, self.rules),
                DocumentKind::ExportInvoice => stages::resolve_export_invoices(&input, self.rules),
                DocumentKind::DispatchGuide => stages::resolve_dispatch_guides(&input),
                DocumentKind::Invoice => {
                    let out = stages::resolve_invoices(&input, &resolved, self.rules);
                    warnings.extend(out.warnings);
                    out.table
                }
                DocumentKind::CreditNote => {
                    let out = stages::resolve_credit_notes(&input, &resolved, self.rules);
                    warnings.extend(out.warnings);
                    out.table
                }
                DocumentKind::DebitNote => {
                    let out = stages::resolve_debit_notes(&input, &resolved, self.rules);
                    warnings.extend(out.warnings);
                    out.table
                }
            };
            resolved.insert(kind, table);
        }

        info!(
            unresolved_references = warnings.len(),
            "市场解析完成"
        );
        (ResolvedSections { tables: resolved }, warnings)
    }
}
