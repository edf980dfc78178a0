// ==========================================
// 销售对账系统 - 台账合并
// ==========================================
// 职责: 把已解析子表的市场标签按单据号回写到销售台账
// 红线: 已识别类型的台账行一律以子表结果为准,未命中 → 哨兵值
// 红线: 未识别类型的台账行保留原值
// ==========================================

use crate::config::rules::ResolverRules;
use crate::domain::ledger::Ledger;
use crate::domain::report::{RunWarning, WarningKind};
use crate::engine::resolver::ResolvedSections;
use tracing::info;

pub struct LedgerMerger<'a> {
    rules: &'a ResolverRules,
}

impl<'a> LedgerMerger<'a> {
    pub fn new(rules: &'a ResolverRules) -> Self {
        Self { rules }
    }

    /// 回写市场标签
    ///
    /// # 返回
    /// - 新台账 + 每个落到哨兵值的已识别行一条 UnresolvedMarketplace 告警
    pub fn attach_marketplaces(
        &self,
        ledger: &Ledger,
        sections: &ResolvedSections,
    ) -> (Ledger, Vec<RunWarning>) {
        let mut warnings = Vec::new();

        let rows = ledger
            .rows
            .iter()
            .map(|row| {
                let mut out = row.clone();
                if let Some(kind) = row.document_kind {
                    let resolved = sections
                        .get(kind)
                        .and_then(|table| table.marketplace_of(&row.document_number))
                        .filter(|m| !self.rules.is_no_data(m));

                    out.marketplace = match resolved {
                        Some(marketplace) => marketplace.to_string(),
                        None => {
                            warnings.push(RunWarning {
                                kind: WarningKind::UnresolvedMarketplace,
                                document_kind: Some(kind),
                                line: Some(row.line),
                                message: format!("{} {} 无市场", kind, row.document_number),
                            });
                            self.rules.no_data_label.clone()
                        }
                    };
                } else if out.marketplace.trim().is_empty() {
                    out.marketplace = self.rules.no_data_label.clone();
                }
                out
            })
            .collect();

        info!(unresolved = warnings.len(), "市场标签回写完成");
        (ledger.with_rows(rows), warnings)
    }
}
