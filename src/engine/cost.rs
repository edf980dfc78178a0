// ==========================================
// 销售对账系统 - 成本分配引擎
// ==========================================
// 职责: 成本映射构建 + 按单据类型分配带符号的数量/成本
// ==========================================
// 红线: 成本与数量的符号只由单据类型决定
// 红线: SKU 不在成本表 → 成本为 0,不报错
// 红线: 分配后成本四舍六入五成双取整
// ==========================================

use crate::domain::ledger::{Ledger, LedgerRow};
use crate::domain::types::DocumentKind;
use crate::importer::field_mapper::CostRecord;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, info};

// ==========================================
// CostEntry / CostMap - 成本映射
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostEntry {
    pub unit_cost: Decimal,  // 该 SKU 最后一次出现的单位成本
    pub total_cost: Decimal, // 全部出现的单位成本之和
    pub occurrences: i64,    // 出现次数
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostMap {
    entries: HashMap<String, CostEntry>,
}

impl CostMap {
    /// 由成本导出行构建（构建后只读）
    pub fn build(records: &[CostRecord]) -> Self {
        let mut entries: HashMap<String, CostEntry> = HashMap::new();
        for record in records {
            entries
                .entry(record.sku.clone())
                .and_modify(|e| {
                    e.unit_cost = record.unit_cost;
                    e.total_cost += record.unit_cost;
                    e.occurrences += 1;
                })
                .or_insert(CostEntry {
                    unit_cost: record.unit_cost,
                    total_cost: record.unit_cost,
                    occurrences: 1,
                });
        }
        debug!(skus = entries.len(), records = records.len(), "成本映射构建完成");
        Self { entries }
    }

    pub fn get(&self, sku: &str) -> Option<&CostEntry> {
        self.entries.get(sku)
    }

    pub fn unit_cost(&self, sku: &str) -> Decimal {
        self.get(sku).map(|e| e.unit_cost).unwrap_or(Decimal::ZERO)
    }

    pub fn occurrences(&self, sku: &str) -> i64 {
        self.get(sku).map(|e| e.occurrences).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ==========================================
// CostAssigner - 成本分配
// ==========================================
pub struct CostAssigner<'a> {
    costs: &'a CostMap,
}

impl<'a> CostAssigner<'a> {
    pub fn new(costs: &'a CostMap) -> Self {
        Self { costs }
    }

    /// 为整张台账分配成本,返回新台账
    pub fn assign(&self, ledger: &Ledger) -> Ledger {
        let rows: Vec<LedgerRow> = ledger.rows.iter().map(|row| self.assign_row(row)).collect();
        let missing = rows
            .iter()
            .filter(|r| self.costs.get(&r.sku).is_none())
            .count();
        info!(rows = rows.len(), missing_sku = missing, "成本分配完成");
        ledger.with_rows(rows)
    }

    /// 单行分配
    ///
    /// - 贷项通知单: 数量 = -出现次数,总成本 = -|单位成本 × 数量|
    /// - 小票 T: 单位成本与总成本取负绝对值
    /// - 其他: 保留台账自带总成本
    pub fn assign_row(&self, row: &LedgerRow) -> LedgerRow {
        let mut out = row.clone();
        out.unit_cost = self.costs.unit_cost(&row.sku);

        match row.document_kind {
            Some(DocumentKind::CreditNote) => {
                out.quantity = -self.costs.occurrences(&row.sku);
                out.total_cost = -(out.unit_cost * Decimal::from(out.quantity)).abs();
            }
            Some(DocumentKind::Receipt) => {
                out.unit_cost = -out.unit_cost.abs();
                out.total_cost = -out.total_cost.abs();
            }
            _ => {}
        }

        out.unit_cost = out.unit_cost.round();
        out.total_cost = out.total_cost.round();
        out
    }

    /// 无成本导出时只施加符号规则,数量与成本取台账自带值
    ///
    /// - 贷项通知单: 数量 = -|数量|,总成本 = -|总成本|
    /// - 小票 T: 单位成本与总成本取负绝对值
    pub fn sign_only(ledger: &Ledger) -> Ledger {
        let rows: Vec<LedgerRow> = ledger.rows.iter().map(sign_row).collect();
        info!(rows = rows.len(), "未提供成本导出,仅按单据类型修正符号");
        ledger.with_rows(rows)
    }
}

fn sign_row(row: &LedgerRow) -> LedgerRow {
    let mut out = row.clone();
    match row.document_kind {
        Some(DocumentKind::CreditNote) => {
            out.quantity = -row.quantity.abs();
            out.total_cost = -row.total_cost.abs();
        }
        Some(DocumentKind::Receipt) => {
            out.unit_cost = -row.unit_cost.abs();
            out.total_cost = -row.total_cost.abs();
        }
        _ => {}
    }
    out.unit_cost = out.unit_cost.round();
    out.total_cost = out.total_cost.round();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sku: &str, cost: i64) -> CostRecord {
        CostRecord {
            line: 1,
            sku: sku.to_string(),
            unit_cost: Decimal::from(cost),
        }
    }

    fn ledger_row(kind: Option<DocumentKind>, sku: &str, quantity: i64, total_cost: Decimal) -> LedgerRow {
        LedgerRow {
            line: 2,
            document_label: String::new(),
            document_kind: kind,
            document_number: "1".to_string(),
            sku: sku.to_string(),
            product: sku.chars().take(8).collect(),
            product_type: "Calzado".to_string(),
            branch: "Casa Matriz".to_string(),
            quantity,
            gross_amount: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            unit_cost: Decimal::ZERO,
            total_cost,
            marketplace: "Sin datos".to_string(),
            issue_date: None,
            movement_type: None,
            source: vec![],
        }
    }

    #[test]
    fn test_cost_map_last_occurrence_wins_and_counts() {
        let map = CostMap::build(&[record("a", 100), record("b", 50), record("a", 120)]);
        let entry = map.get("a").unwrap();
        assert_eq!(entry.unit_cost, Decimal::from(120));
        assert_eq!(entry.total_cost, Decimal::from(220));
        assert_eq!(entry.occurrences, 2);
        assert_eq!(map.occurrences("zz"), 0);
    }

    #[test]
    fn test_credit_note_quantity_and_cost() {
        let map = CostMap::build(&[record("a", 100), record("a", 100), record("a", 100)]);
        let row = ledger_row(Some(DocumentKind::CreditNote), "a", 1, Decimal::from(999));
        let out = CostAssigner::new(&map).assign_row(&row);
        assert_eq!(out.quantity, -3);
        assert_eq!(out.unit_cost, Decimal::from(100));
        assert_eq!(out.total_cost, Decimal::from(-300));
    }

    #[test]
    fn test_credit_note_unknown_sku_is_zero() {
        let map = CostMap::default();
        let row = ledger_row(Some(DocumentKind::CreditNote), "x", 4, Decimal::from(10));
        let out = CostAssigner::new(&map).assign_row(&row);
        assert_eq!(out.quantity, 0);
        assert_eq!(out.total_cost, Decimal::ZERO);
        assert!(out.total_cost <= Decimal::ZERO);
    }

    #[test]
    fn test_receipt_t_costs_are_negative() {
        let map = CostMap::build(&[record("a", 80)]);
        let row = ledger_row(Some(DocumentKind::Receipt), "a", 1, Decimal::from(160));
        let out = CostAssigner::new(&map).assign_row(&row);
        assert_eq!(out.unit_cost, Decimal::from(-80));
        assert_eq!(out.total_cost, Decimal::from(-160));
        assert_eq!(out.quantity, 1);
    }

    #[test]
    fn test_invoice_keeps_ledger_total_cost_rounded_half_even() {
        let map = CostMap::build(&[CostRecord {
            line: 1,
            sku: "a".to_string(),
            unit_cost: Decimal::new(105, 1), // 10.5
        }]);
        let row = ledger_row(Some(DocumentKind::Invoice), "a", 2, Decimal::new(215, 1)); // 21.5
        let out = CostAssigner::new(&map).assign_row(&row);
        assert_eq!(out.unit_cost, Decimal::from(10));
        assert_eq!(out.total_cost, Decimal::from(22));
    }

    #[test]
    fn test_sign_only_keeps_ledger_magnitudes() {
        let ledger = Ledger::new(
            vec![],
            vec![
                ledger_row(Some(DocumentKind::CreditNote), "a", 2, Decimal::from(600)),
                ledger_row(Some(DocumentKind::CreditNote), "b", -1, Decimal::from(-50)),
                ledger_row(Some(DocumentKind::Receipt), "c", 1, Decimal::from(160)),
                ledger_row(Some(DocumentKind::Invoice), "d", 3, Decimal::from(90)),
            ],
        );
        let signed = CostAssigner::sign_only(&ledger);

        assert_eq!(signed.rows[0].quantity, -2);
        assert_eq!(signed.rows[0].total_cost, Decimal::from(-600));
        assert_eq!(signed.rows[1].quantity, -1);
        assert_eq!(signed.rows[1].total_cost, Decimal::from(-50));
        assert_eq!(signed.rows[2].total_cost, Decimal::from(-160));
        assert_eq!(signed.rows[3].quantity, 3);
        assert_eq!(signed.rows[3].total_cost, Decimal::from(90));
    }

    #[test]
    fn test_assign_returns_new_ledger() {
        let map = CostMap::build(&[record("a", 100)]);
        let ledger = Ledger::new(
            vec![],
            vec![ledger_row(Some(DocumentKind::CreditNote), "a", 5, Decimal::ZERO)],
        );
        let assigned = CostAssigner::new(&map).assign(&ledger);
        assert_eq!(ledger.rows[0].quantity, 5);
        assert_eq!(assigned.rows[0].quantity, -1);
    }
}
