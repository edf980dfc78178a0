// ==========================================
// 销售对账系统 - 销售台账实体
// ==========================================
// 职责: 台账行（类型化字段 + 原始单元格）与按列名取值
// 红线: total_sale 永远由 gross - tax 计算,不落字段
// ==========================================

use crate::domain::columns::ledger as col;
use crate::domain::types::DocumentKind;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

// ==========================================
// LedgerRow - 台账行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub line: usize,                          // 源文件行号（1 起）
    pub document_label: String,               // 原始单据类型标签
    pub document_kind: Option<DocumentKind>,  // 识别出的单据类型
    pub document_number: String,              // 规范化单据号
    pub sku: String,                          // 规范化 SKU
    pub product: String,                      // 产品族（SKU 前缀）
    pub product_type: String,                 // 产品/服务类型
    pub branch: String,                       // 门店
    pub quantity: i64,                        // 带符号数量
    pub gross_amount: Decimal,                // 含税小计
    pub tax_amount: Decimal,                  // 税额小计
    pub unit_cost: Decimal,                   // 单位成本
    pub total_cost: Decimal,                  // 总成本
    pub marketplace: String,                  // 市场标签
    pub issue_date: Option<NaiveDate>,        // 开票日期
    pub movement_type: Option<String>,        // 变动类型（venta / devolución ...）
    pub source: Vec<String>,                  // 原始单元格,与 Ledger::headers 对齐
}

impl LedgerRow {
    /// 净销售额 = 含税小计 - 税额
    pub fn total_sale(&self) -> Decimal {
        self.gross_amount - self.tax_amount
    }

    pub fn is_kind(&self, kind: DocumentKind) -> bool {
        self.document_kind == Some(kind)
    }
}

// ==========================================
// CellValue - 输出/过滤用的单元格值
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue<'a> {
    Text(Cow<'a, str>),
    Integer(i64),
    Amount(Decimal),
}

impl fmt::Display for CellValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Amount(d) => write!(f, "{}", d.normalize()),
        }
    }
}

// ==========================================
// Ledger - 销售台账
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub headers: Vec<String>,
    pub rows: Vec<LedgerRow>,
}

impl Ledger {
    pub fn new(headers: Vec<String>, rows: Vec<LedgerRow>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 以同样的表头替换行集合（各阶段产出新台账而不修改旧台账）
    pub fn with_rows(&self, rows: Vec<LedgerRow>) -> Ledger {
        Ledger {
            headers: self.headers.clone(),
            rows,
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        is_derived_column(column) || self.headers.iter().any(|h| h == column)
    }

    /// 输出表头: 原始列 + 缺失的派生列
    pub fn output_headers(&self) -> Vec<String> {
        let mut headers = self.headers.clone();
        for derived in [
            col::PRODUCT,
            col::UNIT_COST,
            col::TOTAL_COST,
            col::TOTAL_SALE,
            col::MARKETPLACE,
        ] {
            if !headers.iter().any(|h| h == derived) {
                headers.push(derived.to_string());
            }
        }
        headers
    }

    /// 按列名取值: 派生/类型化列优先,其余取原始单元格
    pub fn cell<'a>(&'a self, row: &'a LedgerRow, column: &str) -> Option<CellValue<'a>> {
        let value = match column {
            col::DOCUMENT_NUMBER => CellValue::Text(Cow::Borrowed(&row.document_number)),
            col::SKU => CellValue::Text(Cow::Borrowed(&row.sku)),
            col::QUANTITY => CellValue::Integer(row.quantity),
            col::GROSS => CellValue::Amount(row.gross_amount),
            col::TAX => CellValue::Amount(row.tax_amount),
            col::UNIT_COST => CellValue::Amount(row.unit_cost),
            col::TOTAL_COST => CellValue::Amount(row.total_cost),
            col::TOTAL_SALE => CellValue::Amount(row.total_sale()),
            col::PRODUCT => CellValue::Text(Cow::Borrowed(&row.product)),
            col::MARKETPLACE => CellValue::Text(Cow::Borrowed(&row.marketplace)),
            other => {
                let idx = self.headers.iter().position(|h| h == other)?;
                let raw = row.source.get(idx).map(String::as_str).unwrap_or("");
                CellValue::Text(Cow::Borrowed(raw))
            }
        };
        Some(value)
    }

    /// 按列名取字符串值（用于过滤比较）
    pub fn value_of(&self, row: &LedgerRow, column: &str) -> Option<String> {
        self.cell(row, column).map(|v| v.to_string().trim().to_string())
    }
}

fn is_derived_column(column: &str) -> bool {
    matches!(
        column,
        col::PRODUCT | col::UNIT_COST | col::TOTAL_COST | col::TOTAL_SALE | col::MARKETPLACE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> LedgerRow {
        LedgerRow {
            line: 5,
            document_label: "factura electrónica".to_string(),
            document_kind: Some(DocumentKind::Invoice),
            document_number: "1001".to_string(),
            sku: "abc12345x".to_string(),
            product: "abc12345".to_string(),
            product_type: "Calzado".to_string(),
            branch: "Casa Matriz".to_string(),
            quantity: 2,
            gross_amount: Decimal::new(11900, 0),
            tax_amount: Decimal::new(1900, 0),
            unit_cost: Decimal::new(3000, 0),
            total_cost: Decimal::new(6000, 0),
            marketplace: "vtex".to_string(),
            issue_date: None,
            movement_type: Some("venta".to_string()),
            source: vec!["factura electrónica".to_string(), "Calzado".to_string()],
        }
    }

    #[test]
    fn test_total_sale_is_gross_minus_tax() {
        assert_eq!(sample_row().total_sale(), Decimal::new(10000, 0));
    }

    #[test]
    fn test_cell_prefers_typed_columns() {
        let ledger = Ledger::new(
            vec![col::DOCUMENT_TYPE.to_string(), "Vendedor".to_string()],
            vec![sample_row()],
        );
        let row = &ledger.rows[0];
        assert_eq!(ledger.value_of(row, col::QUANTITY), Some("2".to_string()));
        assert_eq!(ledger.value_of(row, col::TOTAL_SALE), Some("10000".to_string()));
        assert_eq!(ledger.value_of(row, "Vendedor"), Some("Calzado".to_string()));
        assert_eq!(ledger.value_of(row, "Inexistente"), None);
    }

    #[test]
    fn test_output_headers_append_derived_columns_once() {
        let ledger = Ledger::new(
            vec![col::SKU.to_string(), col::TOTAL_COST.to_string()],
            vec![],
        );
        let headers = ledger.output_headers();
        assert_eq!(headers.iter().filter(|h| *h == col::TOTAL_COST).count(), 1);
        assert_eq!(headers.last().map(String::as_str), Some(col::MARKETPLACE));
    }
}
