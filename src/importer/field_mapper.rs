// ==========================================
// 销售对账系统 - 字段映射器实现
// ==========================================
// 职责: Table → 类型化记录（台账行 / 成本记录 / 单据行）
// 红线: 必需列缺失 → MalformedInput;非空但无法解析的数值 → TypeConversionError
// ==========================================

use crate::domain::columns::{annual, cost, ledger as col};
use crate::domain::document::DocumentRow;
use crate::domain::ledger::{Ledger, LedgerRow};
use crate::domain::types::DocumentKind;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::table::{Table, TableRow};
use rust_decimal::Decimal;

// ==========================================
// CostRecord - 成本导出行
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct CostRecord {
    pub line: usize,
    pub sku: String,        // 规范化 SKU
    pub unit_cost: Decimal, // Costo Neto
}

pub struct FieldMapper;

impl FieldMapper {
    // ==========================================
    // 销售台账
    // ==========================================

    /// 映射销售台账
    ///
    /// # 参数
    /// - product_code_len: 产品族取 SKU 前几位
    /// - no_data: 市场初始哨兵值（源文件无 Marketplace 列或为空时使用）
    pub fn map_ledger(
        &self,
        table: &Table,
        product_code_len: usize,
        no_data: &str,
    ) -> ImportResult<Ledger> {
        let cleaner = DataCleaner;

        let doc_type = table.require_column(col::DOCUMENT_TYPE)?;
        let doc_number = table.require_column(col::DOCUMENT_NUMBER)?;
        let sku = table.require_column(col::SKU)?;
        let quantity = table.require_column(col::QUANTITY)?;
        let gross = table.require_column(col::GROSS)?;
        let tax = table.require_column(col::TAX)?;
        let branch = table.require_column(col::BRANCH)?;
        let product_type = table.require_column(col::PRODUCT_TYPE)?;

        let total_cost = table.column_index(col::TOTAL_COST);
        let unit_cost = table.column_index(col::UNIT_COST);
        let marketplace = table.column_index(col::MARKETPLACE);
        let issue_date = table.column_index(col::ISSUE_DATE);
        let movement = table.column_index(col::MOVEMENT_TYPE);

        let mut rows = Vec::with_capacity(table.len());
        for row in &table.rows {
            let document_label = cleaner.clean_text(row.cell(doc_type));
            let sku_key = cleaner.normalize_key(row.cell(sku));

            rows.push(LedgerRow {
                line: row.line,
                document_kind: DocumentKind::from_ledger_label(&document_label),
                document_label,
                document_number: cleaner.normalize_key(row.cell(doc_number)),
                product: sku_key.chars().take(product_code_len).collect(),
                sku: sku_key,
                product_type: cleaner.clean_text(row.cell(product_type)),
                branch: cleaner.clean_text(row.cell(branch)),
                quantity: self.quantity(table, row, quantity)?,
                gross_amount: self.amount(table, row, Some(gross))?,
                tax_amount: self.amount(table, row, Some(tax))?,
                unit_cost: self.amount(table, row, unit_cost)?,
                total_cost: self.amount(table, row, total_cost)?,
                marketplace: cleaner
                    .normalize_null(marketplace.map(|idx| row.cell(idx)))
                    .unwrap_or_else(|| no_data.to_string()),
                issue_date: issue_date.and_then(|idx| cleaner.parse_date(row.cell(idx))),
                movement_type: cleaner.normalize_null(movement.map(|idx| row.cell(idx))),
                source: row.cells.clone(),
            });
        }

        Ok(Ledger::new(table.headers.clone(), rows))
    }

    // ==========================================
    // 成本导出
    // ==========================================

    pub fn map_cost_records(&self, table: &Table) -> ImportResult<Vec<CostRecord>> {
        let cleaner = DataCleaner;
        let sku = table.require_column(cost::SKU)?;
        let net_cost = table.require_column(cost::NET_COST)?;

        table
            .rows
            .iter()
            .map(|row| {
                Ok(CostRecord {
                    line: row.line,
                    sku: cleaner.normalize_key(row.cell(sku)),
                    unit_cost: self.amount(table, row, Some(net_cost))?,
                })
            })
            .collect()
    }

    // ==========================================
    // 年度导出分段
    // ==========================================

    /// 映射某一分段的单据行（调用方已按分段字面量过滤）
    ///
    /// 关联单据引用由分类器解析,此处仅保留原文
    pub fn map_documents(&self, table: &Table, kind: DocumentKind) -> ImportResult<Vec<DocumentRow>> {
        let cleaner = DataCleaner;
        let required = RequiredColumns::for_kind(kind);

        let doc_number = table.require_column(annual::DOCUMENT_NUMBER)?;
        let branch = lookup(table, annual::BRANCH, required.branch)?;
        let seller = lookup(table, annual::SELLER, required.seller)?;
        let customer = lookup(table, annual::CUSTOMER, required.customer)?;
        let related = if required.related {
            Some(table.require_column_with_prefix(annual::RELATED_DOCUMENTS_PREFIX)?)
        } else {
            table.column_with_prefix(annual::RELATED_DOCUMENTS_PREFIX)
        };
        let marketplace = table.column_index(annual::MARKETPLACE);

        Ok(table
            .rows
            .iter()
            .map(|row| DocumentRow {
                line: row.line,
                kind,
                document_number: cleaner.normalize_key(row.cell(doc_number)),
                branch: cleaner.clean_text(row.opt_cell(branch)),
                seller: cleaner.clean_text(row.opt_cell(seller)),
                customer: cleaner.clean_text(row.opt_cell(customer)),
                related_text: cleaner.normalize_null(related.map(|idx| row.cell(idx))),
                related: None,
                source_marketplace: cleaner.normalize_null(marketplace.map(|idx| row.cell(idx))),
                marketplace: None,
                source: row.cells.clone(),
            })
            .collect())
    }

    // ==========================================
    // 数值解析（空值为 0）
    // ==========================================

    fn amount(&self, table: &Table, row: &TableRow, idx: Option<usize>) -> ImportResult<Decimal> {
        let Some(idx) = idx else {
            return Ok(Decimal::ZERO);
        };
        DataCleaner
            .parse_amount(row.cell(idx))
            .map(|v| v.unwrap_or(Decimal::ZERO))
            .map_err(|raw| conversion_error(table, row, idx, format!("无法解析为金额: {}", raw)))
    }

    fn quantity(&self, table: &Table, row: &TableRow, idx: usize) -> ImportResult<i64> {
        DataCleaner
            .parse_quantity(row.cell(idx))
            .map(|v| v.unwrap_or(0))
            .map_err(|raw| conversion_error(table, row, idx, format!("无法解析为数量: {}", raw)))
    }
}

fn conversion_error(table: &Table, row: &TableRow, idx: usize, message: String) -> ImportError {
    ImportError::TypeConversionError {
        source_name: table.source_name.clone(),
        line: row.line,
        field: table.headers.get(idx).cloned().unwrap_or_default(),
        message,
    }
}

fn lookup(table: &Table, column: &str, required: bool) -> ImportResult<Option<usize>> {
    if required {
        table.require_column(column).map(Some)
    } else {
        Ok(table.column_index(column))
    }
}

/// 各分段在解析阶段实际读取的列
struct RequiredColumns {
    branch: bool,
    seller: bool,
    customer: bool,
    related: bool,
}

impl RequiredColumns {
    fn for_kind(kind: DocumentKind) -> Self {
        let (branch, seller, customer, related) = match kind {
            DocumentKind::Receipt => (true, false, false, false),
            DocumentKind::ExportInvoice | DocumentKind::DispatchGuide => {
                (false, false, false, false)
            }
            DocumentKind::Invoice => (true, true, false, true),
            DocumentKind::CreditNote => (true, true, true, true),
            DocumentKind::DebitNote => (false, false, false, true),
        };
        Self {
            branch,
            seller,
            customer,
            related,
        }
    }
}
