// ==========================================
// 销售对账系统 - 工作表渲染
// ==========================================
// 布局: 每个表块从第 3 行开始（上方留 2 行空白）,表头加粗
// 同一工作表内的多个表块之间空 3 行
// ==========================================

use crate::domain::columns::{annual, ledger as col};
use crate::domain::document::SubTable;
use crate::domain::ledger::{CellValue, Ledger};
use crate::domain::report::{BranchSummary, MarginRow, ProductRank};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Format, Worksheet, XlsxError};

/// 表块起始行（0 起）
pub const START_ROW: u32 = 2;

/// 表块之间的空行数
const BLOCK_GAP: u32 = 3;

pub const MARGIN_HEADER: &str = "Margen (%)";
pub const TOP_HEADER: &str = "Cantidad mas vendidos";
pub const BOTTOM_HEADER: &str = "Cantidad menos vendidos";

/// 下一个表块的起始行
pub fn next_block(start: u32, data_rows: usize) -> u32 {
    start + 1 + data_rows as u32 + BLOCK_GAP
}

fn write_header(
    sheet: &mut Worksheet,
    row: u32,
    headers: &[&str],
    bold: &Format,
) -> Result<(), XlsxError> {
    for (c, h) in headers.iter().enumerate() {
        sheet.write_string_with_format(row, c as u16, *h, bold)?;
    }
    Ok(())
}

fn write_decimal(sheet: &mut Worksheet, row: u32, col: u16, value: Decimal) -> Result<(), XlsxError> {
    sheet.write_number(row, col, value.to_f64().unwrap_or_default())?;
    Ok(())
}

// ==========================================
// Actualizado - 对账后台账
// ==========================================
pub fn write_ledger(sheet: &mut Worksheet, ledger: &Ledger, bold: &Format) -> Result<(), XlsxError> {
    let headers = ledger.output_headers();
    let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
    write_header(sheet, START_ROW, &header_refs, bold)?;

    for (r, row) in ledger.rows.iter().enumerate() {
        let excel_row = START_ROW + 1 + r as u32;
        for (c, header) in headers.iter().enumerate() {
            match ledger.cell(row, header) {
                Some(CellValue::Integer(v)) => {
                    sheet.write_number(excel_row, c as u16, v as f64)?;
                }
                Some(CellValue::Amount(v)) => write_decimal(sheet, excel_row, c as u16, v)?,
                Some(CellValue::Text(v)) if !v.is_empty() => {
                    sheet.write_string(excel_row, c as u16, v.as_ref())?;
                }
                _ => {}
            }
        }
    }
    Ok(())
}

// ==========================================
// total ventas - 门店透视 + 排名
// ==========================================
pub fn write_branch_sheet(
    sheet: &mut Worksheet,
    branches: &[BranchSummary],
    top: &[ProductRank],
    bottom: &[ProductRank],
    bold: &Format,
) -> Result<(), XlsxError> {
    write_header(
        sheet,
        START_ROW,
        &[col::BRANCH, col::QUANTITY, col::GROSS, col::TAX],
        bold,
    )?;
    for (r, b) in branches.iter().enumerate() {
        let row = START_ROW + 1 + r as u32;
        sheet.write_string(row, 0, &b.branch)?;
        sheet.write_number(row, 1, b.quantity as f64)?;
        sheet.write_number(row, 2, b.gross_amount as f64)?;
        sheet.write_number(row, 3, b.tax_amount as f64)?;
    }

    let top_start = next_block(START_ROW, branches.len());
    write_ranking(sheet, top_start, top, TOP_HEADER, bold)?;
    write_ranking(sheet, next_block(top_start, top.len()), bottom, BOTTOM_HEADER, bold)
}

fn write_ranking(
    sheet: &mut Worksheet,
    start: u32,
    ranking: &[ProductRank],
    quantity_header: &str,
    bold: &Format,
) -> Result<(), XlsxError> {
    write_header(
        sheet,
        start,
        &[col::PRODUCT_TYPE, col::PRODUCT, quantity_header],
        bold,
    )?;
    for (r, p) in ranking.iter().enumerate() {
        let row = start + 1 + r as u32;
        sheet.write_string(row, 0, &p.product_type)?;
        sheet.write_string(row, 1, &p.product)?;
        sheet.write_number(row, 2, p.quantity as f64)?;
    }
    Ok(())
}

// ==========================================
// vendido - 销售/成本/毛利率透视
// ==========================================
pub fn write_margin_sheet(
    sheet: &mut Worksheet,
    blocks: &[(&str, &[MarginRow])],
    bold: &Format,
) -> Result<(), XlsxError> {
    let mut start = START_ROW;
    for &(key_header, rows) in blocks {
        write_header(
            sheet,
            start,
            &[key_header, col::TOTAL_COST, col::TOTAL_SALE, MARGIN_HEADER],
            bold,
        )?;
        for (r, m) in rows.iter().enumerate() {
            let row = start + 1 + r as u32;
            if m.is_total() {
                sheet.write_string_with_format(row, 0, &m.key, bold)?;
            } else {
                sheet.write_string(row, 0, &m.key)?;
            }
            write_decimal(sheet, row, 1, m.total_cost)?;
            write_decimal(sheet, row, 2, m.total_sale)?;
            sheet.write_number(row, 3, m.margin_whole() as f64)?;
        }
        start = next_block(start, rows.len());
    }
    Ok(())
}

// ==========================================
// 第二工作簿 - 单据子表
// ==========================================

/// 子表输出列: 原始列 + 关联类型/号码 + 市场
pub fn section_headers(table: &SubTable) -> Vec<String> {
    let mut headers = table.headers.clone();
    for extra in [annual::RELATED_TYPE, annual::RELATED_NUMBER, annual::MARKETPLACE] {
        if !headers.iter().any(|h| h == extra) {
            headers.push(extra.to_string());
        }
    }
    headers
}

pub fn write_section(sheet: &mut Worksheet, table: &SubTable, bold: &Format) -> Result<(), XlsxError> {
    let headers = section_headers(table);
    let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
    write_header(sheet, START_ROW, &header_refs, bold)?;

    for (r, doc) in table.rows().iter().enumerate() {
        let excel_row = START_ROW + 1 + r as u32;
        for (c, header) in headers.iter().enumerate() {
            let value = match header.as_str() {
                annual::DOCUMENT_NUMBER => doc.document_number.as_str(),
                annual::RELATED_TYPE => doc
                    .related
                    .as_ref()
                    .map(|r| r.related_type.as_str())
                    .unwrap_or(""),
                annual::RELATED_NUMBER => doc
                    .related
                    .as_ref()
                    .map(|r| r.related_number.as_str())
                    .unwrap_or(""),
                annual::MARKETPLACE => doc.marketplace.as_deref().unwrap_or(""),
                _ => doc.source.get(c).map(String::as_str).unwrap_or(""),
            };
            if !value.is_empty() {
                sheet.write_string(excel_row, c as u16, value)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::DocumentKind;

    #[test]
    fn test_next_block_leaves_three_blank_rows() {
        // 表头在第 2 行,两行数据 → 数据止于第 4 行,下一块表头在第 8 行
        assert_eq!(next_block(START_ROW, 2), 8);
    }

    #[test]
    fn test_section_headers_append_derived_columns_once() {
        let table = SubTable::new(
            DocumentKind::Receipt,
            vec!["Tipo Documento".to_string(), "Marketplace".to_string()],
            vec![],
        );
        let headers = section_headers(&table);
        assert_eq!(
            headers,
            vec![
                "Tipo Documento",
                "Marketplace",
                "Tipo_Doc_Relacionado",
                "Num_Doc_Relacionado"
            ]
        );
    }
}
