// ==========================================
// 销售对账系统 - 年度导出分段分类器
// ==========================================
// 职责: 把多分段年度导出切成六张单据类型子表
// 输入: 年度导出原始网格 + 基准表头行
// 输出: Sections（每个 DocumentKind 一张 SubTable）
// ==========================================
// 红线: 每个分段有独立表头,必须从分段表头处重新读取
// 红线: 重新读取后按分段字面量精确过滤,防止混入下一分段的行
// ==========================================

use crate::domain::columns::annual;
use crate::domain::document::SubTable;
use crate::domain::report::{RunWarning, WarningKind};
use crate::domain::types::DocumentKind;
use crate::engine::error::{ReconError, ReconResult};
use crate::engine::reference::parse_reference;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::FieldMapper;
use crate::importer::table::{HeaderRow, RawGrid, Table};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

// ==========================================
// Sections - 分类结果
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct Sections {
    pub tables: BTreeMap<DocumentKind, SubTable>,
    pub warnings: Vec<RunWarning>,
}

impl Sections {
    /// 取某类型子表（未切分的类型视为空表）
    pub fn get(&self, kind: DocumentKind) -> SubTable {
        self.tables
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| SubTable::empty(kind))
    }

    pub fn total_rows(&self) -> usize {
        self.tables.values().map(SubTable::len).sum()
    }
}

// ==========================================
// SectionClassifier - 分段分类器
// ==========================================
pub struct SectionClassifier {
    source_name: String,
    grid: RawGrid,
    base: Table,
    type_column: usize,
}

impl SectionClassifier {
    /// 以基准表头行读取年度导出
    ///
    /// # 错误
    /// - 表头行越界 → InvalidOffset
    /// - 缺少 "Tipo Documento" 列 → MalformedInput
    pub fn new(source_name: &str, grid: RawGrid, header_row: HeaderRow) -> ImportResult<Self> {
        let base = Table::from_grid(source_name, &grid, header_row)?;
        let type_column = base.require_column(annual::DOCUMENT_TYPE)?;
        Ok(Self {
            source_name: source_name.to_string(),
            grid,
            base,
            type_column,
        })
    }

    /// 定位分段表头（0 起网格下标）
    ///
    /// 分段表头 = 该类型第一条数据行的上一行
    pub fn locate_section(&self, kind: DocumentKind) -> Option<usize> {
        self.base
            .rows
            .iter()
            .find(|row| kind.matches_section_label(row.cell(self.type_column)))
            .map(|row| row.line - 2)
    }

    /// 切分单个分段
    ///
    /// # 错误
    /// - 分段字面量不存在 → SectionNotFound
    pub fn slice(&self, kind: DocumentKind) -> ReconResult<SubTable> {
        let header_index = self
            .locate_section(kind)
            .ok_or_else(|| ReconError::SectionNotFound {
                literal: kind.section_literal().to_string(),
            })?;

        let mut table = Table::from_grid_at(&self.source_name, &self.grid, header_index);
        let type_column = table.require_column(annual::DOCUMENT_TYPE)?;
        table
            .rows
            .retain(|row| kind.matches_section_label(row.cell(type_column)));

        let rows = FieldMapper
            .map_documents(&table, kind)?
            .into_iter()
            .map(|mut row| {
                row.related = row.related_text.as_deref().and_then(parse_reference);
                row
            })
            .collect();

        let sub_table = SubTable::new(kind, table.headers, rows);
        debug!(
            kind = %kind,
            header_line = header_index + 1,
            rows = sub_table.len(),
            "分段切分完成"
        );
        Ok(sub_table)
    }

    /// 切分全部六个分段
    ///
    /// optional 中的类型缺失时产出空子表 + MissingSection 告警
    pub fn slice_all(&self, optional: &BTreeSet<DocumentKind>) -> ReconResult<Sections> {
        let mut sections = Sections::default();

        for kind in DocumentKind::RESOLUTION_ORDER {
            let sub_table = match self.slice(kind) {
                Ok(table) => table,
                Err(ReconError::SectionNotFound { literal }) if optional.contains(&kind) => {
                    warn!(kind = %kind, literal = %literal, "可选分段缺失,按空表处理");
                    sections.warnings.push(RunWarning {
                        kind: WarningKind::MissingSection,
                        document_kind: Some(kind),
                        line: None,
                        message: format!("分段缺失: {}", literal),
                    });
                    SubTable::empty(kind)
                }
                Err(e) => return Err(e),
            };

            if sub_table.duplicate_count() > 0 {
                warn!(
                    kind = %kind,
                    duplicates = sub_table.duplicate_count(),
                    "子表存在重复单据号,按后写覆盖"
                );
                sections.warnings.push(RunWarning {
                    kind: WarningKind::DuplicateDocumentNumber,
                    document_kind: Some(kind),
                    line: None,
                    message: format!("{} 个重复单据号", sub_table.duplicate_count()),
                });
            }

            sections.tables.insert(kind, sub_table);
        }

        info!(
            source = %self.source_name,
            base_rows = self.base.len(),
            section_rows = sections.total_rows(),
            "年度导出分段完成"
        );
        Ok(sections)
    }

    /// 基准表中属于六类分段的行数
    pub fn typed_row_count(&self) -> usize {
        self.base
            .rows
            .iter()
            .filter(|row| {
                let label = row.cell(self.type_column);
                DocumentKind::RESOLUTION_ORDER
                    .iter()
                    .any(|kind| kind.matches_section_label(label))
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::error::ImportError;

    const RELATED: &str =
        "Documentos Relacionados (Tipo Documento / Nº Documento / Fecha Emisión / Monto del documento )";

    fn header() -> Vec<&'static str> {
        vec!["Tipo Documento", "Nº Documento", "Sucursal", "Vendedor", "Cliente", RELATED]
    }

    fn annual_grid() -> RawGrid {
        RawGrid::from_rows(vec![
            vec!["Informe anual", "", "", "", "", ""],
            header(),
            vec!["BOLETA ELECTRÓNICA T", "1", "SUCURSAL MAYORISTA", "", "", ""],
            vec!["BOLETA ELECTRÓNICA T", "2", "Casa Matriz", "", "", ""],
            header(),
            vec!["FACTURA DE EXPORTACIÓN ELECTRÓNICA", "30", "Casa Matriz", "", "", ""],
            header(),
            vec!["GUÍA DE DESPACHO ELECTRÓNICA", "123", "Casa Matriz", "", "", ""],
            header(),
            vec!["FACTURA ELECTRÓNICA", "500", "Casa Matriz", "ANA", "x", "GUÍA DE DESPACHO ELECTRÓNICA / 123 / 2024-01-01 / 1000"],
            vec!["FACTURA ELECTRÓNICA", "501", "Casa Matriz", "ANA", "x", ""],
            header(),
            vec!["NOTA DE CRÉDITO ELECTRÓNICA", "700", "Casa Matriz", "ANA", "x", "FACTURA ELECTRÓNICA / 500 / 2024-01-02 / 10"],
            header(),
            vec!["NOTA DE DÉBITO ELECTRÓNICA", "900", "Casa Matriz", "ANA", "x", "FACTURA ELECTRÓNICA / 501 / 2024-01-03 / 10"],
        ])
    }

    fn classifier() -> SectionClassifier {
        SectionClassifier::new("anual", annual_grid(), HeaderRow::new(2).unwrap()).unwrap()
    }

    #[test]
    fn test_locate_section_uses_row_above_first_match() {
        let c = classifier();
        assert_eq!(c.locate_section(DocumentKind::Receipt), Some(1));
        assert_eq!(c.locate_section(DocumentKind::Invoice), Some(8));
    }

    #[test]
    fn test_slice_parses_references() {
        let invoices = classifier().slice(DocumentKind::Invoice).unwrap();
        assert_eq!(invoices.len(), 2);
        let first = invoices.get("500").unwrap();
        let related = first.related.as_ref().unwrap();
        assert_eq!(related.related_type, "GUÍA DE DESPACHO ELECTRÓNICA");
        assert_eq!(related.related_number, "123");
        assert_eq!(invoices.get("501").unwrap().related, None);
    }

    #[test]
    fn test_slice_all_preserves_typed_row_count() {
        let c = classifier();
        let sections = c.slice_all(&BTreeSet::new()).unwrap();
        assert_eq!(sections.tables.len(), 6);
        assert_eq!(sections.total_rows(), c.typed_row_count());
        assert_eq!(sections.total_rows(), 8);
    }

    #[test]
    fn test_missing_section_is_fatal_unless_optional() {
        let mut grid = annual_grid();
        grid.rows.truncate(13);
        let c = SectionClassifier::new("anual", grid, HeaderRow::new(2).unwrap()).unwrap();

        match c.slice_all(&BTreeSet::new()) {
            Err(ReconError::SectionNotFound { literal }) => {
                assert_eq!(literal, "NOTA DE DÉBITO ELECTRÓNICA");
            }
            other => panic!("unexpected: {:?}", other.map(|s| s.total_rows())),
        }

        let optional = BTreeSet::from([DocumentKind::DebitNote]);
        let sections = c.slice_all(&optional).unwrap();
        assert!(sections.get(DocumentKind::DebitNote).is_empty());
        assert_eq!(sections.warnings.len(), 1);
        assert_eq!(sections.warnings[0].kind, WarningKind::MissingSection);
    }

    #[test]
    fn test_missing_type_column() {
        let grid = RawGrid::from_rows(vec![vec!["Documento", "Nº Documento"], vec!["x", "1"]]);
        let result = SectionClassifier::new("anual", grid, HeaderRow::default());
        assert!(matches!(result, Err(ImportError::MalformedInput { .. })));
    }
}
