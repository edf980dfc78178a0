// ==========================================
// 销售对账系统 - 年度导出单据实体
// ==========================================
// 职责: 单据行 / 关联单据引用 / 按单据类型的子表
// 红线: 子表内单据号按规范化后唯一,重复时后写覆盖（并计数上报）
// ==========================================

use crate::domain::types::DocumentKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// DocumentRef - 关联单据引用
// ==========================================
// 从 "类型 / 号码 / 日期 / 金额" 文本中解析得到
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub related_type: String,
    pub related_number: String,
}

// ==========================================
// DocumentRow - 年度导出单据行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRow {
    pub line: usize,                         // 源文件行号（1 起）
    pub kind: DocumentKind,                  // 所属分段
    pub document_number: String,             // 规范化单据号
    pub branch: String,                      // Sucursal
    pub seller: String,                      // Vendedor
    pub customer: String,                    // Cliente
    pub related_text: Option<String>,        // 关联单据原文
    pub related: Option<DocumentRef>,        // 解析后的关联单据
    pub source_marketplace: Option<String>,  // 导出文件自带的 Marketplace 列
    pub marketplace: Option<String>,         // 解析结果（None = 未解析）
    pub source: Vec<String>,                 // 原始单元格,与 SubTable::headers 对齐
}

impl DocumentRow {
    /// 生成带新市场标签的副本（解析阶段不修改输入行）
    pub fn with_marketplace(&self, marketplace: Option<String>) -> DocumentRow {
        DocumentRow {
            marketplace,
            ..self.clone()
        }
    }
}

// ==========================================
// SubTable - 单据类型子表
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct SubTable {
    pub kind: DocumentKind,
    pub headers: Vec<String>,
    rows: Vec<DocumentRow>,
    index: HashMap<String, usize>,
    duplicates: usize,
}

impl SubTable {
    pub fn new(kind: DocumentKind, headers: Vec<String>, rows: Vec<DocumentRow>) -> Self {
        let mut index = HashMap::with_capacity(rows.len());
        let mut duplicates = 0;
        for (pos, row) in rows.iter().enumerate() {
            if index.insert(row.document_number.clone(), pos).is_some() {
                duplicates += 1;
            }
        }
        Self {
            kind,
            headers,
            rows,
            index,
            duplicates,
        }
    }

    pub fn empty(kind: DocumentKind) -> Self {
        Self::new(kind, Vec::new(), Vec::new())
    }

    pub fn rows(&self) -> &[DocumentRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 重复单据号数量（后写覆盖）
    pub fn duplicate_count(&self) -> usize {
        self.duplicates
    }

    pub fn get(&self, document_number: &str) -> Option<&DocumentRow> {
        self.index.get(document_number).map(|&pos| &self.rows[pos])
    }

    pub fn contains(&self, document_number: &str) -> bool {
        self.index.contains_key(document_number)
    }

    /// 已解析的非空市场标签
    pub fn marketplace_of(&self, document_number: &str) -> Option<&str> {
        self.get(document_number)
            .and_then(|row| row.marketplace.as_deref())
            .filter(|m| !m.trim().is_empty())
    }

    /// 以同样的表头生成新子表
    pub fn with_rows(&self, rows: Vec<DocumentRow>) -> SubTable {
        SubTable::new(self.kind, self.headers.clone(), rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(number: &str, marketplace: Option<&str>) -> DocumentRow {
        DocumentRow {
            line: 1,
            kind: DocumentKind::DispatchGuide,
            document_number: number.to_string(),
            branch: String::new(),
            seller: String::new(),
            customer: String::new(),
            related_text: None,
            related: None,
            source_marketplace: None,
            marketplace: marketplace.map(str::to_string),
            source: vec![],
        }
    }

    #[test]
    fn test_duplicate_numbers_last_write_wins() {
        let table = SubTable::new(
            DocumentKind::DispatchGuide,
            vec![],
            vec![row("10", Some("vtex")), row("10", Some("ripley"))],
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.duplicate_count(), 1);
        assert_eq!(table.marketplace_of("10"), Some("ripley"));
    }

    #[test]
    fn test_blank_marketplace_is_unresolved() {
        let table = SubTable::new(
            DocumentKind::DispatchGuide,
            vec![],
            vec![row("1", Some("  ")), row("2", None)],
        );
        assert!(table.contains("1"));
        assert_eq!(table.marketplace_of("1"), None);
        assert_eq!(table.marketplace_of("2"), None);
        assert_eq!(table.marketplace_of("3"), None);
    }
}
