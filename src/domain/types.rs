// ==========================================
// 销售对账系统 - 领域类型定义
// ==========================================
// 职责: 单据类型闭集 + 单据字面量映射表
// 红线: 所有按单据类型的分派必须经过 DocumentKind,不直接比较字符串
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 无数据哨兵值（市场未能解析时的兜底标签）
pub const NO_DATA: &str = "Sin datos";

// ==========================================
// 单据类型 (Document Kind)
// ==========================================
// 顺序即解析顺序: 后面的类型可以引用前面已解析的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentKind {
    Receipt,       // 小票 (BOLETA ELECTRÓNICA T)
    ExportInvoice, // 出口发票
    DispatchGuide, // 发货单
    Invoice,       // 销售发票
    CreditNote,    // 贷项通知单
    DebitNote,     // 借项通知单
}

impl DocumentKind {
    /// 市场解析的固定拓扑顺序
    pub const RESOLUTION_ORDER: [DocumentKind; 6] = [
        DocumentKind::Receipt,
        DocumentKind::ExportInvoice,
        DocumentKind::DispatchGuide,
        DocumentKind::Invoice,
        DocumentKind::CreditNote,
        DocumentKind::DebitNote,
    ];

    /// 年度导出文件中该分段的 "Tipo Documento" 字面量
    pub fn section_literal(self) -> &'static str {
        match self {
            DocumentKind::Receipt => "BOLETA ELECTRÓNICA T",
            DocumentKind::ExportInvoice => "FACTURA DE EXPORTACIÓN ELECTRÓNICA",
            DocumentKind::DispatchGuide => "GUÍA DE DESPACHO ELECTRÓNICA",
            DocumentKind::Invoice => "FACTURA ELECTRÓNICA",
            DocumentKind::CreditNote => "NOTA DE CRÉDITO ELECTRÓNICA",
            DocumentKind::DebitNote => "NOTA DE DÉBITO ELECTRÓNICA",
        }
    }

    /// 关联单据文本中用于识别该类型的子串
    ///
    /// 小票的关联文本不带 " T" 后缀,其余类型与分段字面量一致
    pub fn reference_marker(self) -> &'static str {
        match self {
            DocumentKind::Receipt => "BOLETA ELECTRÓNICA",
            other => other.section_literal(),
        }
    }

    /// 第二工作簿中的工作表名
    pub fn sheet_name(self) -> &'static str {
        match self {
            DocumentKind::Receipt => "Boletas",
            DocumentKind::ExportInvoice => "Facturas Exportación",
            DocumentKind::DispatchGuide => "Guías de Despacho",
            DocumentKind::Invoice => "Facturas",
            DocumentKind::CreditNote => "Notas de Crédito",
            DocumentKind::DebitNote => "Notas de Débito",
        }
    }

    /// 判断年度导出中的单据类型单元格是否属于该分段（忽略大小写,精确匹配）
    pub fn matches_section_label(self, label: &str) -> bool {
        label.trim().to_lowercase() == self.section_literal().to_lowercase()
    }

    /// 判断销售台账中的 "Tipo de Documento" 是否属于该类型
    ///
    /// - 小票: 忽略大小写精确匹配 "boleta electrónica t"
    /// - 其他: 忽略大小写包含分段字面量
    pub fn matches_ledger_label(self, label: &str) -> bool {
        let label = label.trim().to_lowercase();
        let literal = self.section_literal().to_lowercase();
        match self {
            DocumentKind::Receipt => label == literal,
            _ => label.contains(&literal),
        }
    }

    /// 从销售台账的单据类型标签识别单据类型
    pub fn from_ledger_label(label: &str) -> Option<DocumentKind> {
        Self::RESOLUTION_ORDER
            .into_iter()
            .find(|kind| kind.matches_ledger_label(label))
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Receipt => write!(f, "RECEIPT"),
            DocumentKind::ExportInvoice => write!(f, "EXPORT_INVOICE"),
            DocumentKind::DispatchGuide => write!(f, "DISPATCH_GUIDE"),
            DocumentKind::Invoice => write!(f, "INVOICE"),
            DocumentKind::CreditNote => write!(f, "CREDIT_NOTE"),
            DocumentKind::DebitNote => write!(f, "DEBIT_NOTE"),
        }
    }
}
