// ==========================================
// 销售对账系统 - 市场解析规则字面量
// ==========================================
// 职责: 门店/销售员/客户/市场标签等字面量的集中配置
// 红线: 解析器内不得出现硬编码的业务字面量
// ==========================================

use crate::domain::types::NO_DATA;
use crate::engine::error::{ReconError, ReconResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 市场解析规则（所有字段可由 JSON 覆盖,缺省字段取默认值）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverRules {
    /// 批发门店
    pub wholesale_branch: String,

    /// 总店
    pub head_office_branch: String,

    /// 线上销售员
    pub online_seller: String,

    /// 线上订单的主数据客户
    pub online_customer: String,

    /// 批发门店小票的市场标签
    pub wholesale_receipt_label: String,

    /// 出口发票的市场标签
    pub export_label: String,

    /// 批发门店发票/贷项的市场标签
    pub wholesale_label: String,

    /// 线上销售的市场标签
    pub online_label: String,

    /// 无数据哨兵值
    pub no_data_label: String,
}

impl Default for ResolverRules {
    fn default() -> Self {
        Self {
            wholesale_branch: "SUCURSAL MAYORISTA".to_string(),
            head_office_branch: "Casa Matriz".to_string(),
            online_seller: "VENTA ONLINE".to_string(),
            online_customer: "maestro".to_string(),
            wholesale_receipt_label: "T.NAVIDEÑA".to_string(),
            export_label: "cvd".to_string(),
            wholesale_label: "vpm".to_string(),
            online_label: "fcom".to_string(),
            no_data_label: NO_DATA.to_string(),
        }
    }
}

impl ResolverRules {
    pub fn from_json_str(raw: &str) -> ReconResult<Self> {
        serde_json::from_str(raw).map_err(|e| ReconError::Config(format!("规则 JSON 无效: {}", e)))
    }

    pub fn from_json_file(path: &Path) -> ReconResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ReconError::Config(format!("无法读取规则文件 {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    /// 是否为哨兵值（或空白）
    pub fn is_no_data(&self, value: &str) -> bool {
        let trimmed = value.trim();
        trimmed.is_empty() || trimmed == self.no_data_label
    }
}
