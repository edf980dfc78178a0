// ==========================================
// 销售对账系统 - 关联单据引用解析
// ==========================================
// 输入: "类型 / 号码 / 日期 / 金额"
// 输出: (类型, 号码),无法解析返回 None,从不报错
// ==========================================

use crate::domain::document::DocumentRef;
use crate::importer::data_cleaner::DataCleaner;
use regex::Regex;
use std::sync::OnceLock;

fn reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(.*?)\s*/\s*(\d+)").expect("invalid reference regex"))
}

/// 解析关联单据文本
///
/// 类型取第一个 `/` 之前的文本,号码取其后的第一段数字;
/// 号码按单据号规则规范化,可直接用于子表查找
pub fn parse_reference(text: &str) -> Option<DocumentRef> {
    let caps = reference_re().captures(text)?;
    let related_type = caps.get(1)?.as_str().trim().to_string();
    let related_number = DataCleaner.normalize_key(caps.get(2)?.as_str());
    Some(DocumentRef {
        related_type,
        related_number,
    })
}
