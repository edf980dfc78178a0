// ==========================================
// 销售对账系统 - 数据清洗器实现
// ==========================================
// 职责: 键规范化 / TRIM / NULL 标准化 / 金额、数量、日期解析
// 红线: 单据号与 SKU 必须经过 normalize_key 才能参与关联
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

pub struct DataCleaner;

impl DataCleaner {
    /// 关联键规范化
    ///
    /// 顺序: 去掉末尾 ".0" → 去掉 `="` 前缀与 `"` 后缀 → TRIM → 小写
    pub fn normalize_key(&self, value: &str) -> String {
        let mut key = value.strip_suffix(".0").unwrap_or(value);
        key = key.strip_prefix("=\"").unwrap_or(key);
        key = key.strip_suffix('"').unwrap_or(key);
        key.trim().to_lowercase()
    }

    pub fn clean_text(&self, value: &str) -> String {
        value.trim().to_string()
    }

    pub fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    /// 解析金额（去掉 `$`、空白与千分位逗号）
    ///
    /// 空值返回 Ok(None);无法解析返回 Err(原文)
    pub fn parse_amount(&self, value: &str) -> Result<Option<Decimal>, String> {
        let cleaned: String = value
            .trim()
            .chars()
            .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
            .collect();
        if cleaned.is_empty() {
            return Ok(None);
        }

        Decimal::from_str(&cleaned)
            .or_else(|_| Decimal::from_scientific(&cleaned))
            .map(Some)
            .map_err(|_| value.trim().to_string())
    }

    /// 解析数量（整数;带小数时四舍六入五成双取整）
    pub fn parse_quantity(&self, value: &str) -> Result<Option<i64>, String> {
        match self.parse_amount(value)? {
            None => Ok(None),
            Some(amount) => amount
                .round()
                .to_i64()
                .map(Some)
                .ok_or_else(|| value.trim().to_string()),
        }
    }

    /// 解析日期
    ///
    /// 支持: YYYY-MM-DD / DD/MM/YYYY / DD-MM-YYYY（可带时间）
    pub fn parse_date(&self, value: &str) -> Option<NaiveDate> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        for fmt in ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"] {
            if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
                return Some(date);
            }
        }
        for fmt in [
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%dT%H:%M:%S",
            "%d/%m/%Y %H:%M:%S",
            "%d/%m/%Y %H:%M",
            "%d-%m-%Y %H:%M:%S",
        ] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
                return Some(dt.date());
            }
        }
        None
    }
}
