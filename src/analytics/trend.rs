// ==========================================
// 销售对账系统 - 时间趋势
// ==========================================
// 周期: 日 / ISO 周（周一起）/ 月（每月 1 日）
// 移动平均: 尾随窗口,不足窗口长度时按已有数据求平均
// ==========================================

use crate::domain::ledger::LedgerRow;
use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    Weekly,
    #[default]
    Monthly,
}

impl Period {
    /// 日期所在周期的起始日
    pub fn bucket(self, date: NaiveDate) -> NaiveDate {
        match self {
            Period::Daily => date,
            Period::Weekly => date - Duration::days(date.weekday().num_days_from_monday() as i64),
            Period::Monthly => date.with_day(1).unwrap_or(date),
        }
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "day" | "diario" => Ok(Period::Daily),
            "weekly" | "week" | "semanal" => Ok(Period::Weekly),
            "monthly" | "month" | "mensual" => Ok(Period::Monthly),
            other => Err(format!("未知周期: {}", other)),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
        };
        write!(f, "{}", s)
    }
}

// ==========================================
// TrendPoint - 趋势点
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub period_start: NaiveDate,
    pub sales: Decimal,
    pub margin: Decimal, // 行级 sales − |cost| 之和
    pub units: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moving_average: Option<Decimal>,
}

/// 按周期汇总;没有开票日期的行不参与
pub fn trend(rows: &[LedgerRow], period: Period) -> Vec<TrendPoint> {
    let mut buckets: BTreeMap<NaiveDate, TrendPoint> = BTreeMap::new();
    for row in rows {
        let Some(date) = row.issue_date else { continue };
        let start = period.bucket(date);
        let point = buckets.entry(start).or_insert_with(|| TrendPoint {
            period_start: start,
            sales: Decimal::ZERO,
            margin: Decimal::ZERO,
            units: 0,
            moving_average: None,
        });
        let sale = row.total_sale();
        point.sales += sale;
        point.margin += sale - row.total_cost.abs();
        point.units += row.quantity;
    }
    buckets.into_values().collect()
}

/// 为销售额附加尾随移动平均（window 至少为 1）
pub fn with_moving_average(points: Vec<TrendPoint>, window: usize) -> Vec<TrendPoint> {
    let window = window.max(1);
    let sales: Vec<Decimal> = points.iter().map(|p| p.sales).collect();
    points
        .into_iter()
        .enumerate()
        .map(|(i, mut point)| {
            let from = (i + 1).saturating_sub(window);
            let slice = &sales[from..=i];
            let sum: Decimal = slice.iter().copied().sum();
            point.moving_average = Some((sum / Decimal::from(slice.len())).round_dp(2));
            point
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn point(day: u32, sales: i64) -> TrendPoint {
        TrendPoint {
            period_start: date(2024, 3, day),
            sales: Decimal::from(sales),
            margin: Decimal::ZERO,
            units: 0,
            moving_average: None,
        }
    }

    #[test]
    fn test_weekly_bucket_starts_on_monday() {
        // 2024-03-14 是周四
        assert_eq!(Period::Weekly.bucket(date(2024, 3, 14)), date(2024, 3, 11));
        assert_eq!(Period::Weekly.bucket(date(2024, 3, 11)), date(2024, 3, 11));
        assert_eq!(Period::Monthly.bucket(date(2024, 3, 14)), date(2024, 3, 1));
    }

    #[test]
    fn test_moving_average_uses_partial_windows() {
        let points = vec![point(1, 100), point(2, 200), point(3, 600)];
        let averaged = with_moving_average(points, 2);
        let ma: Vec<Decimal> = averaged.iter().filter_map(|p| p.moving_average).collect();
        assert_eq!(ma, vec![Decimal::from(100), Decimal::from(150), Decimal::from(400)]);
    }

    #[test]
    fn test_period_parse() {
        assert_eq!("Semanal".parse::<Period>().unwrap(), Period::Weekly);
        assert!("yearly".parse::<Period>().is_err());
    }
}
