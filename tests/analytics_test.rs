// ==========================================
// 分析层 集成测试
// ==========================================
// 测试目标: 视图过滤 / KPI / 趋势 / 分组汇总（基于对账后台账）
// ==========================================


use chrono::NaiveDate;
use rust_decimal::Decimal;
use sales_recon::analytics::{self, trend, ColumnFilter, Kpis, Period, ViewFilter};
use sales_recon::config::{RunConfig, SourceSpec};
use sales_recon::domain::Ledger;
use sales_recon::engine::ReconciliationPipeline;
use sales_recon::importer::HeaderRow;
use test_helpers::*;

fn reconciled() -> Ledger {
    let config = RunConfig::new(SourceSpec::new("ventas.xlsx", HeaderRow::default()))
        .with_costs(SourceSpec::new("costos.xls", HeaderRow::default()))
        .with_annual(SourceSpec::new("anual.xlsx", annual_header_row()));
    ReconciliationPipeline::new(config)
        .run_with_sources(&ledger_source(), Some(&cost_source()), Some(&annual_source()))
        .unwrap()
        .ledger
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_default_view_excludes_returns() {
    let ledger = reconciled();
    let view = ViewFilter::new().apply(&ledger);

    assert_eq!(view.len(), 7);
    assert!(view.rows.iter().all(|r| r.document_number != "700"));

    let with_returns = ViewFilter::new().include_returns(true).apply(&ledger);
    assert_eq!(with_returns.len(), 8);
}

#[test]
fn test_kpis_over_sales_only() {
    let ledger = reconciled();
    let view = ViewFilter::new().apply(&ledger);
    let kpis = Kpis::from_rows(&view.rows);

    assert_eq!(kpis.net_sales, Decimal::from(121000));
    assert_eq!(kpis.costs, Decimal::from(35000));
    assert_eq!(kpis.margin, Decimal::from(86000));
    assert_eq!(kpis.units, 13);
    assert_eq!(kpis.documents, 7);
}

#[test]
fn test_date_range_is_inclusive() {
    let ledger = reconciled();
    let view = ViewFilter::new()
        .date_range(Some(date(2024, 1, 10)), Some(date(2024, 2, 12)))
        .apply(&ledger);

    let numbers: Vec<&str> = view.rows.iter().map(|r| r.document_number.as_str()).collect();
    assert_eq!(numbers, vec!["500", "501", "502"]);
}

#[test]
fn test_marketplace_branch_and_type_filters() {
    let ledger = reconciled();

    let vtex = ViewFilter::new().include_returns(true).marketplace("vtex").apply(&ledger);
    assert_eq!(vtex.len(), 2);

    let mayorista = ViewFilter::new().branch("SUCURSAL MAYORISTA").apply(&ledger);
    assert_eq!(mayorista.len(), 2);

    let ropa = ViewFilter::new().product_types(["Ropa"]).apply(&ledger);
    assert!(ropa.rows.iter().all(|r| r.product_type == "Ropa"));
    assert_eq!(ropa.len(), 4);
}

#[test]
fn test_column_include_and_exclude() {
    let ledger = reconciled();

    let only = ViewFilter::new()
        .column(ColumnFilter::include("Marketplace", ["fcom", "cvd"]))
        .apply(&ledger);
    assert_eq!(only.len(), 3);

    let without = ViewFilter::new()
        .column(ColumnFilter::exclude("Marketplace", ["fcom", "cvd"]))
        .apply(&ledger);
    assert_eq!(without.len(), 4);
}

#[test]
fn test_monthly_trend_with_moving_average() {
    let ledger = reconciled();
    let summary = analytics::analyze(&ledger, &ViewFilter::new(), Period::Monthly, Some(2), 10);

    assert_eq!(summary.trend.len(), 2);
    assert_eq!(summary.trend[0].period_start, date(2024, 1, 1));
    assert_eq!(summary.trend[0].sales, Decimal::from(50000));
    assert_eq!(summary.trend[1].sales, Decimal::from(71000));
    assert_eq!(summary.trend[0].moving_average, Some(Decimal::from(50000)));
    assert_eq!(summary.trend[1].moving_average, Some(Decimal::from(60500)));
}

#[test]
fn test_weekly_buckets_start_monday() {
    let ledger = reconciled();
    let view = ViewFilter::new().apply(&ledger);
    let points = trend(&view.rows, Period::Weekly);

    // 2024-01-05（周五）与 2024-01-08（周一）分属两周
    assert_eq!(points[0].period_start, date(2024, 1, 1));
    assert_eq!(points[1].period_start, date(2024, 1, 8));
    assert!(points.iter().all(|p| p.period_start.format("%a").to_string() == "Mon"));
}

#[test]
fn test_group_summaries_sorted_by_sales() {
    let ledger = reconciled();
    let summary = analytics::analyze(&ledger, &ViewFilter::new(), Period::Monthly, None, 10);

    let sales: Vec<Decimal> = summary.by_marketplace.iter().map(|g| g.kpis.net_sales).collect();
    let mut sorted = sales.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(sales, sorted);

    assert_eq!(summary.by_marketplace[0].key, "vpm");
    assert_eq!(summary.by_product_type[0].key, "Calzado");
    assert!(summary.trend.iter().all(|p| p.moving_average.is_none()));
}

#[test]
fn test_rankings_by_product_type() {
    let ledger = reconciled();
    let summary = analytics::analyze(&ledger, &ViewFilter::new(), Period::Monthly, None, 10);

    let top: Vec<&str> = summary.rankings.top_by_sales.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(top, vec!["Calzado", "Ropa"]);

    // Ropa: 41000 - 24000 = 17000; Calzado: 80000 - 11000 = 69000
    let bottom = &summary.rankings.bottom_by_margin;
    assert_eq!(bottom[0].key, "Ropa");
    assert_eq!(bottom[0].kpis.margin, Decimal::from(17000));
    assert_eq!(bottom[1].kpis.margin, Decimal::from(69000));

    let single = analytics::rankings(&ViewFilter::new().apply(&ledger).rows, 1);
    assert_eq!(single.top_by_sales.len(), 1);
    assert_eq!(single.bottom_by_margin[0].key, "Ropa");
}
