// ==========================================
// 分段分类 + 市场解析 集成测试
// ==========================================
// 测试目标: 年度导出切分为六张子表后,按固定顺序解析市场标签
// ==========================================


use sales_recon::config::ResolverRules;
use sales_recon::domain::{DocumentKind, WarningKind};
use sales_recon::engine::{parse_reference, MarketplaceResolver, ResolvedSections, SectionClassifier};
use sales_recon::importer::RawGrid;
use std::collections::BTreeSet;
use test_helpers::{annual_grid, annual_header_row, annual_rows};

fn resolve(grid: RawGrid, rules: &ResolverRules) -> (ResolvedSections, Vec<sales_recon::RunWarning>) {
    let classifier = SectionClassifier::new("anual.xlsx", grid, annual_header_row())
        .expect("annual grid should load");
    let sections = classifier
        .slice_all(&BTreeSet::new())
        .expect("all sections should be present");
    MarketplaceResolver::new(rules).resolve(&sections)
}

fn marketplace(resolved: &ResolvedSections, kind: DocumentKind, number: &str) -> Option<String> {
    resolved
        .get(kind)
        .and_then(|t| t.marketplace_of(number))
        .map(str::to_string)
}

#[test]
fn test_fixture_resolves_every_document() {
    let rules = ResolverRules::default();
    let (resolved, warnings) = resolve(annual_grid(), &rules);

    // 叶子分段
    assert_eq!(marketplace(&resolved, DocumentKind::Receipt, "1").as_deref(), Some("T.NAVIDEÑA"));
    assert_eq!(marketplace(&resolved, DocumentKind::Receipt, "2").as_deref(), Some("Tienda"));
    assert_eq!(marketplace(&resolved, DocumentKind::ExportInvoice, "30").as_deref(), Some("cvd"));
    assert_eq!(marketplace(&resolved, DocumentKind::DispatchGuide, "123").as_deref(), Some("vtex"));

    // 发票: 经发货单查找 / 线上销售员 / 批发门店
    assert_eq!(marketplace(&resolved, DocumentKind::Invoice, "500").as_deref(), Some("vtex"));
    assert_eq!(marketplace(&resolved, DocumentKind::Invoice, "501").as_deref(), Some("fcom"));
    assert_eq!(marketplace(&resolved, DocumentKind::Invoice, "502").as_deref(), Some("vpm"));

    // 通知单: 经发票查找
    assert_eq!(marketplace(&resolved, DocumentKind::CreditNote, "700").as_deref(), Some("vtex"));
    assert_eq!(marketplace(&resolved, DocumentKind::DebitNote, "900").as_deref(), Some("fcom"));

    // 502 引用的发货单 999 不存在
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, WarningKind::UnresolvedReference);
    assert_eq!(warnings[0].document_kind, Some(DocumentKind::Invoice));
}

#[test]
fn test_row_counts_match_typed_rows() {
    let classifier = SectionClassifier::new("anual.xlsx", annual_grid(), annual_header_row()).unwrap();
    let sections = classifier.slice_all(&BTreeSet::new()).unwrap();
    let (resolved, _) = MarketplaceResolver::new(&ResolverRules::default()).resolve(&sections);

    let total: usize = resolved.row_counts().values().sum();
    assert_eq!(total, classifier.typed_row_count());
    assert_eq!(resolved.row_counts().get(&DocumentKind::Invoice), Some(&3));
}

#[test]
fn test_resolution_is_deterministic() {
    let rules = ResolverRules::default();
    let (first, _) = resolve(annual_grid(), &rules);
    let (second, _) = resolve(annual_grid(), &rules);

    for kind in DocumentKind::RESOLUTION_ORDER {
        let a: Vec<Option<String>> = first.get(kind).unwrap().rows().iter().map(|r| r.marketplace.clone()).collect();
        let b: Vec<Option<String>> = second.get(kind).unwrap().rows().iter().map(|r| r.marketplace.clone()).collect();
        assert_eq!(a, b, "{} should resolve identically", kind);
    }
}

#[test]
fn test_online_seller_outranks_wholesale_branch() {
    let mut rows = annual_rows();
    // 批发门店 + 线上销售员 → fcom
    rows[11] = vec![
        "FACTURA ELECTRÓNICA",
        "502",
        "SUCURSAL MAYORISTA",
        "VENTA ONLINE",
        "x",
        "GUÍA DE DESPACHO ELECTRÓNICA / 123 / 2024-01-01 / 1000",
        "",
    ];
    let (resolved, warnings) = resolve(RawGrid::from_rows(rows), &ResolverRules::default());

    assert_eq!(marketplace(&resolved, DocumentKind::Invoice, "502").as_deref(), Some("fcom"));
    assert!(warnings.is_empty());
}

#[test]
fn test_credit_note_online_order_rule() {
    let mut rows = annual_rows();
    rows[13] = vec![
        "NOTA DE CRÉDITO ELECTRÓNICA",
        "700",
        "Casa Matriz",
        "VENTA ONLINE",
        "maestro",
        "",
        "",
    ];
    let (resolved, _) = resolve(RawGrid::from_rows(rows), &ResolverRules::default());
    assert_eq!(marketplace(&resolved, DocumentKind::CreditNote, "700").as_deref(), Some("fcom"));
}

#[test]
fn test_credit_note_without_reference_at_wholesale_branch() {
    let mut rows = annual_rows();
    rows[13] = vec!["NOTA DE CRÉDITO ELECTRÓNICA", "700", "SUCURSAL MAYORISTA", "ANA", "x", "", ""];
    let (resolved, warnings) = resolve(RawGrid::from_rows(rows), &ResolverRules::default());

    assert_eq!(marketplace(&resolved, DocumentKind::CreditNote, "700").as_deref(), Some("vpm"));
    // 无关联单据不算未命中
    assert!(warnings
        .iter()
        .all(|w| w.document_kind != Some(DocumentKind::CreditNote)));
}

#[test]
fn test_credit_note_referencing_receipt() {
    let mut rows = annual_rows();
    rows[13] = vec![
        "NOTA DE CRÉDITO ELECTRÓNICA",
        "700",
        "Casa Matriz",
        "ANA",
        "x",
        "Boleta Electrónica / 2 / 2024-01-02 / 10",
        "",
    ];
    let (resolved, _) = resolve(RawGrid::from_rows(rows), &ResolverRules::default());
    assert_eq!(marketplace(&resolved, DocumentKind::CreditNote, "700").as_deref(), Some("Tienda"));
}

#[test]
fn test_custom_rules_change_labels() {
    let rules = ResolverRules::from_json_str(
        r#"{ "wholesale_receipt_label": "MAYORISTA", "export_label": "export" }"#,
    )
    .unwrap();
    let (resolved, _) = resolve(annual_grid(), &rules);

    assert_eq!(marketplace(&resolved, DocumentKind::Receipt, "1").as_deref(), Some("MAYORISTA"));
    assert_eq!(marketplace(&resolved, DocumentKind::ExportInvoice, "30").as_deref(), Some("export"));
    assert_eq!(marketplace(&resolved, DocumentKind::Invoice, "502").as_deref(), Some("vpm"));
}

#[test]
fn test_reference_text_parsing() {
    let reference = parse_reference("GUÍA DE DESPACHO ELECTRÓNICA / 456 / 2024-01-01 / 1000").unwrap();
    assert_eq!(reference.related_type, "GUÍA DE DESPACHO ELECTRÓNICA");
    assert_eq!(reference.related_number, "456");
    assert!(parse_reference("sin referencia").is_none());
}

#[test]
fn test_missing_section_is_fatal() {
    // 去掉借项通知单分段
    let rows: Vec<Vec<&str>> = annual_rows().into_iter().take(14).collect();
    let classifier = SectionClassifier::new("anual.xlsx", RawGrid::from_rows(rows), annual_header_row()).unwrap();
    assert!(classifier.slice_all(&BTreeSet::new()).is_err());

    let optional = BTreeSet::from([DocumentKind::DebitNote]);
    let sections = classifier.slice_all(&optional).unwrap();
    assert!(sections.get(DocumentKind::DebitNote).is_empty());
    assert_eq!(sections.warnings[0].kind, WarningKind::MissingSection);
}
