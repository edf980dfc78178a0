// ==========================================
// 销售对账系统 - 运行配置
// ==========================================
// 职责: 单次运行的不可变配置（数据源 / 过滤 / 规则 / 报表参数）
// 红线: 运行期间只读,贯穿整个流水线,不使用全局可变状态
// ==========================================

use crate::config::rules::ResolverRules;
use crate::domain::types::DocumentKind;
use crate::engine::error::{ReconError, ReconResult};
use crate::importer::table::HeaderRow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

// ==========================================
// SourceSpec - 数据源位置 + 表头行
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub path: PathBuf,
    #[serde(default)]
    pub header_row: HeaderRow,
}

impl SourceSpec {
    pub fn new(path: impl Into<PathBuf>, header_row: HeaderRow) -> Self {
        Self {
            path: path.into(),
            header_row,
        }
    }

    /// 只替换路径;已有配置的表头行保留
    pub fn override_path(existing: Option<SourceSpec>, path: impl Into<PathBuf>) -> Self {
        let header_row = existing.map(|s| s.header_row).unwrap_or_default();
        Self::new(path, header_row)
    }
}

// ==========================================
// ExclusionFilter - 排除过滤器
// ==========================================
// 列值（TRIM 后）落在 excluded 中的行被排除
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionFilter {
    pub column: String,
    pub excluded: BTreeSet<String>,
}

impl ExclusionFilter {
    pub fn new<I, S>(column: impl Into<String>, excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            column: column.into().trim().to_string(),
            excluded: excluded
                .into_iter()
                .map(|v| v.into().trim().to_string())
                .collect(),
        }
    }

    pub fn excludes(&self, value: &str) -> bool {
        self.excluded.contains(value.trim())
    }
}

// ==========================================
// FilterSet - 有序过滤器集合
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    pub filters: Vec<ExclusionFilter>,
}

impl FilterSet {
    pub fn new(filters: Vec<ExclusionFilter>) -> Self {
        Self { filters }
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExclusionFilter> {
        self.filters.iter()
    }

    /// 由并行的列名列表与排除值分组构造
    ///
    /// # 错误
    /// - 列数与分组数不一致 → FilterConfigMismatch
    pub fn from_lists(columns: Vec<String>, groups: Vec<Vec<String>>) -> ReconResult<Self> {
        if columns.len() != groups.len() {
            return Err(ReconError::FilterConfigMismatch {
                columns: columns.len(),
                groups: groups.len(),
            });
        }
        Ok(Self::new(
            columns
                .into_iter()
                .zip(groups)
                .map(|(column, values)| ExclusionFilter::new(column, values))
                .collect(),
        ))
    }

    /// 解析命令行文本
    ///
    /// - columns: "A, B"（逗号分隔列名）
    /// - values: "x;y, z"（逗号分隔分组,分号分隔组内值）
    /// - 任一为空 → 不过滤
    pub fn parse(columns: &str, values: &str) -> ReconResult<Self> {
        let columns = columns.trim();
        let values = values.trim();
        if columns.is_empty() || values.is_empty() {
            return Ok(Self::default());
        }

        let column_list = columns.split(',').map(|c| c.trim().to_string()).collect();
        let groups = values
            .split(',')
            .map(|group| group.trim().split(';').map(|v| v.trim().to_string()).collect())
            .collect();
        Self::from_lists(column_list, groups)
    }
}

// ==========================================
// ReportSettings - 报表参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// 低毛利阈值（整数百分比,<= 阈值入选）
    pub margin_threshold: i64,

    /// 排名前/后 N
    pub ranking_size: usize,

    /// 产品族 = SKU 前 N 位
    pub product_code_len: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            margin_threshold: 20,
            ranking_size: 10,
            product_code_len: 8,
        }
    }
}

// ==========================================
// RunConfig - 运行配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub ledger: SourceSpec,
    #[serde(default)]
    pub costs: Option<SourceSpec>,
    #[serde(default)]
    pub annual: Option<SourceSpec>,
    #[serde(default)]
    pub filters: FilterSet,
    #[serde(default)]
    pub rules: ResolverRules,
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default = "default_true")]
    pub drop_ledger_total_row: bool,
    /// 允许缺失的年度导出分段（缺失时为空子表 + 告警）
    #[serde(default)]
    pub optional_sections: BTreeSet<DocumentKind>,
}

fn default_true() -> bool {
    true
}

impl RunConfig {
    pub fn new(ledger: SourceSpec) -> Self {
        Self {
            ledger,
            costs: None,
            annual: None,
            filters: FilterSet::default(),
            rules: ResolverRules::default(),
            report: ReportSettings::default(),
            drop_ledger_total_row: true,
            optional_sections: BTreeSet::new(),
        }
    }

    pub fn with_costs(mut self, costs: SourceSpec) -> Self {
        self.costs = Some(costs);
        self
    }

    pub fn with_annual(mut self, annual: SourceSpec) -> Self {
        self.annual = Some(annual);
        self
    }

    pub fn with_filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_rules(mut self, rules: ResolverRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_report(mut self, report: ReportSettings) -> Self {
        self.report = report;
        self
    }

    pub fn with_optional_section(mut self, kind: DocumentKind) -> Self {
        self.optional_sections.insert(kind);
        self
    }

    pub fn keep_ledger_total_row(mut self) -> Self {
        self.drop_ledger_total_row = false;
        self
    }
}

// ==========================================
// RunConfigFile - JSON 配置文件
// ==========================================
// 命令行参数覆盖文件中的同名字段
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfigFile {
    pub ledger: Option<SourceSpec>,
    pub costs: Option<SourceSpec>,
    pub annual: Option<SourceSpec>,
    pub output: Option<PathBuf>,
    pub secondary_output: Option<PathBuf>,
    pub filters: Option<FilterSet>,
    pub rules: Option<ResolverRules>,
    pub rules_file: Option<PathBuf>,
    pub report: Option<ReportSettings>,
    pub drop_ledger_total_row: Option<bool>,
    pub optional_sections: BTreeSet<DocumentKind>,
}

impl RunConfigFile {
    pub fn from_json_str(raw: &str) -> ReconResult<Self> {
        serde_json::from_str(raw).map_err(|e| ReconError::Config(format!("配置 JSON 无效: {}", e)))
    }

    pub fn from_json_file(path: &Path) -> ReconResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ReconError::Config(format!("无法读取配置文件 {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    /// 生成运行配置（规则优先级: rules_file > rules > 默认值）
    ///
    /// # 错误
    /// - 未指定销售台账 → Config
    pub fn into_run_config(self) -> ReconResult<RunConfig> {
        let ledger = self
            .ledger
            .ok_or_else(|| ReconError::Config("未指定销售台账 (ledger)".to_string()))?;

        let rules = match (&self.rules_file, self.rules) {
            (Some(path), _) => ResolverRules::from_json_file(path)?,
            (None, Some(rules)) => rules,
            (None, None) => ResolverRules::default(),
        };

        Ok(RunConfig {
            ledger,
            costs: self.costs,
            annual: self.annual,
            filters: self.filters.unwrap_or_default(),
            rules,
            report: self.report.unwrap_or_default(),
            drop_ledger_total_row: self.drop_ledger_total_row.unwrap_or(true),
            optional_sections: self.optional_sections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_parse_groups() {
        let filters = FilterSet::parse("Sucursal, Marketplace", "Casa Matriz;Bodega , Sin datos").unwrap();
        assert_eq!(filters.filters.len(), 2);
        assert_eq!(filters.filters[0].column, "Sucursal");
        assert!(filters.filters[0].excludes(" Bodega "));
        assert!(filters.filters[1].excludes("Sin datos"));
        assert!(!filters.filters[1].excludes("vtex"));
    }

    #[test]
    fn test_filter_parse_mismatch() {
        let err = FilterSet::parse("A, B", "x;y").unwrap_err();
        match err {
            ReconError::FilterConfigMismatch { columns, groups } => {
                assert_eq!(columns, 2);
                assert_eq!(groups, 1);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_filter_parse_empty_means_no_filter() {
        assert!(FilterSet::parse("", "").unwrap().is_empty());
        assert!(FilterSet::parse("Sucursal", " ").unwrap().is_empty());
    }

    #[test]
    fn test_config_file_defaults() {
        let file = RunConfigFile::from_json_str(
            r#"{
                "ledger": {"path": "ventas.xlsx", "header_row": 3},
                "annual": {"path": "anual.xlsx", "header_row": 5},
                "report": {"margin_threshold": 15},
                "optional_sections": ["DEBIT_NOTE"]
            }"#,
        )
        .unwrap();
        let config = file.into_run_config().unwrap();
        assert_eq!(config.ledger.header_row.get(), 3);
        assert_eq!(config.costs, None);
        assert_eq!(config.report.margin_threshold, 15);
        assert_eq!(config.report.ranking_size, 10);
        assert!(config.drop_ledger_total_row);
        assert!(config.optional_sections.contains(&DocumentKind::DebitNote));
    }

    #[test]
    fn test_config_file_rejects_zero_header_row() {
        let err = RunConfigFile::from_json_str(r#"{"ledger": {"path": "v.xlsx", "header_row": 0}}"#);
        assert!(matches!(err, Err(ReconError::Config(_))));
    }

    #[test]
    fn test_config_file_requires_ledger() {
        let err = RunConfigFile::default().into_run_config().unwrap_err();
        assert!(matches!(err, ReconError::Config(_)));
    }
}
