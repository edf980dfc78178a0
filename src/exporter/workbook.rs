// ==========================================
// 销售对账系统 - 工作簿导出器
// ==========================================
// 职责: 主工作簿（台账 + 汇总）与第二工作簿（六张子表）
// 红线: 两个工作簿全部渲染成功后才落盘,任一失败不留下任何输出文件
// ==========================================

use crate::domain::columns::ledger as col;
use crate::domain::types::DocumentKind;
use crate::engine::error::ReconResult;
use crate::engine::orchestrator::RunOutput;
use crate::engine::resolver::ResolvedSections;
use crate::exporter::sheets;
use rust_xlsxwriter::{Format, Workbook};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};
use tracing::{debug, info, instrument, warn};

pub const LEDGER_SHEET: &str = "Actualizado";
pub const BRANCH_SHEET: &str = "total ventas";
pub const MARGIN_SHEET: &str = "vendido";

/// 第二工作簿默认文件名（与主工作簿同目录）
pub const DEFAULT_SECONDARY_NAME: &str = "output_file2.xlsx";

/// 第二工作簿的子表顺序
pub const SECONDARY_SHEET_ORDER: [DocumentKind; 6] = [
    DocumentKind::Receipt,
    DocumentKind::CreditNote,
    DocumentKind::DebitNote,
    DocumentKind::Invoice,
    DocumentKind::ExportInvoice,
    DocumentKind::DispatchGuide,
];

// ==========================================
// OutputPaths - 输出路径
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub primary: PathBuf,
    pub secondary: PathBuf,
}

impl OutputPaths {
    pub fn new(primary: impl Into<PathBuf>, secondary: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }

    /// 第二工作簿放在主工作簿旁边
    pub fn beside(primary: impl Into<PathBuf>) -> Self {
        let primary = primary.into();
        let secondary = primary
            .parent()
            .map(|dir| dir.join(DEFAULT_SECONDARY_NAME))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SECONDARY_NAME));
        Self { primary, secondary }
    }
}

// ==========================================
// WorkbookExporter - 工作簿导出器
// ==========================================
#[derive(Debug, Default)]
pub struct WorkbookExporter;

impl WorkbookExporter {
    pub fn new() -> Self {
        Self
    }

    /// 渲染主工作簿: Actualizado / total ventas / vendido
    pub fn render_primary(&self, output: &RunOutput) -> ReconResult<Vec<u8>> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();
        let report = &output.report;

        let sheet = workbook.add_worksheet().set_name(LEDGER_SHEET)?;
        sheets::write_ledger(sheet, &output.ledger, &bold)?;

        let sheet = workbook.add_worksheet().set_name(BRANCH_SHEET)?;
        sheets::write_branch_sheet(
            sheet,
            &report.by_branch,
            &report.top_products,
            &report.bottom_products,
            &bold,
        )?;

        let sheet = workbook.add_worksheet().set_name(MARGIN_SHEET)?;
        sheets::write_margin_sheet(
            sheet,
            &[
                (col::PRODUCT_TYPE, report.by_product_type.as_slice()),
                (col::MARKETPLACE, report.by_marketplace.as_slice()),
                (col::PRODUCT_TYPE, report.product_type_below_threshold.as_slice()),
                (col::MARKETPLACE, report.marketplace_below_threshold.as_slice()),
            ],
            &bold,
        )?;

        Ok(workbook.save_to_buffer()?)
    }

    /// 渲染第二工作簿: 每类单据一张工作表（缺失的分段输出空表头）
    pub fn render_secondary(&self, sections: &ResolvedSections) -> ReconResult<Vec<u8>> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();

        for kind in SECONDARY_SHEET_ORDER {
            let sheet = workbook.add_worksheet().set_name(kind.sheet_name())?;
            if let Some(table) = sections.get(kind) {
                sheets::write_section(sheet, table, &bold)?;
            }
        }

        Ok(workbook.save_to_buffer()?)
    }

    /// 渲染并原子写出两个工作簿
    #[instrument(skip_all, fields(primary = %paths.primary.display()))]
    pub fn export(&self, output: &RunOutput, paths: &OutputPaths) -> ReconResult<()> {
        let primary = self.render_primary(output)?;
        let secondary = self.render_secondary(&output.sections)?;
        debug!(
            primary_bytes = primary.len(),
            secondary_bytes = secondary.len(),
            "工作簿渲染完成"
        );

        let primary_tmp = stage(&paths.primary, &primary)?;
        let secondary_tmp = stage(&paths.secondary, &secondary)?;

        // 主工作簿已存在时先移到备份,任一落盘失败都还原
        let backup = set_aside(&paths.primary)?;
        if let Err(err) = primary_tmp.persist(&paths.primary) {
            restore(&paths.primary, backup);
            return Err(err.into());
        }
        if let Err(err) = secondary_tmp.persist(&paths.secondary) {
            restore(&paths.primary, backup);
            return Err(err.into());
        }

        info!(
            primary = %paths.primary.display(),
            secondary = %paths.secondary.display(),
            "工作簿已写出"
        );
        Ok(())
    }
}

fn staging_dir(dest: &Path) -> PathBuf {
    match dest.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// 在目标目录中写入临时文件,待 persist 时原子改名
fn stage(dest: &Path, bytes: &[u8]) -> ReconResult<NamedTempFile> {
    let mut tmp = NamedTempFile::new_in(staging_dir(dest))?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    Ok(tmp)
}

/// 把已存在的目标文件改名为同目录下的临时备份（drop 时删除）
fn set_aside(dest: &Path) -> ReconResult<Option<TempPath>> {
    if !dest.exists() {
        return Ok(None);
    }
    let backup = NamedTempFile::new_in(staging_dir(dest))?.into_temp_path();
    fs::rename(dest, &backup)?;
    Ok(Some(backup))
}

/// 还原备份;没有备份时删除新写入的文件
fn restore(dest: &Path, backup: Option<TempPath>) {
    let result = match backup {
        Some(backup) => fs::rename(&backup, dest),
        None => fs::remove_file(dest),
    };
    if let Err(err) = result {
        warn!(path = %dest.display(), error = %err, "主工作簿还原失败");
    }
}
