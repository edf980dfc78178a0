// ==========================================
// 销售对账系统 - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析 → RawGrid
// 支持: Excel (.xlsx/.xlsm/.xls/.ods) / CSV (.csv) / HTML 表格 (.html/.htm)
// 注: 后台导出的成本 ".xls" 实为 HTML 表格,按内容嗅探
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::table::RawGrid;
use calamine::{open_workbook_auto, Data, DataType, Reader};
use chrono::{NaiveDateTime, Timelike};
use csv::ReaderBuilder;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

// ==========================================
// FileParser Trait
// ==========================================
pub trait FileParser {
    /// 解析文件为原始网格（保留物理行号,包括空行）
    fn parse_to_grid(&self, file_path: &Path) -> ImportResult<RawGrid>;
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ImportError::FileNotFound(path.display().to_string()))
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_grid(&self, file_path: &Path) -> ImportResult<RawGrid> {
        ensure_exists(file_path)?;

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false) // 表头位置由 HeaderRow 决定
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(|v| v.trim().to_string()).collect());
        }

        Ok(RawGrid::new(rows))
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_to_grid(&self, file_path: &Path) -> ImportResult<RawGrid> {
        ensure_exists(file_path)?;

        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        // Range 从第一个非空单元格开始,补齐前导空行/空列以保留物理位置
        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        let mut rows: Vec<Vec<String>> = (0..start_row).map(|_| Vec::new()).collect();
        for data_row in range.rows() {
            let mut cells = vec![String::new(); start_col as usize];
            cells.extend(data_row.iter().map(cell_to_string));
            rows.push(cells);
        }

        Ok(RawGrid::new(rows))
    }
}

/// 单元格 → 文本
///
/// - 整数值浮点去掉小数部分（1001.0 → "1001"）
/// - 日期单元格输出 YYYY-MM-DD（含时间时追加 HH:MM:SS）
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(format_datetime)
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string().trim().to_string(),
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn format_datetime(dt: NaiveDateTime) -> String {
    if dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

// ==========================================
// HTML 表格 Parser 实现
// ==========================================
pub struct HtmlTableParser;

fn table_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("table").expect("invalid table selector"))
}

fn tr_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("tr").expect("invalid tr selector"))
}

fn ws_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("invalid whitespace regex"))
}

impl HtmlTableParser {
    /// 读取第一个 <table> 的所有行（th/td）
    pub fn parse_html(&self, html: &str) -> ImportResult<RawGrid> {
        let doc = Html::parse_document(html);
        let table = doc
            .select(table_selector())
            .next()
            .ok_or_else(|| ImportError::HtmlParseError("未找到 <table> 元素".to_string()))?;

        let rows = table
            .select(tr_selector())
            .map(|tr| {
                tr.children()
                    .filter_map(ElementRef::wrap)
                    .filter(|cell| {
                        let name = cell.value().name();
                        name.eq_ignore_ascii_case("td") || name.eq_ignore_ascii_case("th")
                    })
                    .map(|cell| {
                        let text = cell.text().collect::<Vec<_>>().join(" ");
                        ws_re().replace_all(text.trim(), " ").to_string()
                    })
                    .collect()
            })
            .collect();

        Ok(RawGrid::new(rows))
    }
}

impl FileParser for HtmlTableParser {
    fn parse_to_grid(&self, file_path: &Path) -> ImportResult<RawGrid> {
        ensure_exists(file_path)?;
        let bytes = std::fs::read(file_path)?;
        self.parse_html(&String::from_utf8_lossy(&bytes))
    }
}

/// 内容是否为 HTML（跳过 BOM 与空白后以 '<' 开头）
fn looks_like_html(path: &Path) -> ImportResult<bool> {
    let mut head = [0u8; 512];
    let n = File::open(path)?.read(&mut head)?;
    let text = String::from_utf8_lossy(&head[..n]);
    Ok(text.trim_start_matches('\u{feff}').trim_start().starts_with('<'))
}

// ==========================================
// 通用文件解析器（根据扩展名 + 内容自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<RawGrid> {
        let path = file_path.as_ref();
        ensure_exists(path)?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse_to_grid(path),
            "html" | "htm" => HtmlTableParser.parse_to_grid(path),
            "xls" if looks_like_html(path)? => HtmlTableParser.parse_to_grid(path),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => ExcelParser.parse_to_grid(path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_csv_parser_keeps_physical_rows() {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(temp_file, "Reporte,,").unwrap();
        writeln!(temp_file, ",,").unwrap();
        writeln!(temp_file, "SKU,Cantidad,Sucursal").unwrap();
        writeln!(temp_file, " A1 ,2,Casa Matriz").unwrap();

        let grid = UniversalFileParser.parse(temp_file.path()).unwrap();
        assert_eq!(grid.len(), 4);
        assert_eq!(grid.rows[2][0], "SKU");
        assert_eq!(grid.rows[3][0], "A1");
    }

    #[test]
    fn test_parser_file_not_found() {
        let result = UniversalFileParser.parse(Path::new("no_existe.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let temp_file = Builder::new().suffix(".txt").tempfile().unwrap();
        let result = UniversalFileParser.parse(temp_file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_xls_with_html_body_is_parsed_as_table() {
        let mut temp_file = Builder::new().suffix(".xls").tempfile().unwrap();
        write!(
            temp_file,
            "<html><body><table>\
             <tr><th>SKU</th><th>Costo Neto</th></tr>\
             <tr><td> AB-1 </td><td>100</td></tr>\
             <tr><td>AB-2</td><td>2,500</td></tr>\
             </table></body></html>"
        )
        .unwrap();

        let grid = UniversalFileParser.parse(temp_file.path()).unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid.rows[0], vec!["SKU", "Costo Neto"]);
        assert_eq!(grid.rows[1], vec!["AB-1", "100"]);
    }

    #[test]
    fn test_html_without_table_fails() {
        let err = HtmlTableParser.parse_html("<html><p>vacío</p></html>").unwrap_err();
        assert!(matches!(err, ImportError::HtmlParseError(_)));
    }

    #[test]
    fn test_format_float_drops_integral_fraction() {
        assert_eq!(format_float(1001.0), "1001");
        assert_eq!(format_float(12.5), "12.5");
    }
}
