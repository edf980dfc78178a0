// ==========================================
// 销售对账系统 - 导出层
// ==========================================
// 职责: 将 RunOutput 渲染为两个 xlsx 工作簿并原子写出
// ==========================================

pub mod sheets;
pub mod workbook;

pub use workbook::{OutputPaths, WorkbookExporter};
