//! ローカルでのExcel出力
//!
//! 分析チャートの集計表、詳細テーブルの現在ページ、作業リストを書き出す。

use crate::error::{PcbInspectError, Result};
use pcb_inspect_common::chart::ChartSpec;
use pcb_inspect_common::export::excel_core;
use pcb_inspect_common::types::COLUMNS_TO_SHOW;
use pcb_inspect_common::{GroupBy, Lot, RawRecord};
use std::path::Path;
use tracing::info;

/// 作業リストの列
pub const LOT_COLUMNS: [&str; 8] = ["id", "lot", "itemcode", "version", "customer", "machine", "trial", "ai_dt"];

fn write(path: &Path, buffer: Vec<u8>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, buffer)?;
    info!(path = %path.display(), "xlsx saved");
    Ok(())
}

fn excel_error(e: pcb_inspect_common::Error) -> PcbInspectError {
    PcbInspectError::ExcelGeneration(e.to_string())
}

pub fn write_chart(spec: &ChartSpec, group_by: GroupBy, path: &Path) -> Result<()> {
    let buffer = excel_core::generate_chart_buffer(spec, &group_by.as_str().to_uppercase()).map_err(excel_error)?;
    write(path, buffer)
}

pub fn write_rows(rows: &[RawRecord], path: &Path) -> Result<()> {
    let buffer = excel_core::generate_table_buffer("Detail", &COLUMNS_TO_SHOW, rows).map_err(excel_error)?;
    write(path, buffer)
}

pub fn write_lots(lots: &[Lot], path: &Path) -> Result<()> {
    let buffer = excel_core::generate_table_buffer("Lots", &LOT_COLUMNS, lots).map_err(excel_error)?;
    write(path, buffer)
}
