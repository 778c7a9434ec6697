//! Excel生成（共通ライブラリ）
//!
//! 分析チャートの集計表と詳細テーブルのページをxlsxに書き出す

use crate::chart::ChartSpec;
use crate::error::Result;
use crate::types::{column_label, Lot, RawRecord};
use rust_xlsxwriter::*;

const HEADER_BG: u32 = 0xF5F5F5;
const BORDER: u32 = 0xCCCCCC;

/// シートの1行として書き出せるデータ
pub trait SheetRow {
    fn cell(&self, column: &str) -> String;
}

impl SheetRow for RawRecord {
    fn cell(&self, column: &str) -> String {
        self.cell_text(column)
    }
}

impl SheetRow for Lot {
    fn cell(&self, column: &str) -> String {
        let v = match column {
            "id" => return self.id.to_string(),
            "lot" => Some(self.lot.as_str()),
            "itemcode" => self.itemcode.as_deref(),
            "version" => self.version.as_deref(),
            "customer" => self.customer.as_deref(),
            "machine" => self.machine.as_deref(),
            "trial" => self.trial.as_deref(),
            "ai_dt" => Some(self.inspection_date()),
            _ => None,
        };
        v.unwrap_or_default().to_string()
    }
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_font_size(10.0)
        .set_font_color(Color::RGB(0x555555))
        .set_background_color(Color::RGB(HEADER_BG))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xAAAAAA))
}

fn value_format() -> Format {
    Format::new()
        .set_font_size(10.0)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(BORDER))
}

/// 表形式のシートをバッファに生成
///
/// 数値として読める値は数値セル、それ以外は文字列セルで書く。
pub fn generate_table_buffer<T: SheetRow>(
    sheet_name: &str,
    columns: &[&str],
    rows: &[T],
) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    write_table(workbook.add_worksheet(), sheet_name, columns, rows)?;
    Ok(workbook.save_to_buffer()?)
}

fn write_table<T: SheetRow>(
    worksheet: &mut Worksheet,
    sheet_name: &str,
    columns: &[&str],
    rows: &[T],
) -> Result<()> {
    let header = header_format();
    let value = value_format();

    worksheet.set_name(sheet_name)?;
    for (c, column) in columns.iter().enumerate() {
        let c = c as u16;
        worksheet.write_string_with_format(0, c, column_label(column), &header)?;
        worksheet.set_column_width(c, 14)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    for (r, row) in rows.iter().enumerate() {
        let r = r as u32 + 1;
        for (c, column) in columns.iter().enumerate() {
            let text = row.cell(column);
            match text.parse::<f64>() {
                Ok(n) if !text.is_empty() => worksheet.write_number_with_format(r, c as u16, n, &value)?,
                _ => worksheet.write_string_with_format(r, c as u16, &text, &value)?,
            };
        }
    }
    Ok(())
}

/// 分析チャートの集計表（グループ × 系列）を生成
pub fn generate_chart_buffer(spec: &ChartSpec, group_title: &str) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = header_format();
    let value = value_format();
    let percent = value_format().set_num_format("0.0");
    let count = value_format().set_num_format("#,##0");

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Analysis")?;
    worksheet.set_column_width(0, 20)?;

    worksheet.write_string_with_format(0, 0, group_title, &header)?;
    worksheet.write_string_with_format(0, 1, "Lots", &header)?;
    for (i, dataset) in spec.datasets.iter().enumerate() {
        let c = i as u16 + 2;
        worksheet.write_string_with_format(0, c, dataset.label, &header)?;
        worksheet.set_column_width(c, 16)?;
    }

    let counts: [(&str, fn(&crate::chart::GroupedPoint) -> u64); 5] = [
        ("OK CNT", |g| g.ok_cnt),
        ("NG CNT", |g| g.ng_cnt),
        ("UNK CNT", |g| g.unk_cnt),
        ("OVERKILL CNT", |g| g.overk_cnt),
        ("UNDERKILL CNT", |g| g.underk_cnt),
    ];
    let count_col = spec.datasets.len() as u16 + 2;
    for (i, (title, _)) in counts.iter().enumerate() {
        worksheet.write_string_with_format(0, count_col + i as u16, *title, &header)?;
        worksheet.set_column_width(count_col + i as u16, 14)?;
    }

    for (r, group) in spec.groups.iter().enumerate() {
        let row = r as u32 + 1;
        worksheet.write_string_with_format(row, 0, &group.key, &value)?;
        worksheet.write_number_with_format(row, 1, group.lots as f64, &count)?;
        for (i, dataset) in spec.datasets.iter().enumerate() {
            let v = dataset.data.get(r).copied().unwrap_or_default();
            worksheet.write_number_with_format(row, i as u16 + 2, v, &percent)?;
        }
        for (i, (_, get)) in counts.iter().enumerate() {
            worksheet.write_number_with_format(row, count_col + i as u16, get(group) as f64, &count)?;
        }
    }
    worksheet.set_freeze_panes(1, 1)?;

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{AnalysisOptions, GraphType, GroupBy, Metric};
    use crate::types::{MultiSummary, COLUMNS_TO_SHOW};
    use serde_json::json;

    fn is_xlsx(buf: &[u8]) -> bool {
        buf.starts_with(b"PK")
    }

    #[test]
    fn test_detail_table_buffer() {
        let rows: Vec<RawRecord> = vec![
            serde_json::from_value(json!({"strip_id": 1, "defect_code": "D01", "afvi_ai_gv": 12.5})).unwrap(),
            serde_json::from_value(json!({"strip_id": "2", "defect_code": null})).unwrap(),
        ];
        let buf = generate_table_buffer("Raw Data", &COLUMNS_TO_SHOW, &rows).unwrap();
        assert!(is_xlsx(&buf));
    }

    #[test]
    fn test_lot_cells() {
        let lot = Lot {
            id: 3,
            lot: "L1".into(),
            ai_dt: Some("2026-01-01 10:00:00".into()),
            ..Default::default()
        };
        assert_eq!(lot.cell("id"), "3");
        assert_eq!(lot.cell("ai_dt"), "2026-01-01");
        assert_eq!(lot.cell("customer"), "");
    }

    #[test]
    fn test_chart_buffer() {
        let data = vec![MultiSummary { lot: "L1".into(), ok_rate: 0.5, ..Default::default() }];
        let options = AnalysisOptions::from_metrics(&[Metric::Rate]).unwrap();
        let spec = ChartSpec::build(&data, GroupBy::Lot, &options, GraphType::Bar);
        let buf = generate_chart_buffer(&spec, GroupBy::Lot.label()).unwrap();
        assert!(is_xlsx(&buf));
    }
}
