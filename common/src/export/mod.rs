//! エクスポート要求の組み立てとファイル名規則（CLI/WASM共通）

#[cfg(feature = "excel")]
pub mod excel_core;

use crate::types::{Lot, LotId};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// 出力する内容の選択
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    pub rawdata: bool,
    pub summary: bool,
    pub overkill: bool,
    pub underkill: bool,
}

impl ExportOptions {
    pub const KEYS: [&'static str; 4] = ["rawdata", "summary", "overkill", "underkill"];

    /// キー名から生成（未知のキーはエラー）
    pub fn from_keys<S: AsRef<str>>(keys: &[S]) -> Result<Self, String> {
        let mut options = Self::default();
        for key in keys {
            options.toggle(key.as_ref())?;
        }
        Ok(options)
    }

    pub fn toggle(&mut self, key: &str) -> Result<(), String> {
        let slot = match key.to_lowercase().as_str() {
            "rawdata" | "raw" => &mut self.rawdata,
            "summary" => &mut self.summary,
            "overkill" => &mut self.overkill,
            "underkill" => &mut self.underkill,
            _ => {
                return Err(format!(
                    "Unknown export option: {}. Use rawdata, summary, overkill, or underkill",
                    key
                ))
            }
        };
        *slot = !*slot;
        Ok(())
    }

    pub fn get(&self, key: &str) -> bool {
        match key {
            "rawdata" => self.rawdata,
            "summary" => self.summary,
            "overkill" => self.overkill,
            "underkill" => self.underkill,
            _ => false,
        }
    }

    /// サマリのみ（単一のxlsxが返る）
    pub fn is_summary_only(&self) -> bool {
        self.summary && !self.rawdata && !self.overkill && !self.underkill
    }

    pub fn is_empty(&self) -> bool {
        !(self.rawdata || self.summary || self.overkill || self.underkill)
    }
}

/// 作業リストの1ロット（送信用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportLot {
    pub id: LotId,
    pub lot: String,
    pub version: Option<String>,
    pub itemcode: Option<String>,
}

impl From<&Lot> for ExportLot {
    fn from(lot: &Lot) -> Self {
        Self {
            id: lot.id,
            lot: lot.lot.clone(),
            version: lot.version.clone(),
            itemcode: lot.itemcode.clone(),
        }
    }
}

/// `POST /api/pms/download-zip` のリクエストボディ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub test_list: Vec<ExportLot>,
    pub excel_options: ExportOptions,
}

impl ExportRequest {
    pub fn new(lots: &[Lot], options: ExportOptions) -> Self {
        Self {
            test_list: lots.iter().map(ExportLot::from).collect(),
            excel_options: options,
        }
    }

    /// 進捗表示のラベル
    pub fn label(&self) -> String {
        format!("Downloading {} Lots...", self.test_list.len())
    }
}

/// 応答の種類（Content-Type から判定）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Zip,
    Xlsx,
}

pub const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

impl ExportKind {
    pub fn from_content_type(content_type: Option<&str>) -> Option<Self> {
        let ct = content_type?.split(';').next()?.trim().to_lowercase();
        if ct == XLSX_CONTENT_TYPE || ct.ends_with("spreadsheetml.sheet") {
            Some(ExportKind::Xlsx)
        } else if ct.contains("zip") {
            Some(ExportKind::Zip)
        } else {
            None
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportKind::Zip => ZIP_CONTENT_TYPE,
            ExportKind::Xlsx => XLSX_CONTENT_TYPE,
        }
    }
}

/// `YYYY-MM-DD`
pub fn format_date(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// 保存ファイル名
///
/// サマリのみなら `SUMMARY_{日付}.xlsx`、それ以外は `AI_RESULT_{日付}.zip`。
pub fn export_filename(options: &ExportOptions, date: NaiveDate) -> String {
    if options.is_summary_only() {
        format!("SUMMARY_{}.xlsx", format_date(date))
    } else {
        format!("AI_RESULT_{}.zip", format_date(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_year() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    }

    #[test]
    fn test_summary_only_filename() {
        let options = ExportOptions { summary: true, ..Default::default() };
        assert_eq!(export_filename(&options, new_year()), "SUMMARY_2026-01-01.xlsx");
    }

    #[test]
    fn test_other_combinations_are_zip() {
        for bits in 0u8..16 {
            let options = ExportOptions {
                rawdata: bits & 1 != 0,
                summary: bits & 2 != 0,
                overkill: bits & 4 != 0,
                underkill: bits & 8 != 0,
            };
            if bits == 2 {
                continue;
            }
            assert_eq!(
                export_filename(&options, new_year()),
                "AI_RESULT_2026-01-01.zip",
                "options: {:?}",
                options
            );
        }
    }

    #[test]
    fn test_request_wire_format() {
        let lots = vec![Lot {
            id: 7,
            lot: "L1".into(),
            version: Some("V2".into()),
            itemcode: Some("I1".into()),
            machine: Some("M1".into()),
            ..Default::default()
        }];
        let options = ExportOptions::from_keys(&["summary", "rawdata"]).unwrap();
        let request = ExportRequest::new(&lots, options);
        assert_eq!(request.label(), "Downloading 1 Lots...");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "testList": [{"id": 7, "lot": "L1", "version": "V2", "itemcode": "I1"}],
                "excelOptions": {"rawdata": true, "summary": true, "overkill": false, "underkill": false}
            })
        );
    }

    #[test]
    fn test_unknown_option_key() {
        assert!(ExportOptions::from_keys(&["pdf"]).is_err());
    }

    #[test]
    fn test_kind_from_content_type() {
        assert_eq!(ExportKind::from_content_type(Some("application/zip")), Some(ExportKind::Zip));
        assert_eq!(
            ExportKind::from_content_type(Some(
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet; charset=binary"
            )),
            Some(ExportKind::Xlsx)
        );
        assert_eq!(ExportKind::from_content_type(Some("text/html")), None);
        assert_eq!(ExportKind::from_content_type(None), None);
    }
}
