//! 検査データの型定義
//!
//! CLIとWeb(WASM)で共有されるバックエンドのワイヤ型:
//! - Lot: 検索結果の1ロット（テスト単位）
//! - LotSummary: 詳細画面のサマリ（件数・率・Top10）
//! - MultiSummary: 分析チャート用のロット集計
//! - RawRecord: 詳細テーブルの1行（ポイント/ユニット）

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// テストID（バックエンドの test_id）
pub type LotId = i64;

/// セレクトボックスの選択肢
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self { label: value.clone(), value }
    }
}

/// 検索結果のロット
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lot {
    pub id: LotId,
    pub lot: String,
    pub itemcode: Option<String>,
    pub version: Option<String>,
    pub customer: Option<String>,
    pub machine: Option<String>,
    /// ソーター番号（bundle_no）
    pub trial: Option<String>,
    /// AI検査日時
    pub ai_dt: Option<String>,
}

impl Lot {
    /// 検査日（ai_dt の先頭10文字）
    pub fn inspection_date(&self) -> &str {
        match self.ai_dt.as_deref() {
            Some(dt) => dt.get(..10).unwrap_or(dt),
            None => "",
        }
    }
}

/// 詳細画面のヘッダ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LotHeader {
    pub test_id: LotId,
    pub lot: String,
    pub machine: Option<String>,
    pub customer: Option<String>,
    pub itemcode: Option<String>,
    pub version: Option<String>,
    pub ai_date_time: Option<String>,
}

/// サマリテーブルの1行
///
/// セクションによってキー列が `type` / `value` / `desc` に分かれる。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryRow {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    pub count: u64,
    /// "12.34%" 形式（gtSummaryのUnderKillはppm値）
    pub rate: String,
}

impl SummaryRow {
    /// 表示キー（type → value → desc の順）
    pub fn key(&self) -> &str {
        self.kind
            .as_deref()
            .or(self.value.as_deref())
            .or(self.desc.as_deref())
            .unwrap_or("")
    }

    pub fn is_total(&self) -> bool {
        self.key() == "TOTAL"
    }
}

/// 単一ロットのサマリ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LotSummary {
    pub result_summary: Vec<SummaryRow>,
    pub result_unit_summary: Vec<SummaryRow>,
    #[serde(rename = "defectTop10")]
    pub defect_top10: Vec<SummaryRow>,
    #[serde(rename = "unkDefectTop10")]
    pub unk_defect_top10: Vec<SummaryRow>,
    #[serde(rename = "ngDefectTop10")]
    pub ng_defect_top10: Vec<SummaryRow>,
    pub unk_result_distribution: Vec<SummaryRow>,
    /// UNK結果カテゴリ → 不良内訳
    pub unk_detail_map: BTreeMap<String, Vec<SummaryRow>>,
    pub gt_summary: Vec<SummaryRow>,
}

/// 分析チャート用のロット集計（/summary/multi の値）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiSummary {
    pub lot: String,
    pub machine: Option<String>,
    pub customer: Option<String>,
    pub itemcode: Option<String>,
    pub version: Option<String>,
    pub ai_date_time: Option<String>,

    pub total: u64,
    pub ok_cnt: u64,
    pub ng_cnt: u64,
    pub unk_cnt: u64,
    pub ics_cnt: u64,

    pub ok_rate: f64,
    pub ng_rate: f64,
    pub unk_rate: f64,

    pub unit_total: u64,
    pub unit_ok_cnt: u64,
    pub unit_ng_cnt: u64,
    pub unit_unk_cnt: u64,
    pub unit_ics_cnt: u64,

    pub unit_ok_rate: f64,
    pub unit_ng_rate: f64,
    pub unit_unk_rate: f64,

    pub underk_cnt: u64,
    pub underk_ppm: f64,

    pub overk_cnt: u64,
    pub overk_rate: f64,
}

/// 詳細テーブルの1行
///
/// バックエンドは文字列・数値・null を混在して返すため `Value` で保持する。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    pub strip_id: Value,
    pub defect_code: Value,
    pub afvi_ai_keyin: Value,
    pub afvi_ai_defect: Value,
    pub afvi_false_defect: Value,
    pub afvi_clf_defect: Value,
    pub afvi_ai_longest: Value,
    pub afvi_ai_gv: Value,
    pub ivs_keyin1: Value,
    pub image_path: Value,

    // ガーバー描画用（含まれない場合もある）
    #[serde(skip_serializing_if = "Value::is_null")]
    pub file_name: Value,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub rel_x_unit: Value,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub rel_y_unit: Value,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub defect_width: Value,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub defect_height: Value,
}

impl RawRecord {
    /// 列IDで値を取得
    pub fn get(&self, column: &str) -> Option<&Value> {
        let v = match column {
            "strip_id" => &self.strip_id,
            "defect_code" => &self.defect_code,
            "afvi_ai_keyin" => &self.afvi_ai_keyin,
            "afvi_ai_defect" => &self.afvi_ai_defect,
            "afvi_false_defect" => &self.afvi_false_defect,
            "afvi_clf_defect" => &self.afvi_clf_defect,
            "afvi_ai_longest" => &self.afvi_ai_longest,
            "afvi_ai_gv" => &self.afvi_ai_gv,
            "ivs_keyin1" => &self.ivs_keyin1,
            "image_path" => &self.image_path,
            "file_name" => &self.file_name,
            "rel_x_unit" => &self.rel_x_unit,
            "rel_y_unit" => &self.rel_y_unit,
            "defect_width" => &self.defect_width,
            "defect_height" => &self.defect_height,
            _ => return None,
        };
        Some(v)
    }

    /// 列の表示文字列（null は空文字）
    pub fn cell_text(&self, column: &str) -> String {
        self.get(column).map(value_text).unwrap_or_default()
    }

    pub fn image_path(&self) -> Option<&str> {
        self.image_path.as_str().filter(|s| !s.is_empty())
    }
}

/// JSON値を表示文字列に変換
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// /data のレスポンス
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataPage {
    pub mode: String,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub has_more: bool,
    pub rows: Vec<RawRecord>,
}

/// 列ID → ユニーク値の一覧
pub type UniqueValues = BTreeMap<String, Vec<String>>;

/// テーブルに表示する列
pub const COLUMNS_TO_SHOW: [&str; 10] = [
    "strip_id",
    "defect_code",
    "afvi_ai_keyin",
    "afvi_ai_defect",
    "afvi_false_defect",
    "afvi_clf_defect",
    "afvi_ai_longest",
    "afvi_ai_gv",
    "ivs_keyin1",
    "image_path",
];

/// フィルタ可能な列
pub const FILTERABLE_COLUMNS: [&str; 7] = [
    "strip_id",
    "afvi_ai_keyin",
    "afvi_false_defect",
    "afvi_ai_defect",
    "defect_code",
    "ivs_keyin1",
    "afvi_clf_defect",
];

/// 列ヘッダの表示名
pub fn column_label(column: &str) -> String {
    match column {
        "strip_id" => "Strip".into(),
        "defect_code" => "Code".into(),
        "afvi_ai_keyin" => "AI KeyIn".into(),
        "afvi_ai_defect" => "AI Defect".into(),
        "afvi_ai_gv" => "GV".into(),
        "afvi_ai_longest" => "Longest".into(),
        "afvi_clf_defect" => "CLF".into(),
        "afvi_false_defect" => "FALSE".into(),
        "ivs_keyin1" => "GT".into(),
        "image_path" => "IMG".into(),
        other => other.to_uppercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lot_deserialize_with_nulls() {
        let lot: Lot = serde_json::from_value(json!({
            "id": 12,
            "lot": "L1",
            "itemcode": "ABC",
            "version": null,
            "customer": "CUST",
            "machine": "M01V1",
            "trial": "S01-C1",
            "ai_dt": "2026-01-01T10:20:30"
        }))
        .unwrap();
        assert_eq!(lot.id, 12);
        assert_eq!(lot.version, None);
        assert_eq!(lot.inspection_date(), "2026-01-01");
    }

    #[test]
    fn test_summary_row_key_order() {
        let row: SummaryRow =
            serde_json::from_value(json!({"type": "OK", "count": 3, "rate": "30.00%"})).unwrap();
        assert_eq!(row.key(), "OK");

        let row: SummaryRow =
            serde_json::from_value(json!({"desc": "TOTAL", "count": 3, "rate": "100%"})).unwrap();
        assert!(row.is_total());
    }

    #[test]
    fn test_lot_summary_camel_case() {
        let summary: LotSummary = serde_json::from_value(json!({
            "resultSummary": [{"type": "OK", "count": 1, "rate": "100.00%"}],
            "defectTop10": [{"value": "SCRATCH", "count": 1, "rate": "100.00%"}],
            "unkDetailMap": {"AI_UNKNOWN_X": [{"value": "DENT", "count": 2, "rate": "50.00%"}]}
        }))
        .unwrap();
        assert_eq!(summary.result_summary.len(), 1);
        assert_eq!(summary.defect_top10[0].key(), "SCRATCH");
        assert_eq!(summary.unk_detail_map["AI_UNKNOWN_X"][0].count, 2);
        assert!(summary.gt_summary.is_empty());
    }

    #[test]
    fn test_raw_record_cell_text() {
        let row: RawRecord = serde_json::from_value(json!({
            "strip_id": "S-1",
            "afvi_ai_gv": 12.5,
            "ivs_keyin1": null
        }))
        .unwrap();
        assert_eq!(row.cell_text("strip_id"), "S-1");
        assert_eq!(row.cell_text("afvi_ai_gv"), "12.5");
        assert_eq!(row.cell_text("ivs_keyin1"), "");
        assert_eq!(row.cell_text("unknown"), "");
    }
}
