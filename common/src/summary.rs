//! 詳細サマリのセクション定義
//!
//! 選択中のセクションを先頭に並べ、チャートには TOTAL 行を含めない。

use crate::types::{LotSummary, SummaryRow};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    #[default]
    Rate,
    UnitRate,
    Defect,
    UnkResult,
    UnkDefect,
    NgDefect,
    Gt,
}

/// 表示順
pub const SECTION_ORDER: [Section; 7] = [
    Section::Rate,
    Section::UnitRate,
    Section::Defect,
    Section::UnkResult,
    Section::UnkDefect,
    Section::NgDefect,
    Section::Gt,
];

/// 棒グラフの色（rate セクション以外は順に使う）
pub const PALETTE: [&str; 10] = [
    "#7da87a", "#d8a15c", "#c76a6a", "#8aa1b1", "#b59bc9", "#a7c4d6", "#b7a29b", "#c5b18a", "#b88f8f",
    "#c8cccf",
];

impl Section {
    pub fn title(&self) -> &'static str {
        match self {
            Section::Rate => "Rate (Point)",
            Section::UnitRate => "Rate (Unit)",
            Section::Defect => "Defect Top 10",
            Section::UnkResult => "UNK Result Distribution",
            Section::UnkDefect => "UNK Defect Top 10",
            Section::NgDefect => "NG Defect Top 10",
            Section::Gt => "GT Summary",
        }
    }

    /// 列見出し（キー / 件数 / 率）
    pub fn headers(&self) -> [&'static str; 3] {
        match self {
            Section::Rate | Section::UnitRate => ["Type", "Count", "Rate (Total %)"],
            Section::Defect => ["Defect", "Count", "Rate (Total %)"],
            Section::UnkResult => ["Result", "Count", "Rate (UNK %)"],
            Section::UnkDefect => ["Defect", "Count", "Rate (UNK %)"],
            Section::NgDefect => ["Defect", "Count", "Rate (NG %)"],
            Section::Gt => ["Type", "Count", "Rate/PPM"],
        }
    }

    pub fn rows<'a>(&self, summary: &'a LotSummary) -> &'a [SummaryRow] {
        match self {
            Section::Rate => &summary.result_summary,
            Section::UnitRate => &summary.result_unit_summary,
            Section::Defect => &summary.defect_top10,
            Section::UnkResult => &summary.unk_result_distribution,
            Section::UnkDefect => &summary.unk_defect_top10,
            Section::NgDefect => &summary.ng_defect_top10,
            Section::Gt => &summary.gt_summary,
        }
    }

    /// 棒の色
    pub fn bar_color(&self, row: &SummaryRow, index: usize) -> &'static str {
        if *self == Section::Rate {
            match row.key() {
                "OK" => return crate::chart::palette::RATE_OK,
                "UNK" => return crate::chart::palette::RATE_UNK,
                "NG" => return crate::chart::palette::RATE_NG,
                _ => return PALETTE[0],
            }
        }
        PALETTE[index % PALETTE.len()]
    }
}

impl std::str::FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "rate" => Ok(Section::Rate),
            "unitrate" => Ok(Section::UnitRate),
            "defect" => Ok(Section::Defect),
            "unkresult" => Ok(Section::UnkResult),
            "unkdefect" => Ok(Section::UnkDefect),
            "ngdefect" => Ok(Section::NgDefect),
            "gt" => Ok(Section::Gt),
            _ => Err(format!("Unknown section: {}", s)),
        }
    }
}

/// 選択セクションを先頭にした並び
pub fn ordered_sections(selected: Section) -> Vec<Section> {
    std::iter::once(selected)
        .chain(SECTION_ORDER.into_iter().filter(|s| *s != selected))
        .collect()
}

/// チャート用の行（TOTAL を除く）
pub fn chart_rows(summary: &LotSummary, section: Section) -> Vec<&SummaryRow> {
    section.rows(summary).iter().filter(|r| !r.is_total()).collect()
}

/// "12.34%" → 12.34（数値でなければ 0）
pub fn parse_rate(rate: &str) -> f64 {
    rate.trim().trim_end_matches('%').trim().parse().unwrap_or(0.0)
}

/// UNK結果カテゴリの不良内訳
pub fn unk_breakdown<'a>(summary: &'a LotSummary, category: &str) -> &'a [SummaryRow] {
    summary
        .unk_detail_map
        .get(category)
        .map(|v| v.as_slice())
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary() -> LotSummary {
        serde_json::from_value(json!({
            "resultSummary": [
                {"type": "OK", "count": 90, "rate": "90.00%"},
                {"type": "NG", "count": 10, "rate": "10.00%"},
                {"type": "TOTAL", "count": 100, "rate": "100.00%"}
            ],
            "unkResultDistribution": [{"value": "DUST", "count": 3, "rate": "60%"}],
            "unkDetailMap": {"DUST": [{"value": "D01", "count": 3, "rate": "100%"}]},
            "gtSummary": [{"desc": "UnderKill", "count": 1, "rate": "250"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_selected_section_first() {
        let order = ordered_sections(Section::Gt);
        assert_eq!(order[0], Section::Gt);
        assert_eq!(order[1], Section::Rate);
        assert_eq!(order.len(), 7);
    }

    #[test]
    fn test_chart_rows_exclude_total() {
        let s = summary();
        let rows = chart_rows(&s, Section::Rate);
        assert_eq!(rows.len(), 2);
        assert_eq!(Section::Rate.bar_color(rows[1], 1), "#c76a6a");
        assert_eq!(chart_rows(&s, Section::Gt)[0].key(), "UnderKill");
    }

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate("12.34%"), 12.34);
        assert_eq!(parse_rate(" 250 "), 250.0);
        assert_eq!(parse_rate("-"), 0.0);
    }

    #[test]
    fn test_unk_breakdown() {
        let s = summary();
        assert_eq!(unk_breakdown(&s, "DUST")[0].key(), "D01");
        assert!(unk_breakdown(&s, "SCRATCH").is_empty());
    }
}
