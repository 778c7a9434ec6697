//! ターミナル向けのテキスト表

use pcb_inspect_common::chart::ChartSpec;
use pcb_inspect_common::detail::DetailState;
use pcb_inspect_common::pagination::{self, PageItem, PAGE_SIZE};
use pcb_inspect_common::summary::{ordered_sections, Section};
use pcb_inspect_common::types::{column_label, COLUMNS_TO_SHOW};
use pcb_inspect_common::{Lot, LotHeader, LotId, LotSummary, RawRecord};

/// 全角文字を2桁として数えた表示幅
fn display_width(s: &str) -> usize {
    s.chars().map(|c| if c.is_ascii() { 1 } else { 2 }).sum()
}

fn pad(s: &str, width: usize) -> String {
    let w = display_width(s);
    if w >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - w))
    }
}

/// ヘッダと行から桁揃えの表を作る
pub fn table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(display_width(cell));
            }
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| pad(c, *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(headers)];
    out.push(widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
    out.extend(rows.iter().map(|r| line(r)));
    out.join("\n")
}

fn opt(v: &Option<String>) -> String {
    v.clone().unwrap_or_default()
}

/// 検索結果・作業リスト（選択中は `*`）
pub fn lots_table(lots: &[Lot], checked: &[LotId]) -> String {
    let headers = ["", "ID", "LOT", "ITEMCODE", "VERSION", "CUSTOMER", "MACHINE", "SORTER", "DATE"]
        .map(String::from)
        .to_vec();
    let rows: Vec<Vec<String>> = lots
        .iter()
        .map(|l| {
            vec![
                if checked.contains(&l.id) { "*".into() } else { String::new() },
                l.id.to_string(),
                l.lot.clone(),
                opt(&l.itemcode),
                opt(&l.version),
                opt(&l.customer),
                opt(&l.machine),
                opt(&l.trial),
                l.inspection_date().to_string(),
            ]
        })
        .collect();
    table(&headers, &rows)
}

/// 分析チャートの数値表（グループ × 系列）
pub fn chart_table(spec: &ChartSpec) -> String {
    let mut headers = vec!["GROUP".to_string(), "LOTS".to_string()];
    headers.extend(spec.datasets.iter().map(|d| d.label.to_string()));

    let rows: Vec<Vec<String>> = spec
        .groups
        .iter()
        .enumerate()
        .map(|(i, g)| {
            let mut row = vec![g.key.clone(), g.lots.to_string()];
            row.extend(
                spec.datasets
                    .iter()
                    .map(|d| d.data.get(i).map(|v| d.kind.tooltip(*v, g)).unwrap_or_default()),
            );
            row
        })
        .collect();
    table(&headers, &rows)
}

pub fn header_line(header: &LotHeader) -> String {
    format!(
        "LOT {} | MACHINE {} | CUSTOMER {} | ITEM {} | VERSION {} | AI {}",
        header.lot,
        opt(&header.machine),
        opt(&header.customer),
        opt(&header.itemcode),
        opt(&header.version),
        opt(&header.ai_date_time),
    )
}

/// サマリの全セクション（選択セクションが先頭）
pub fn summary_sections(summary: &LotSummary, selected: Section) -> String {
    ordered_sections(selected)
        .into_iter()
        .map(|section| {
            let headers = section.headers().map(String::from).to_vec();
            let rows: Vec<Vec<String>> = section
                .rows(summary)
                .iter()
                .map(|r| vec![r.key().to_string(), r.count.to_string(), r.rate.clone()])
                .collect();
            if rows.is_empty() {
                format!("■ {}\n(データなし)", section.title())
            } else {
                format!("■ {}\n{}", section.title(), table(&headers, &rows))
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// 詳細テーブルのページ（行番号は表示上の通し番号）
pub fn rows_table(rows: &[RawRecord], page: u32) -> String {
    let mut headers = vec!["#".to_string()];
    headers.extend(COLUMNS_TO_SHOW.iter().map(|c| column_label(c)));

    let offset = (page.max(1) as u64 - 1) * PAGE_SIZE as u64;
    let body: Vec<Vec<String>> = rows
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let mut row = vec![(offset + i as u64 + 1).to_string()];
            row.extend(COLUMNS_TO_SHOW.iter().map(|c| r.cell_text(c)));
            row
        })
        .collect();
    table(&headers, &body)
}

/// `1-100 / 250件  [1] 2 3`
pub fn page_line(state: &DetailState) -> String {
    let range = match pagination::row_range(state.page(), state.total(), PAGE_SIZE) {
        Some((start, end)) => format!("{}-{} / {}件", start, end, state.total()),
        None => "0件".to_string(),
    };
    let buttons = pagination::page_items(state.page(), state.total_pages())
        .into_iter()
        .map(|item| match item {
            PageItem::Page(p) if p == state.page() => format!("[{}]", p),
            PageItem::Page(p) => p.to_string(),
            PageItem::Ellipsis => "…".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ");
    if buttons.is_empty() {
        range
    } else {
        format!("{}  {}", range, buttons)
    }
}

/// 詳細画面のテキスト描画
pub fn detail_view(state: &DetailState) -> String {
    let mut parts = Vec::new();
    if let Some(header) = state.header() {
        parts.push(header_line(header));
    }
    parts.push(format!("VIEW: {}", state.view().label()));

    let sorters = state.sorters().values();
    if !sorters.is_empty() {
        parts.push(format!("SORTER: {}", sorters.join(", ")));
    }

    if state.view().data_mode().is_none() {
        match state.summary() {
            Some(summary) => parts.push(summary_sections(summary, Section::Rate)),
            None => parts.push("サマリがありません".to_string()),
        }
        return parts.join("\n");
    }

    let filters: Vec<String> = state
        .filters()
        .columns()
        .map(|(c, v)| format!("{}={}", c, v.join("|")))
        .collect();
    if !filters.is_empty() {
        parts.push(format!("FILTER: {}", filters.join(" ")));
    }
    if let (Some(field), Some(direction)) = (&state.sort().field, state.sort().direction) {
        parts.push(format!("SORT: {} {}", field, direction));
    }

    if state.rows().is_empty() {
        parts.push("No Data".to_string());
    } else {
        parts.push(rows_table(state.rows(), state.page()));
    }
    parts.push(page_line(state));
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_alignment() {
        let out = table(
            &["A".into(), "BB".into()],
            &[vec!["xxx".into(), "1".into()], vec!["y".into(), "22".into()]],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "A    BB");
        assert_eq!(lines[1], "---  --");
        assert_eq!(lines[2], "xxx  1");
        assert_eq!(lines[3], "y    22");
    }

    #[test]
    fn test_lots_table_marks_checked() {
        let lots = vec![
            Lot { id: 1, lot: "L1".into(), ..Default::default() },
            Lot { id: 2, lot: "L2".into(), ..Default::default() },
        ];
        let out = table_rows(&lots_table(&lots, &[2]));
        assert!(!out[2].starts_with('*'));
        assert!(out[3].starts_with('*'));
    }

    fn table_rows(s: &str) -> Vec<String> {
        s.lines().map(String::from).collect()
    }

    #[test]
    fn test_display_width_counts_wide_chars() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("件数"), 4);
    }
}
