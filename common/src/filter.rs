//! 列フィルタ（Excel風マルチ値フィルタ）
//!
//! 列ごとの許可値集合を保持する。
//! - エントリなし: 全値許可（フィルタなし）
//! - 空リスト: 何も一致しない
//! - 全候補と同じ集合を選び直した場合はエントリを削除し「フィルタなし」に戻す

use crate::types::RawRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterState {
    columns: BTreeMap<String, Vec<String>>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn clear(&mut self) {
        self.columns.clear();
    }

    /// 明示的な選択（None は全値許可）
    pub fn get(&self, column: &str) -> Option<&[String]> {
        self.columns.get(column).map(|v| v.as_slice())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.columns.iter()
    }

    /// 表示上の選択値（エントリなしなら全候補）
    pub fn effective<'a>(&'a self, column: &str, all_values: &'a [String]) -> Vec<&'a str> {
        match self.columns.get(column) {
            Some(selected) => selected
                .iter()
                .filter(|v| all_values.contains(v))
                .map(|v| v.as_str())
                .collect(),
            None => all_values.iter().map(|v| v.as_str()).collect(),
        }
    }

    /// 選択を設定する。全候補と一致する場合はフィルタなしに畳む
    pub fn set(&mut self, column: &str, selection: Vec<String>, all_values: &[String]) {
        let mut cleaned: Vec<String> = Vec::new();
        for v in selection {
            if all_values.contains(&v) && !cleaned.contains(&v) {
                cleaned.push(v);
            }
        }

        if cleaned.len() == all_values.len() {
            self.columns.remove(column);
        } else {
            self.columns.insert(column.to_string(), cleaned);
        }
    }

    /// 1値のチェックを切り替える
    pub fn toggle_value(&mut self, column: &str, value: &str, all_values: &[String]) {
        let mut next: Vec<String> = self
            .effective(column, all_values)
            .into_iter()
            .map(str::to_string)
            .collect();

        if let Some(pos) = next.iter().position(|v| v == value) {
            next.remove(pos);
        } else {
            next.push(value.to_string());
        }
        self.set(column, next, all_values);
    }

    /// 「すべて選択」の切り替え
    ///
    /// 検索語に一致する候補がすべて選択済みなら空集合（何も一致しない）に、
    /// そうでなければ全候補に戻す。
    pub fn toggle_all(&mut self, column: &str, all_values: &[String], search: &str) {
        if self.is_all_selected(column, all_values, search) {
            self.columns.insert(column.to_string(), Vec::new());
        } else {
            self.columns.remove(column);
        }
    }

    /// 検索語に一致する候補がすべて選択されているか
    pub fn is_all_selected(&self, column: &str, all_values: &[String], search: &str) -> bool {
        let selected = self.effective(column, all_values);
        !selected.is_empty()
            && search_values(all_values, search)
                .iter()
                .all(|v| selected.contains(v))
    }

    /// アイコンを「フィルタ中」表示にするか（0 < 選択数 < 全候補数）
    pub fn is_filtered(&self, column: &str, all_values: &[String]) -> bool {
        let n = self.effective(column, all_values).len();
        n > 0 && n < all_values.len()
    }

    /// ユニーク値の更新後、候補から消えた値を選択から外す
    pub fn clean_against(&mut self, unique_values: &BTreeMap<String, Vec<String>>) {
        let columns: Vec<String> = self.columns.keys().cloned().collect();
        for column in columns {
            let all = unique_values.get(&column).cloned().unwrap_or_default();
            let Some(selected) = self.columns.get(&column) else {
                continue;
            };
            let cleaned: Vec<String> = selected.iter().filter(|v| all.contains(v)).cloned().collect();
            self.set(&column, cleaned, &all);
        }
    }

    /// クライアント側の行判定
    pub fn matches(&self, row: &RawRecord) -> bool {
        self.columns.iter().all(|(column, allowed)| {
            let value = row.cell_text(column);
            allowed.iter().any(|a| *a == value)
        })
    }
}

/// 部分一致（大文字小文字を無視）で候補を絞り込む
pub fn search_values<'a>(all_values: &'a [String], search: &str) -> Vec<&'a str> {
    let needle = search.to_lowercase();
    all_values
        .iter()
        .filter(|v| v.to_lowercase().contains(&needle))
        .map(|v| v.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_full_selection_collapses_to_absent() {
        let all = values(&["A", "B", "C"]);
        let mut f = FilterState::new();
        f.set("defect_code", values(&["A", "B"]), &all);
        assert_eq!(f.get("defect_code"), Some(values(&["A", "B"]).as_slice()));

        f.set("defect_code", values(&["C", "A", "B"]), &all);
        assert_eq!(f.get("defect_code"), None);
        assert_eq!(f, FilterState::new());
        assert_eq!(serde_json::to_value(&f).unwrap(), json!({}));
    }

    #[test]
    fn test_empty_list_is_not_absent() {
        let all = values(&["A", "B"]);
        let mut f = FilterState::new();
        f.toggle_all("strip_id", &all, "");
        assert_eq!(f.get("strip_id"), Some(&[][..]));
        assert_eq!(serde_json::to_value(&f).unwrap(), json!({"strip_id": []}));

        let row: RawRecord = serde_json::from_value(json!({"strip_id": "A"})).unwrap();
        assert!(!f.matches(&row));

        f.toggle_all("strip_id", &all, "");
        assert_eq!(f.get("strip_id"), None);
        assert!(f.matches(&row));
    }

    #[test]
    fn test_toggle_value_round_trip() {
        let all = values(&["A", "B", "C"]);
        let mut f = FilterState::new();
        f.toggle_value("ivs_keyin1", "B", &all);
        assert_eq!(f.get("ivs_keyin1"), Some(values(&["A", "C"]).as_slice()));
        assert!(f.is_filtered("ivs_keyin1", &all));

        f.toggle_value("ivs_keyin1", "B", &all);
        assert_eq!(f.get("ivs_keyin1"), None);
        assert!(!f.is_filtered("ivs_keyin1", &all));
    }

    #[test]
    fn test_clean_against_drops_stale_values() {
        let mut f = FilterState::new();
        let all = values(&["A", "B", "C"]);
        f.set("defect_code", values(&["A", "C"]), &all);

        let mut unique = BTreeMap::new();
        unique.insert("defect_code".to_string(), values(&["A", "B"]));
        f.clean_against(&unique);
        assert_eq!(f.get("defect_code"), Some(values(&["A"]).as_slice()));

        unique.insert("defect_code".to_string(), values(&["A"]));
        f.clean_against(&unique);
        assert_eq!(f.get("defect_code"), None);
    }

    #[test]
    fn test_search_and_all_selected() {
        let all = values(&["Scratch", "dent", "SCRAP"]);
        assert_eq!(search_values(&all, "scr"), vec!["Scratch", "SCRAP"]);

        let mut f = FilterState::new();
        f.set("afvi_ai_defect", values(&["Scratch", "SCRAP"]), &all);
        assert!(f.is_all_selected("afvi_ai_defect", &all, "scr"));
        assert!(!f.is_all_selected("afvi_ai_defect", &all, ""));
    }

    #[test]
    fn test_matches_numeric_value() {
        let all = values(&["10", "20"]);
        let mut f = FilterState::new();
        f.set("strip_id", values(&["10"]), &all);
        let row: RawRecord = serde_json::from_value(json!({"strip_id": 10})).unwrap();
        assert!(f.matches(&row));
    }
}
