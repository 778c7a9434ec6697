//! ソーター選択（"ALL" 付きマルチセレクト）
//!
//! ALL のトグルは直前の選択にALLが含まれていたかで判定する。
//! 毎回ゼロから再計算しないことで、部分的に矛盾した状態を作らない。

use crate::types::SelectOption;
use serde::{Deserialize, Serialize};

/// 合成の "ALL" エントリ
pub const ALL: &str = "ALL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SorterSelection {
    /// 実ソーター（ALLを含まない）
    options: Vec<SelectOption>,
    /// 選択中の値（ALLを含む場合は先頭）
    selected: Vec<String>,
}

impl SorterSelection {
    /// 初期状態: ALL + 全ソーター
    pub fn new(options: Vec<SelectOption>) -> Self {
        let options: Vec<SelectOption> = options.into_iter().filter(|o| o.value != ALL).collect();
        let mut selection = Self { options, selected: Vec::new() };
        selection.selected = selection.everything();
        selection
    }

    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    /// ALLを含む選択値
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn has_all(&self) -> bool {
        self.selected.iter().any(|v| v == ALL)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn is_selected(&self, value: &str) -> bool {
        self.selected.iter().any(|v| v == value)
    }

    /// APIに渡す実ソーター値（ALLを除く）
    pub fn values(&self) -> Vec<String> {
        self.selected.iter().filter(|v| *v != ALL).cloned().collect()
    }

    /// カンマ区切りのキー（変更検知・クエリ用）
    pub fn key(&self) -> String {
        self.values().join(",")
    }

    /// マルチセレクトの新しい値を反映する
    pub fn handle_change(&mut self, values: &[String]) {
        if values.is_empty() {
            self.selected.clear();
            return;
        }

        let prev_has_all = self.has_all();
        let now_has_all = values.iter().any(|v| v == ALL);

        if prev_has_all && !now_has_all {
            self.selected.clear();
            return;
        }

        if now_has_all && !prev_has_all {
            self.selected = self.everything();
            return;
        }

        let only_real: Vec<String> = values
            .iter()
            .filter(|v| *v != ALL && self.options.iter().any(|o| &o.value == *v))
            .cloned()
            .collect();

        if only_real.len() == self.options.len() {
            self.selected = self.everything();
            return;
        }

        self.selected = only_real;
    }

    /// 1項目のチェックを切り替える（CLI/チェックボックスUI用）
    pub fn toggle(&mut self, value: &str) {
        let mut next = self.selected.clone();
        if let Some(pos) = next.iter().position(|v| v == value) {
            next.remove(pos);
        } else {
            next.push(value.to_string());
        }
        self.handle_change(&next);
    }

    fn everything(&self) -> Vec<String> {
        std::iter::once(ALL.to_string())
            .chain(self.options.iter().map(|o| o.value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection() -> SorterSelection {
        SorterSelection::new(vec![
            SelectOption::new("S01"),
            SelectOption::new("S02"),
            SelectOption::new("S03"),
        ])
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_initial_is_all() {
        let s = selection();
        assert_eq!(s.selected(), strings(&["ALL", "S01", "S02", "S03"]).as_slice());
        assert_eq!(s.values(), strings(&["S01", "S02", "S03"]));
    }

    #[test]
    fn test_deselect_all_clears() {
        let mut s = selection();
        s.handle_change(&strings(&["S01", "S02", "S03"]));
        assert!(s.is_empty());
    }

    #[test]
    fn test_select_all_expands() {
        let mut s = selection();
        s.handle_change(&[]);
        s.handle_change(&strings(&["S02"]));
        s.handle_change(&strings(&["S02", "ALL"]));
        assert_eq!(s.selected(), strings(&["ALL", "S01", "S02", "S03"]).as_slice());
    }

    #[test]
    fn test_deselect_real_drops_all() {
        let mut s = selection();
        s.handle_change(&strings(&["ALL", "S01", "S03"]));
        assert_eq!(s.selected(), strings(&["S01", "S03"]).as_slice());
        assert!(!s.has_all());
    }

    #[test]
    fn test_selecting_every_real_adds_all() {
        let mut s = selection();
        s.handle_change(&strings(&["S01"]));
        s.handle_change(&strings(&["S01", "S02", "S03"]));
        assert!(s.has_all());
        assert_eq!(s.values().len(), 3);
    }

    #[test]
    fn test_toggle() {
        let mut s = selection();
        s.toggle(ALL);
        assert!(s.is_empty());
        s.toggle("S03");
        assert_eq!(s.values(), strings(&["S03"]));
        s.toggle(ALL);
        assert!(s.has_all());
        assert_eq!(s.key(), "S01,S02,S03");
    }

    #[test]
    fn test_unknown_values_are_ignored() {
        let mut s = selection();
        s.handle_change(&[]);
        s.handle_change(&strings(&["S01", "ZZZ"]));
        assert_eq!(s.values(), strings(&["S01"]));
    }
}
