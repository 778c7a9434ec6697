//! 作業リスト（myList）
//!
//! 複数回の検索をまたいで選択したロットを最大20件まで保持する。
//! 上限を超える選択変更は一切適用せずにエラーを返す。

use crate::error::{Error, Result};
use crate::types::{Lot, LotId};
use serde::{Deserialize, Serialize};

/// 作業リストの上限
pub const MAX_LOTS: usize = 20;

/// 作業リストと、現在の検索結果上でのハイライト状態
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkingSet {
    lots: Vec<Lot>,
    /// 現在の検索結果でチェックされているID
    highlighted: Vec<LotId>,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    pub fn ids(&self) -> Vec<LotId> {
        self.lots.iter().map(|l| l.id).collect()
    }

    pub fn highlighted(&self) -> &[LotId] {
        &self.highlighted
    }

    pub fn len(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    pub fn contains(&self, id: LotId) -> bool {
        self.lots.iter().any(|l| l.id == id)
    }

    /// 検索結果のチェック状態を反映する
    ///
    /// `selected_ids` は検索結果上の選択ID全体。検索結果外で以前に選んだロットは保持し、
    /// その後ろに検索結果の並び順で選択ロットを追加する。
    pub fn apply_selection(&mut self, results: &[Lot], selected_ids: &[LotId]) -> Result<()> {
        let newly_selected = selected_ids
            .iter()
            .filter(|id| !self.contains(**id))
            .count();

        let attempted = self.lots.len() + newly_selected;
        if attempted > MAX_LOTS {
            return Err(Error::SelectionLimit { limit: MAX_LOTS, attempted });
        }

        self.highlighted = selected_ids.to_vec();

        let preserved = self
            .lots
            .iter()
            .filter(|lot| !results.iter().any(|r| r.id == lot.id))
            .cloned();
        let from_results = results
            .iter()
            .filter(|r| selected_ids.contains(&r.id))
            .cloned();

        let mut merged: Vec<Lot> = Vec::new();
        for lot in preserved.chain(from_results) {
            if !merged.iter().any(|m| m.id == lot.id) {
                merged.push(lot);
            }
        }
        self.lots = merged;
        Ok(())
    }

    /// 新しい検索結果に切り替えたとき、結果に含まれる作業リストのIDだけをハイライトに残す
    pub fn on_new_results(&mut self, results: &[Lot]) {
        self.highlighted = self
            .lots
            .iter()
            .map(|l| l.id)
            .filter(|id| results.iter().any(|r| r.id == *id))
            .collect();
    }

    /// 作業リストから外す（見つからなければ false）
    pub fn remove(&mut self, id: LotId) -> bool {
        let before = self.lots.len();
        self.lots.retain(|l| l.id != id);
        self.highlighted.retain(|x| *x != id);
        self.lots.len() != before
    }

    pub fn clear(&mut self) {
        self.lots.clear();
        self.highlighted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lot(id: LotId) -> Lot {
        Lot {
            id,
            lot: format!("L{}", id),
            ..Default::default()
        }
    }

    fn lots(ids: std::ops::RangeInclusive<LotId>) -> Vec<Lot> {
        ids.map(lot).collect()
    }

    #[test]
    fn test_select_two_rows_in_result_order() {
        let results = lots(1..=5);
        let mut ws = WorkingSet::new();
        ws.apply_selection(&results, &[4, 2]).unwrap();

        assert_eq!(ws.ids(), vec![2, 4]);
        assert_eq!(ws.highlighted(), &[4, 2]);
    }

    #[test]
    fn test_preserved_entries_come_first() {
        let mut ws = WorkingSet::new();
        ws.apply_selection(&lots(1..=3), &[1, 3]).unwrap();

        let second = lots(10..=12);
        ws.on_new_results(&second);
        assert!(ws.highlighted().is_empty());

        ws.apply_selection(&second, &[11]).unwrap();
        assert_eq!(ws.ids(), vec![1, 3, 11]);
    }

    #[test]
    fn test_deselect_in_results_removes() {
        let results = lots(1..=3);
        let mut ws = WorkingSet::new();
        ws.apply_selection(&results, &[1, 2, 3]).unwrap();
        ws.apply_selection(&results, &[1, 3]).unwrap();
        assert_eq!(ws.ids(), vec![1, 3]);
    }

    #[test]
    fn test_overflow_leaves_set_unchanged() {
        let results = lots(1..=25);
        let mut ws = WorkingSet::new();
        let first: Vec<LotId> = (1..=19).collect();
        ws.apply_selection(&results, &first).unwrap();
        let before = ws.clone();

        let too_many: Vec<LotId> = (1..=21).collect();
        let err = ws.apply_selection(&results, &too_many).unwrap_err();
        assert!(matches!(err, Error::SelectionLimit { limit: 20, attempted: 21 }));
        assert_eq!(ws, before);
        assert!(ws.len() <= MAX_LOTS);
    }

    #[test]
    fn test_exactly_at_cap_is_accepted() {
        let results = lots(1..=20);
        let mut ws = WorkingSet::new();
        let all: Vec<LotId> = (1..=20).collect();
        ws.apply_selection(&results, &all).unwrap();
        assert_eq!(ws.len(), MAX_LOTS);
    }

    #[test]
    fn test_new_results_preserve_present_ids() {
        let mut ws = WorkingSet::new();
        ws.apply_selection(&lots(1..=5), &[2, 5]).unwrap();
        ws.on_new_results(&lots(4..=8));
        assert_eq!(ws.highlighted(), &[5]);
        assert_eq!(ws.ids(), vec![2, 5]);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut ws = WorkingSet::new();
        ws.apply_selection(&lots(1..=3), &[1, 2]).unwrap();
        ws.remove(1);
        assert_eq!(ws.ids(), vec![2]);
        assert_eq!(ws.highlighted(), &[2]);
        ws.clear();
        assert!(ws.is_empty());
        assert!(ws.highlighted().is_empty());
    }
}
