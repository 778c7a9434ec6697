//! セッション（検索結果と作業リスト）の永続化テスト

use pcb_inspect::error::PcbInspectError;
use pcb_inspect::session::Session;
use pcb_inspect_common::{Lot, MAX_LOTS};
use tempfile::tempdir;

fn lots(range: std::ops::RangeInclusive<i64>) -> Vec<Lot> {
    range
        .map(|id| Lot {
            id,
            lot: format!("L{:03}", id),
            ..Default::default()
        })
        .collect()
}

#[test]
fn test_working_set_survives_new_search() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("session.json");

    let mut session = Session::default();
    session.set_results(lots(1..=5));
    session.select(&[1, 2]).unwrap();
    session.save(&path).unwrap();

    let mut session = Session::load(&path);
    assert_eq!(session.working_set.ids(), vec![1, 2]);

    // 別の検索結果に切り替えても作業リストは残る
    session.set_results(lots(10..=12));
    assert!(session.working_set.highlighted().is_empty());
    session.select(&[11]).unwrap();
    assert_eq!(session.working_set.ids(), vec![1, 2, 11]);

    // 元の検索結果に戻るとハイライトが復元される
    session.set_results(lots(1..=5));
    assert_eq!(session.working_set.highlighted(), &[1, 2]);
}

#[test]
fn test_selection_over_limit_is_rejected_whole() {
    let mut session = Session::default();
    session.set_results(lots(1..=30));
    session.select(&(1..=MAX_LOTS as i64).collect::<Vec<_>>()).unwrap();

    let result = session.add(&[21, 22]);
    assert!(matches!(
        result,
        Err(PcbInspectError::SelectionLimit { limit: 20, attempted: 22 })
    ));
    assert_eq!(session.working_set.len(), MAX_LOTS, "上限超過時は何も変えない");
}

#[test]
fn test_broken_session_file_falls_back_to_empty() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{ not json").unwrap();

    let session = Session::load(&path);
    assert!(session.results.is_empty());
    assert!(session.working_set.is_empty());
}

#[test]
fn test_remove_and_clear() {
    let mut session = Session::default();
    session.set_results(lots(1..=3));
    session.select(&[1, 2, 3]).unwrap();

    assert!(session.remove(2));
    assert!(!session.remove(2), "2回目は見つからない");
    assert_eq!(session.working_set.ids(), vec![1, 3]);

    session.clear();
    assert!(session.working_set.is_empty());
}
