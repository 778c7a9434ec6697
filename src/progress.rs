//! ターミナルの進捗表示
//!
//! 共通の `ProgressStore` を購読し、処理ごとに indicatif のバーを出す。

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use pcb_inspect_common::progress::{format_bytes, Abort, ProgressId, ProgressStore, ProgressView, SubscriptionId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

/// CancellationToken を中断ハンドルとして使う
#[derive(Debug, Clone, Default)]
pub struct TokenAbort(pub CancellationToken);

impl Abort for TokenAbort {
    fn abort(&self) {
        self.0.cancel();
    }
}

pub type SharedStore = Arc<Mutex<ProgressStore<TokenAbort>>>;

pub fn new_store() -> SharedStore {
    Arc::new(Mutex::new(ProgressStore::new()))
}

/// ストアをロックする（他スレッドのパニック後も中身は使う）
pub fn lock(store: &SharedStore) -> MutexGuard<'_, ProgressStore<TokenAbort>> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 完了表示を少し残してから一覧から外す
pub fn remove_later(store: &SharedStore, id: ProgressId) {
    let store = store.clone();
    tokio::spawn(async move {
        tokio::time::sleep(pcb_inspect_common::progress::FINISH_LINGER).await;
        lock(&store).remove(id);
    });
}

/// 実行中の処理をすべて中断する（Ctrl-C用）
pub fn cancel_all(store: &SharedStore) -> usize {
    let mut store = lock(store);
    let ids: Vec<ProgressId> = store.snapshot().iter().map(|v| v.id).collect();
    ids.into_iter().filter(|id| store.cancel(*id)).count()
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner} {msg:<32} [{bar:30}] {pos:>3}%")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

fn message(view: &ProgressView) -> String {
    if view.bytes > 0 {
        format!("{} ({})", view.label, format_bytes(view.bytes))
    } else {
        view.label.clone()
    }
}

/// ストアの内容をバーとして描画する
pub fn attach_terminal(store: &SharedStore) -> SubscriptionId {
    let multi = MultiProgress::new();
    let mut bars: HashMap<ProgressId, ProgressBar> = HashMap::new();

    lock(store).subscribe(move |views: &[ProgressView]| {
        for view in views {
            let bar = bars.entry(view.id).or_insert_with(|| {
                let bar = multi.add(ProgressBar::new(100));
                bar.set_style(bar_style());
                bar
            });
            bar.set_position(view.progress.round() as u64);
            bar.set_message(message(view));
        }

        bars.retain(|id, bar| {
            let alive = views.iter().any(|v| v.id == *id);
            if !alive {
                bar.finish_and_clear();
            }
            alive
        });
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_all_aborts_tokens() {
        let store = new_store();
        let token = CancellationToken::new();
        lock(&store).start("a", TokenAbort(token.clone()));
        lock(&store).start("b", TokenAbort::default());

        assert_eq!(cancel_all(&store), 2);
        assert!(token.is_cancelled());
        assert!(lock(&store).is_empty());
    }

    #[test]
    fn test_message_with_bytes() {
        let store = new_store();
        let id = lock(&store).start("Downloading 2 Lots...", TokenAbort::default());
        lock(&store).update_bytes(id, 2048, None);

        let views = lock(&store).snapshot();
        assert_eq!(message(&views[0]), "Downloading 2 Lots... (2.0 KB)");
    }
}
