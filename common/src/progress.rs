//! ダウンロード進捗ストア
//!
//! 実行中の処理の一覧を保持し、変更のたびに購読者へ通知する。
//! グローバル変数は使わず、画面/プロセスごとに1つ生成して渡す。

use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// 完了後に100%表示を残す時間
pub const FINISH_LINGER: Duration = Duration::from_millis(600);

/// 完了前に表示する上限（100%は finish のみ）
const MAX_RUNNING_PERCENT: f32 = 99.0;

pub type ProgressId = Uuid;

/// 中断ハンドル（CancellationToken / AbortController をラップする）
pub trait Abort {
    fn abort(&self);
}

/// 購読者に渡す1件分の表示情報
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressView {
    pub id: ProgressId,
    pub label: String,
    /// 0〜100
    pub progress: f32,
    /// 受信済みバイト数
    pub bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&[ProgressView]) + Send>;

struct Entry<A> {
    view: ProgressView,
    handle: A,
}

pub struct ProgressStore<A: Abort> {
    entries: Vec<Entry<A>>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl<A: Abort> Default for ProgressStore<A> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }
}

impl<A: Abort> ProgressStore<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> Vec<ProgressView> {
        self.entries.iter().map(|e| e.view.clone()).collect()
    }

    pub fn get(&self, id: ProgressId) -> Option<&ProgressView> {
        self.entries.iter().find(|e| e.view.id == id).map(|e| &e.view)
    }

    /// 購読を開始し、現在の一覧を即時に通知する
    pub fn subscribe(&mut self, mut listener: impl FnMut(&[ProgressView]) + Send + 'static) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        listener(&self.snapshot());
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// 新しい処理を登録する
    pub fn start(&mut self, label: impl Into<String>, handle: A) -> ProgressId {
        let id = Uuid::new_v4();
        self.entries.push(Entry {
            view: ProgressView {
                id,
                label: label.into(),
                progress: 0.0,
                bytes: 0,
            },
            handle,
        });
        self.notify();
        id
    }

    /// 進捗率を設定する（未知のIDは無視）
    pub fn update(&mut self, id: ProgressId, progress: f32) -> bool {
        let Some(entry) = self.entry_mut(id) else {
            return false;
        };
        entry.view.progress = progress.clamp(0.0, 100.0);
        self.notify();
        true
    }

    /// 受信バイト数から進捗を更新する
    ///
    /// 全体サイズが分かれば 99% までの割合、分からなければ 0% のままバイト数だけ更新する。
    pub fn update_bytes(&mut self, id: ProgressId, bytes: u64, total: Option<u64>) -> bool {
        let Some(entry) = self.entry_mut(id) else {
            return false;
        };
        entry.view.bytes = bytes;
        entry.view.progress = percent(bytes, total);
        self.notify();
        true
    }

    /// 100%にする。呼び出し側は `FINISH_LINGER` 後に `remove` する
    pub fn finish(&mut self, id: ProgressId) -> bool {
        let Some(entry) = self.entry_mut(id) else {
            return false;
        };
        entry.view.progress = 100.0;
        self.notify();
        true
    }

    /// 中断ハンドルを呼び、即座に一覧から外す
    pub fn cancel(&mut self, id: ProgressId) -> bool {
        let Some(pos) = self.entries.iter().position(|e| e.view.id == id) else {
            return false;
        };
        let entry = self.entries.remove(pos);
        entry.handle.abort();
        self.notify();
        true
    }

    pub fn remove(&mut self, id: ProgressId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.view.id != id);
        if self.entries.len() == before {
            return false;
        }
        self.notify();
        true
    }

    fn entry_mut(&mut self, id: ProgressId) -> Option<&mut Entry<A>> {
        self.entries.iter_mut().find(|e| e.view.id == id)
    }

    fn notify(&mut self) {
        let snapshot = self.snapshot();
        for (_, listener) in self.listeners.iter_mut() {
            listener(&snapshot);
        }
    }
}

/// 受信バイト数から進捗率を求める
pub fn percent(bytes: u64, total: Option<u64>) -> f32 {
    match total {
        Some(total) if total > 0 => {
            ((bytes as f64 / total as f64 * 100.0) as f32).min(MAX_RUNNING_PERCENT)
        }
        _ => 0.0,
    }
}

/// 表示用のバイト数（1024単位）
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Flag(Arc<AtomicBool>);

    impl Abort for Flag {
        fn abort(&self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_start_update_finish_remove() {
        let mut store = ProgressStore::new();
        let id = store.start("AI_RESULT", Flag::default());
        assert_eq!(store.get(id).unwrap().progress, 0.0);

        assert!(store.update(id, 40.0));
        assert_eq!(store.get(id).unwrap().progress, 40.0);
        assert!(store.update(id, 250.0));
        assert_eq!(store.get(id).unwrap().progress, 100.0);

        assert!(store.finish(id));
        assert_eq!(store.len(), 1);
        assert!(store.remove(id));
        assert!(store.is_empty());
    }

    #[test]
    fn test_cancel_aborts_and_removes() {
        let mut store = ProgressStore::new();
        let flag = Flag::default();
        let id = store.start("download", flag.clone());
        assert!(store.cancel(id));
        assert!(flag.0.load(Ordering::SeqCst));
        assert!(store.is_empty());
        assert!(!store.cancel(id));
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let mut store: ProgressStore<Flag> = ProgressStore::new();
        let id = Uuid::new_v4();
        assert!(!store.update(id, 10.0));
        assert!(!store.finish(id));
        assert!(!store.remove(id));
    }

    #[test]
    fn test_ids_are_unique() {
        let mut store = ProgressStore::new();
        let a = store.start("a", Flag::default());
        let b = store.start("b", Flag::default());
        assert_ne!(a, b);
    }

    #[test]
    fn test_subscribers_are_notified_until_unsubscribed() {
        let mut store = ProgressStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(Mutex::new(Vec::new()));

        let sub = {
            let calls = calls.clone();
            let last = last.clone();
            store.subscribe(move |views| {
                calls.fetch_add(1, Ordering::SeqCst);
                *last.lock().unwrap() = views.to_vec();
            })
        };
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let id = store.start("x", Flag::default());
        store.update_bytes(id, 512, Some(1024));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(last.lock().unwrap()[0].progress, 50.0);

        assert!(store.unsubscribe(sub));
        store.finish(id);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, Some(100)), 0.0);
        assert_eq!(percent(100, Some(100)), 99.0);
        assert_eq!(percent(5000, None), 0.0);
        assert_eq!(percent(10, Some(0)), 0.0);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
