//! 詳細画面のドライバ
//!
//! `DetailState` が返す `Effect` を実行する。デバウンスは期限だけ覚えておき、
//! `settle` で期限まで待ってから最新の予約を発火させる。

pub mod interactive;

use crate::api::PmsClient;
use crate::error::Result;
use pcb_inspect_common::detail::{DataRequest, DetailState, Effect, ViewMode};
use pcb_inspect_common::detail::{DebounceTicket, RequestGeneration};
use pcb_inspect_common::LotId;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

pub struct DetailSession<'a> {
    client: &'a PmsClient,
    state: DetailState,
    pending: Option<(DebounceTicket, Instant)>,
}

impl<'a> DetailSession<'a> {
    /// ヘッダ・サマリ・ソーター一覧を読み込んで開く
    ///
    /// ヘッダが取れなければエラー。サマリとソーターは取れなくても空で続ける。
    pub async fn open(client: &'a PmsClient, lot_id: LotId, debounce: Duration) -> Result<Self> {
        let header = client.detail_header(lot_id).await?;
        let summary = match client.detail_summary(lot_id, &[]).await {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("サマリの取得に失敗: {}", e);
                None
            }
        };
        let sorters = client.detail_sorters_or_empty(lot_id).await;

        let mut state = DetailState::with_debounce(lot_id, debounce);
        state.on_loaded(Some(header), summary, sorters);

        Ok(Self {
            client,
            state,
            pending: None,
        })
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub async fn run(&mut self, effects: Vec<Effect>) -> Result<()> {
        self.sync_pending();
        for effect in effects {
            self.execute(effect).await?;
        }
        Ok(())
    }

    async fn run_one(&mut self, effect: Option<Effect>) -> Result<()> {
        self.sync_pending();
        match effect {
            Some(effect) => self.execute(effect).await,
            None => Ok(()),
        }
    }

    /// 状態側で予約が無効になっていれば待ち時間も捨てる
    fn sync_pending(&mut self) {
        if !self.state.has_pending() {
            self.pending = None;
        }
    }

    async fn execute(&mut self, effect: Effect) -> Result<()> {
        match effect {
            Effect::Schedule { ticket, delay } => {
                self.pending = Some((ticket, Instant::now() + delay));
            }
            Effect::FetchPage { generation, request } => self.fetch_page(generation, request).await?,
            Effect::FetchUniqueValues { generation, mode, sorters } => {
                match self.client.unique_values(self.state.lot_id(), mode, &sorters).await {
                    Ok(values) => {
                        if !self.state.apply_unique_values(generation, values) {
                            debug!("stale unique values discarded");
                        }
                    }
                    Err(e) => warn!("ユニーク値の取得に失敗: {}", e),
                }
            }
            Effect::FetchSummary { generation, sorters } => {
                match self.client.detail_summary(self.state.lot_id(), &sorters).await {
                    Ok(summary) => {
                        if !self.state.apply_summary(generation, Some(summary)) {
                            debug!("stale summary discarded");
                        }
                    }
                    Err(e) => warn!("サマリの取得に失敗: {}", e),
                }
            }
        }
        Ok(())
    }

    async fn fetch_page(&mut self, generation: RequestGeneration, request: DataRequest) -> Result<()> {
        let page = request.page;
        match self.client.detail_data(self.state.lot_id(), &request).await {
            Ok(data) => {
                if !self.state.apply_page(generation, page, data) {
                    debug!(page, "stale page discarded");
                }
                Ok(())
            }
            Err(e) => {
                self.state.apply_page_error(generation);
                Err(e)
            }
        }
    }

    /// デバウンス待ちがあれば期限まで待って取得する
    pub async fn settle(&mut self) -> Result<()> {
        if let Some((ticket, deadline)) = self.pending.take() {
            tokio::time::sleep_until(deadline).await;
            let effect = self.state.fire(ticket);
            self.run_one(effect).await?;
        }
        Ok(())
    }

    pub async fn set_view(&mut self, view: ViewMode) -> Result<()> {
        if view.data_mode().is_none() {
            self.pending = None;
        }
        let effects = self.state.set_view(view);
        self.run(effects).await
    }

    pub async fn set_sorters(&mut self, values: &[String]) -> Result<()> {
        let effects = self.state.set_sorters(values);
        self.run(effects).await
    }

    pub async fn toggle_sorter(&mut self, value: &str) -> Result<()> {
        let effects = self.state.toggle_sorter(value);
        self.run(effects).await
    }

    pub async fn set_filter(&mut self, column: &str, selection: Vec<String>) -> Result<()> {
        let effects = self.state.set_filter(column, selection);
        self.run(effects).await
    }

    pub async fn toggle_filter_value(&mut self, column: &str, value: &str) -> Result<()> {
        let effects = self.state.toggle_filter_value(column, value);
        self.run(effects).await
    }

    pub async fn clear_filters(&mut self) -> Result<()> {
        let effects = self.state.clear_filters();
        self.run(effects).await
    }

    pub async fn toggle_sort(&mut self, field: &str) -> Result<()> {
        let effects = self.state.toggle_sort(field);
        self.run(effects).await
    }

    pub async fn go_to_page(&mut self, page: u32) -> Result<()> {
        let effect = self.state.go_to_page(page);
        self.run_one(effect).await
    }

    pub async fn next_page(&mut self) -> Result<()> {
        let effect = self.state.next_page();
        self.run_one(effect).await
    }

    pub async fn prev_page(&mut self) -> Result<()> {
        let effect = self.state.prev_page();
        self.run_one(effect).await
    }

    pub async fn refresh(&mut self) -> Result<()> {
        let effect = self.state.refresh();
        self.run_one(effect).await
    }

    /// 画面を閉じる。保留中の取得は捨てる
    pub fn close(mut self) -> DetailState {
        self.pending = None;
        self.state.cancel_pending();
        self.state
    }
}
