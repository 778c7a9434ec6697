//! 詳細画面のデータ取得パイプライン
//!
//! 状態遷移だけを持ち、I/Oは `Effect` として呼び出し側（CLI/WASM）に返す。
//! - 表示モード・フィルタ・ソーター変更: 300ms のデバウンス後に1ページ目を取得
//! - ソート変更・手動リフレッシュ: 即時に1ページ目を取得
//! - 応答は発行時の世代番号と照合し、古い応答は捨てる

use crate::filter::FilterState;
use crate::pagination::{self, PAGE_SIZE};
use crate::sort::SortConfig;
use crate::sorter::SorterSelection;
use crate::types::{DataPage, LotHeader, LotId, LotSummary, SelectOption, UniqueValues};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// フィルタ変更から取得までの待ち時間
pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// 画面の表示モード
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Summary,
    RawPoint,
    RawUnit,
    Underkill,
    Overkill,
}

impl ViewMode {
    pub const ALL: [ViewMode; 5] = [
        ViewMode::Summary,
        ViewMode::RawPoint,
        ViewMode::RawUnit,
        ViewMode::Underkill,
        ViewMode::Overkill,
    ];

    /// データ取得のモード（サマリ表示は取得しない）
    pub fn data_mode(&self) -> Option<DataMode> {
        match self {
            ViewMode::Summary => None,
            ViewMode::RawPoint => Some(DataMode::Point),
            ViewMode::RawUnit => Some(DataMode::Unit),
            ViewMode::Underkill => Some(DataMode::Underkill),
            ViewMode::Overkill => Some(DataMode::Overkill),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Summary => "Summary",
            ViewMode::RawPoint => "Raw Data (Point)",
            ViewMode::RawUnit => "Raw Data (Unit)",
            ViewMode::Underkill => "UnderKill",
            ViewMode::Overkill => "OverKill",
        }
    }
}

impl std::str::FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "summary" => Ok(ViewMode::Summary),
            "raw_point" | "point" => Ok(ViewMode::RawPoint),
            "raw_unit" | "unit" => Ok(ViewMode::RawUnit),
            "underkill" => Ok(ViewMode::Underkill),
            "overkill" => Ok(ViewMode::Overkill),
            _ => Err(format!(
                "Unknown view: {}. Use summary, raw_point, raw_unit, underkill, or overkill",
                s
            )),
        }
    }
}

/// バックエンドのデータモード
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataMode {
    #[default]
    Point,
    Unit,
    Underkill,
    Overkill,
}

impl DataMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataMode::Point => "point",
            DataMode::Unit => "unit",
            DataMode::Underkill => "underkill",
            DataMode::Overkill => "overkill",
        }
    }
}

/// `POST /detail/{id}/data` のリクエストボディ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRequest {
    pub mode: DataMode,
    pub page: u32,
    pub size: u32,
    pub sorters: Vec<String>,
    pub filters: FilterState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortConfig>,
}

/// 取得要求の世代番号
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestGeneration(u64);

/// デバウンス予約の番号。後の予約が前の予約を無効にする
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DebounceTicket(u64);

/// 呼び出し側が実行するI/O
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// `delay` 後に `DetailState::fire(ticket)` を呼ぶ
    Schedule { ticket: DebounceTicket, delay: Duration },
    FetchPage { generation: RequestGeneration, request: DataRequest },
    FetchUniqueValues { generation: RequestGeneration, mode: DataMode, sorters: Vec<String> },
    FetchSummary { generation: RequestGeneration, sorters: Vec<String> },
}

/// 世代カウンタ
#[derive(Debug, Clone, Default)]
struct Generations {
    page: u64,
    unique: u64,
    summary: u64,
}

/// 1ロットの詳細画面の状態
#[derive(Debug, Clone)]
pub struct DetailState {
    lot_id: LotId,
    view: ViewMode,
    header: Option<LotHeader>,
    summary: Option<LotSummary>,
    sorters: SorterSelection,
    filters: FilterState,
    sort: SortConfig,
    unique_values: UniqueValues,
    rows: Vec<crate::types::RawRecord>,
    total: u64,
    page: u32,
    loading: bool,
    debounce: Duration,
    latest_ticket: u64,
    pending: bool,
    issued: Generations,
}

impl DetailState {
    pub fn new(lot_id: LotId) -> Self {
        Self::with_debounce(lot_id, DEBOUNCE)
    }

    pub fn with_debounce(lot_id: LotId, debounce: Duration) -> Self {
        Self {
            lot_id,
            view: ViewMode::Summary,
            header: None,
            summary: None,
            sorters: SorterSelection::default(),
            filters: FilterState::new(),
            sort: SortConfig::default(),
            unique_values: UniqueValues::new(),
            rows: Vec::new(),
            total: 0,
            page: 1,
            loading: true,
            debounce,
            latest_ticket: 0,
            pending: false,
            issued: Generations::default(),
        }
    }

    pub fn lot_id(&self) -> LotId {
        self.lot_id
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn header(&self) -> Option<&LotHeader> {
        self.header.as_ref()
    }

    pub fn summary(&self) -> Option<&LotSummary> {
        self.summary.as_ref()
    }

    pub fn sorters(&self) -> &SorterSelection {
        &self.sorters
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn sort(&self) -> &SortConfig {
        &self.sort
    }

    pub fn unique_values(&self) -> &UniqueValues {
        &self.unique_values
    }

    /// 列のユニーク値（未取得なら空）
    pub fn values_for(&self, column: &str) -> &[String] {
        self.unique_values.get(column).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn rows(&self) -> &[crate::types::RawRecord] {
        &self.rows
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        pagination::total_pages(self.total, PAGE_SIZE)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// デバウンス待ちの取得があるか
    pub fn has_pending(&self) -> bool {
        self.pending
    }

    /// 初期ロード（ヘッダ・サマリ・ソーター一覧）の反映
    ///
    /// 初回マウント扱いのため、フィルタのリセットやユニーク値の取得は行わない。
    pub fn on_loaded(
        &mut self,
        header: Option<LotHeader>,
        summary: Option<LotSummary>,
        sorters: Vec<SelectOption>,
    ) {
        self.header = header;
        self.summary = summary;
        self.sorters = SorterSelection::new(sorters);
        self.loading = false;
    }

    /// 表示モードの切り替え
    pub fn set_view(&mut self, view: ViewMode) -> Vec<Effect> {
        if view == self.view {
            return Vec::new();
        }
        self.view = view;

        let Some(mode) = view.data_mode() else {
            self.cancel_pending();
            return Vec::new();
        };

        self.reset_query();
        let mut effects = Vec::new();
        if !self.sorters.is_empty() {
            effects.push(self.unique_values_effect(mode));
        }
        effects.push(self.schedule());
        effects
    }

    /// ソーター選択の変更（マルチセレクトの新しい値）
    pub fn set_sorters(&mut self, values: &[String]) -> Vec<Effect> {
        let before = self.sorters.selected().to_vec();
        self.sorters.handle_change(values);
        self.after_sorter_change(before)
    }

    /// ソーター1件の切り替え
    pub fn toggle_sorter(&mut self, value: &str) -> Vec<Effect> {
        let before = self.sorters.selected().to_vec();
        self.sorters.toggle(value);
        self.after_sorter_change(before)
    }

    fn after_sorter_change(&mut self, before: Vec<String>) -> Vec<Effect> {
        if self.sorters.selected() == before.as_slice() {
            return Vec::new();
        }

        self.reset_query();
        let mut effects = vec![self.summary_effect()];

        if let Some(mode) = self.view.data_mode() {
            if !self.sorters.is_empty() {
                effects.push(self.unique_values_effect(mode));
            }
            effects.push(self.schedule());
        }
        effects
    }

    /// 列フィルタの設定
    pub fn set_filter(&mut self, column: &str, selection: Vec<String>) -> Vec<Effect> {
        let all = self.values_for(column).to_vec();
        let before = self.filters.clone();
        self.filters.set(column, selection, &all);
        self.after_filter_change(before)
    }

    pub fn toggle_filter_value(&mut self, column: &str, value: &str) -> Vec<Effect> {
        let all = self.values_for(column).to_vec();
        let before = self.filters.clone();
        self.filters.toggle_value(column, value, &all);
        self.after_filter_change(before)
    }

    pub fn toggle_filter_all(&mut self, column: &str, search: &str) -> Vec<Effect> {
        let all = self.values_for(column).to_vec();
        let before = self.filters.clone();
        self.filters.toggle_all(column, &all, search);
        self.after_filter_change(before)
    }

    pub fn clear_filters(&mut self) -> Vec<Effect> {
        let before = self.filters.clone();
        self.filters.clear();
        self.after_filter_change(before)
    }

    fn after_filter_change(&mut self, before: FilterState) -> Vec<Effect> {
        if self.filters == before || self.view.data_mode().is_none() {
            return Vec::new();
        }
        vec![self.schedule()]
    }

    /// ソート列ヘッダのクリック（即時取得）
    pub fn toggle_sort(&mut self, field: &str) -> Vec<Effect> {
        if !crate::sort::is_sortable(field) {
            return Vec::new();
        }
        self.sort.toggle(field);
        self.cancel_pending();
        self.fetch_now(1).into_iter().collect()
    }

    /// ページ移動。範囲外は要求しない
    pub fn go_to_page(&mut self, page: u32) -> Option<Effect> {
        if page == self.page || !pagination::is_valid_page(page, self.total, PAGE_SIZE) {
            return None;
        }
        self.fetch_now(page)
    }

    pub fn next_page(&mut self) -> Option<Effect> {
        if !pagination::can_next(self.page, self.total, PAGE_SIZE) {
            return None;
        }
        self.go_to_page(self.page + 1)
    }

    pub fn prev_page(&mut self) -> Option<Effect> {
        if !pagination::can_prev(self.page) {
            return None;
        }
        self.go_to_page(self.page - 1)
    }

    /// 手動リフレッシュ: フィルタとソートを消して1ページ目を即時取得
    pub fn refresh(&mut self) -> Option<Effect> {
        self.cancel_pending();
        self.filters.clear();
        self.sort.clear();
        self.page = 1;
        self.fetch_now(1)
    }

    /// デバウンス満了。最新の予約なら1ページ目を取得する
    pub fn fire(&mut self, ticket: DebounceTicket) -> Option<Effect> {
        if !self.pending || ticket.0 != self.latest_ticket {
            return None;
        }
        self.pending = false;
        self.page = 1;
        self.fetch_now(1)
    }

    /// 保留中のデバウンスを無効にする（アンマウント時など）
    pub fn cancel_pending(&mut self) {
        self.latest_ticket += 1;
        self.pending = false;
    }

    /// 指定ページのリクエスト
    pub fn data_request(&self, page: u32) -> Option<DataRequest> {
        let mode = self.view.data_mode()?;
        Some(DataRequest {
            mode,
            page,
            size: PAGE_SIZE,
            sorters: self.sorters.values(),
            filters: self.filters.clone(),
            sort: self.sort.is_active().then(|| self.sort.clone()),
        })
    }

    /// ページ応答の反映。古い世代なら false を返して捨てる
    pub fn apply_page(&mut self, generation: RequestGeneration, page: u32, data: DataPage) -> bool {
        if generation.0 != self.issued.page {
            return false;
        }
        self.rows = data.rows;
        self.total = data.total;
        self.page = page;
        self.loading = false;
        true
    }

    /// ページ取得の失敗。状態は変えずにロード表示だけ戻す
    pub fn apply_page_error(&mut self, generation: RequestGeneration) {
        if generation.0 == self.issued.page {
            self.loading = false;
        }
    }

    /// ユニーク値の反映。候補から消えた値はフィルタから外す
    pub fn apply_unique_values(&mut self, generation: RequestGeneration, values: UniqueValues) -> bool {
        if generation.0 != self.issued.unique {
            return false;
        }
        self.filters.clean_against(&values);
        self.unique_values = values;
        true
    }

    pub fn apply_summary(&mut self, generation: RequestGeneration, summary: Option<LotSummary>) -> bool {
        if generation.0 != self.issued.summary {
            return false;
        }
        self.summary = summary;
        true
    }

    fn reset_query(&mut self) {
        self.filters.clear();
        self.sort.clear();
        self.page = 1;
    }

    fn schedule(&mut self) -> Effect {
        self.latest_ticket += 1;
        self.pending = true;
        Effect::Schedule {
            ticket: DebounceTicket(self.latest_ticket),
            delay: self.debounce,
        }
    }

    fn fetch_now(&mut self, page: u32) -> Option<Effect> {
        let request = self.data_request(page)?;
        self.issued.page += 1;
        self.loading = true;
        Some(Effect::FetchPage {
            generation: RequestGeneration(self.issued.page),
            request,
        })
    }

    fn unique_values_effect(&mut self, mode: DataMode) -> Effect {
        self.issued.unique += 1;
        Effect::FetchUniqueValues {
            generation: RequestGeneration(self.issued.unique),
            mode,
            sorters: self.sorters.values(),
        }
    }

    fn summary_effect(&mut self) -> Effect {
        self.issued.summary += 1;
        Effect::FetchSummary {
            generation: RequestGeneration(self.issued.summary),
            sorters: self.sorters.values(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::SortDirection;
    use crate::types::RawRecord;
    use serde_json::json;

    fn loaded() -> DetailState {
        let mut state = DetailState::new(42);
        state.on_loaded(
            None,
            None,
            vec![SelectOption::new("S01"), SelectOption::new("S02")],
        );
        state
    }

    fn ticket_of(effects: &[Effect]) -> DebounceTicket {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::Schedule { ticket, .. } => Some(*ticket),
                _ => None,
            })
            .expect("schedule effect")
    }

    fn fetch_of(effect: Option<Effect>) -> (RequestGeneration, DataRequest) {
        match effect {
            Some(Effect::FetchPage { generation, request }) => (generation, request),
            other => panic!("expected FetchPage, got {:?}", other),
        }
    }

    fn page_of(total: u64, n: usize) -> DataPage {
        DataPage {
            total,
            rows: vec![RawRecord::default(); n],
            ..Default::default()
        }
    }

    fn raw_view() -> DetailState {
        let mut state = loaded();
        let effects = state.set_view(ViewMode::RawPoint);
        let ticket = ticket_of(&effects);
        let (generation, _) = fetch_of(state.fire(ticket));
        state.apply_page(generation, 1, page_of(250, 100));
        let mut uv = UniqueValues::new();
        uv.insert("defect_code".into(), vec!["A".into(), "B".into(), "C".into()]);
        let unique_generation = effects
            .iter()
            .find_map(|e| match e {
                Effect::FetchUniqueValues { generation, .. } => Some(*generation),
                _ => None,
            })
            .expect("unique values effect");
        state.apply_unique_values(unique_generation, uv);
        state
    }

    #[test]
    fn test_summary_view_does_not_fetch() {
        let mut state = loaded();
        assert!(state.data_request(1).is_none());
        assert!(state.toggle_sort("afvi_ai_gv").is_empty());
        assert!(state.refresh().is_none());
    }

    #[test]
    fn test_view_change_fetches_unique_and_schedules() {
        let mut state = loaded();
        let effects = state.set_view(ViewMode::RawUnit);
        assert_eq!(effects.len(), 2);
        match &effects[0] {
            Effect::FetchUniqueValues { mode, sorters, .. } => {
                assert_eq!(*mode, DataMode::Unit);
                assert_eq!(sorters, &vec!["S01".to_string(), "S02".to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(effects[1], Effect::Schedule { delay, .. } if delay == DEBOUNCE));
        assert!(state.has_pending());
    }

    #[test]
    fn test_burst_coalesces_to_latest_ticket() {
        let mut state = raw_view();
        let t1 = ticket_of(&state.toggle_filter_value("defect_code", "A"));
        let t2 = ticket_of(&state.toggle_filter_value("defect_code", "B"));
        assert!(state.fire(t1).is_none());
        let (_, request) = fetch_of(state.fire(t2));
        assert_eq!(request.page, 1);
        assert_eq!(request.filters.get("defect_code"), Some(&["C".to_string()][..]));
        assert!(state.fire(t2).is_none());
    }

    #[test]
    fn test_cancel_pending() {
        let mut state = raw_view();
        let ticket = ticket_of(&state.toggle_filter_value("defect_code", "A"));
        state.cancel_pending();
        assert!(state.fire(ticket).is_none());
    }

    #[test]
    fn test_sort_fetches_immediately() {
        let mut state = raw_view();
        let effects = state.toggle_sort("afvi_ai_gv");
        assert_eq!(effects.len(), 1);
        let (_, request) = fetch_of(effects.into_iter().next());
        assert_eq!(request.page, 1);
        assert_eq!(request.sort, Some(SortConfig::new("afvi_ai_gv", SortDirection::Asc)));

        assert!(state.toggle_sort("strip_id").is_empty());
    }

    #[test]
    fn test_sorter_change_resets_filters_and_sort() {
        let mut state = raw_view();
        state.toggle_filter_value("defect_code", "A");
        state.toggle_sort("afvi_ai_longest");
        assert!(!state.filters().is_empty());
        assert!(state.sort().is_active());

        let effects = state.toggle_sorter("S02");
        assert!(state.filters().is_empty());
        assert!(!state.sort().is_active());
        assert!(matches!(effects[0], Effect::FetchSummary { .. }));
        assert!(effects.iter().any(|e| matches!(e, Effect::FetchUniqueValues { .. })));
        assert!(effects.iter().any(|e| matches!(e, Effect::Schedule { .. })));
        assert_eq!(state.sorters().values(), vec!["S01".to_string()]);
    }

    #[test]
    fn test_sorter_change_in_summary_view_refreshes_summary_only() {
        let mut state = loaded();
        let effects = state.toggle_sorter("S01");
        assert_eq!(effects.len(), 1);
        assert!(matches!(&effects[0], Effect::FetchSummary { sorters, .. } if sorters == &vec!["S02".to_string()]));
    }

    #[test]
    fn test_stale_page_is_discarded() {
        let mut state = raw_view();
        let (old, _) = fetch_of(state.go_to_page(2));
        let (new, _) = fetch_of(state.go_to_page(3));
        assert!(state.apply_page(new, 3, page_of(250, 50)));
        assert!(!state.apply_page(old, 2, page_of(250, 100)));
        assert_eq!(state.page(), 3);
        assert_eq!(state.rows().len(), 50);
    }

    #[test]
    fn test_page_two_of_250() {
        let mut state = raw_view();
        let (generation, request) = fetch_of(state.go_to_page(2));
        assert_eq!((request.page, request.size), (2, 100));
        assert!(state.apply_page(generation, 2, page_of(250, 100)));
        assert_eq!(state.page(), 2);
        assert_eq!(state.total_pages(), 3);
        assert_eq!(pagination::row_range(state.page(), state.total(), PAGE_SIZE), Some((101, 200)));
        assert!(state.go_to_page(4).is_none());
    }

    #[test]
    fn test_refresh_clears_and_fetches_page_one() {
        let mut state = raw_view();
        state.toggle_filter_value("defect_code", "A");
        state.toggle_sort("afvi_ai_gv");
        let (_, request) = fetch_of(state.refresh());
        assert_eq!(request.page, 1);
        assert!(request.filters.is_empty());
        assert!(request.sort.is_none());
    }

    #[test]
    fn test_sort_supersedes_pending_filter_change() {
        let mut state = raw_view();
        let ticket = ticket_of(&state.toggle_filter_value("defect_code", "A"));
        let (_, request) = fetch_of(state.toggle_sort("afvi_ai_gv").into_iter().next());
        assert_eq!(request.filters.get("defect_code"), Some(&["B".to_string(), "C".to_string()][..]));
        assert!(!state.has_pending());
        assert!(state.fire(ticket).is_none(), "ソートの取得に含まれたので再取得しない");
    }

    #[test]
    fn test_refresh_supersedes_pending_filter_change() {
        let mut state = raw_view();
        let ticket = ticket_of(&state.toggle_filter_value("defect_code", "A"));
        assert!(state.refresh().is_some());
        assert!(!state.has_pending());
        assert!(state.fire(ticket).is_none());
    }

    #[test]
    fn test_full_selection_sends_no_filter() {
        let mut state = raw_view();
        state.set_filter("defect_code", vec!["A".into()]);
        let t = ticket_of(&state.set_filter(
            "defect_code",
            vec!["A".into(), "B".into(), "C".into()],
        ));
        let (_, request) = fetch_of(state.fire(t));
        assert_eq!(serde_json::to_value(&request.filters).unwrap(), json!({}));
    }

    #[test]
    fn test_request_wire_format() {
        let mut state = raw_view();
        state.toggle_sort("afvi_ai_gv");
        let request = state.data_request(1).unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "mode": "point",
                "page": 1,
                "size": 100,
                "sorters": ["S01", "S02"],
                "filters": {},
                "sort": {"field": "afvi_ai_gv", "direction": "asc"}
            })
        );
    }
}
