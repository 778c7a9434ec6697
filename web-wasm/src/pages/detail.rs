//! ロット詳細画面
//!
//! `DetailState` の `Effect` をここで実行する。デバウンスは gloo の Timeout で待ち、
//! 新しい予約が入ったら前の Timeout を捨てる。取得結果は世代が古ければ状態側で捨てられる。

use crate::api::pms::{warn, PmsApi};
use crate::app::use_app;
use crate::components::{
    excel_table::ExcelTable,
    image_modal::ImageModal,
    pagination::Pagination,
    summary_view::SummaryView,
};
use gloo::timers::callback::Timeout;
use leptos::prelude::*;
use leptos::task::spawn_local;
use pcb_inspect_common::detail::{DetailState, Effect, ViewMode};
use pcb_inspect_common::pagination::{row_range, PAGE_SIZE};
use pcb_inspect_common::sorter::ALL;
use pcb_inspect_common::types::RawRecord;
use pcb_inspect_common::LotId;

/// 詳細画面の状態と副作用の実行先
#[derive(Clone, Copy)]
pub struct DetailHandle {
    api: StoredValue<PmsApi>,
    pub state: RwSignal<DetailState>,
    timer: StoredValue<Option<Timeout>, LocalStorage>,
}

impl DetailHandle {
    /// 状態を変更して返された副作用を実行する
    pub fn update(self, f: impl FnOnce(&mut DetailState) -> Vec<Effect>) {
        let effects = self.state.try_update(f).unwrap_or_default();
        for effect in effects {
            self.execute(effect);
        }
    }

    pub fn update_one(self, f: impl FnOnce(&mut DetailState) -> Option<Effect>) {
        if let Some(effect) = self.state.try_update(f).flatten() {
            self.execute(effect);
        }
    }

    fn lot_id(self) -> LotId {
        self.state.with_untracked(|s| s.lot_id())
    }

    fn execute(self, effect: Effect) {
        match effect {
            Effect::Schedule { ticket, delay } => {
                let timeout = Timeout::new(delay.as_millis() as u32, move || {
                    self.update_one(|s| s.fire(ticket));
                });
                // 前の Timeout は drop で解除される
                self.timer.try_set_value(Some(timeout));
            }
            Effect::FetchPage { generation, request } => spawn_local(async move {
                let page = request.page;
                match self.api.get_value().detail_data(self.lot_id(), &request).await {
                    Ok(data) => {
                        self.state.try_update(|s| s.apply_page(generation, page, data));
                    }
                    Err(e) => {
                        warn(&format!("データの取得に失敗: {:?}", e));
                        self.state.try_update(|s| s.apply_page_error(generation));
                    }
                }
            }),
            Effect::FetchUniqueValues { generation, mode, sorters } => spawn_local(async move {
                match self.api.get_value().unique_values(self.lot_id(), mode, &sorters).await {
                    Ok(values) => {
                        self.state.try_update(|s| s.apply_unique_values(generation, values));
                    }
                    Err(e) => warn(&format!("ユニーク値の取得に失敗: {:?}", e)),
                }
            }),
            Effect::FetchSummary { generation, sorters } => spawn_local(async move {
                match self.api.get_value().detail_summary(self.lot_id(), &sorters).await {
                    Ok(summary) => {
                        self.state.try_update(|s| s.apply_summary(generation, Some(summary)));
                    }
                    Err(e) => warn(&format!("サマリの取得に失敗: {:?}", e)),
                }
            }),
        }
    }

    /// 保留中のデバウンスを捨てる
    fn cancel_pending(self) {
        self.timer.try_set_value(None);
        self.state.try_update(|s| s.cancel_pending());
    }
}

#[component]
pub fn DetailPage(lot_id: LotId) -> impl IntoView {
    let ctx = use_app();
    let handle = DetailHandle {
        api: ctx.api,
        state: RwSignal::new(DetailState::new(lot_id)),
        timer: StoredValue::new_local(None),
    };
    let state = handle.state;
    let load_error = RwSignal::new(None::<String>);
    let image_row = RwSignal::new(None::<RawRecord>);

    // ヘッダは必須。サマリとソーターは取れなければ空で表示する
    spawn_local(async move {
        let api = ctx.api();
        let header = match api.detail_header(lot_id).await {
            Ok(h) => h,
            Err(e) => {
                warn(&format!("ヘッダの取得に失敗: {:?}", e));
                load_error.try_set(Some(format!("ロット {} を読み込めませんでした", lot_id)));
                return;
            }
        };
        let summary = api.detail_summary(lot_id, &[]).await.ok();
        let sorters = api.detail_sorters(lot_id).await;
        state.try_update(|s| s.on_loaded(Some(header), summary, sorters));
    });

    on_cleanup(move || handle.cancel_pending());

    let view_mode = move || state.with(|s| s.view());
    let is_data_view = move || view_mode().data_mode().is_some();

    let header_info = move || {
        state.with(|s| {
            s.header().map(|h| {
                let items = [
                    ("LOT", h.lot.clone()),
                    ("Machine", h.machine.clone().unwrap_or_default()),
                    ("Customer", h.customer.clone().unwrap_or_default()),
                    ("Itemcode", h.itemcode.clone().unwrap_or_default()),
                    ("Version", h.version.clone().unwrap_or_default()),
                    ("AI Date", h.ai_date_time.clone().unwrap_or_default()),
                ];
                items
                    .into_iter()
                    .map(|(k, v)| view! { <div class="info-item"><span class="info-key">{k}</span><span>{v}</span></div> })
                    .collect_view()
            })
        })
    };

    let sorter_options = move || {
        state.with(|s| {
            std::iter::once(ALL.to_string())
                .chain(s.sorters().options().iter().map(|o| o.value.clone()))
                .collect::<Vec<_>>()
        })
    };

    let row_info = move || {
        state.with(|s| match row_range(s.page(), s.total(), PAGE_SIZE) {
            Some((start, end)) => format!("{}-{} / {}件 (Page {})", start, end, s.total(), s.page()),
            None => "0件".to_string(),
        })
    };

    view! {
        <div class="detail-page">
            <Show
                when=move || load_error.get().is_none()
                fallback=move || view! { <p class="error">{move || load_error.get().unwrap_or_default()}</p> }
            >
                <section class="card detail-header">
                    <Show
                        when=move || state.with(|s| s.header().is_some())
                        fallback=|| view! { <p class="text-muted">"読み込み中..."</p> }
                    >
                        <div class="info-grid">{header_info}</div>
                    </Show>
                </section>

                <section class="card">
                    <div class="view-tabs">
                        {ViewMode::ALL
                            .into_iter()
                            .map(|mode| view! {
                                <button
                                    class="chart-tab"
                                    class:active=move || view_mode() == mode
                                    on:click=move |_| handle.update(|s| s.set_view(mode))
                                >
                                    {mode.label()}
                                </button>
                            })
                            .collect_view()}
                    </div>

                    <div class="sorter-select">
                        <span class="info-key">"Sorter"</span>
                        {move || {
                            sorter_options()
                                .into_iter()
                                .map(|value| {
                                    let checked = {
                                        let value = value.clone();
                                        move || state.with(|s| s.sorters().is_selected(&value))
                                    };
                                    let toggled = value.clone();
                                    view! {
                                        <label class="checkbox">
                                            <input
                                                type="checkbox"
                                                prop:checked=checked
                                                on:change=move |_| {
                                                    let value = toggled.clone();
                                                    handle.update(move |s| s.toggle_sorter(&value));
                                                }
                                            />
                                            {value}
                                        </label>
                                    }
                                })
                                .collect_view()
                        }}
                    </div>

                    <Show
                        when=is_data_view
                        fallback=move || view! { <SummaryView summary=Signal::derive(move || state.with(|s| s.summary().cloned())) /> }
                    >
                        <div class="table-toolbar">
                            <span class="text-muted">{row_info}</span>
                            <Show when=move || state.with(|s| s.is_loading())>
                                <span class="text-muted">"読み込み中..."</span>
                            </Show>
                            <button
                                class="btn btn-tertiary btn-small"
                                disabled=move || state.with(|s| s.filters().is_empty())
                                on:click=move |_| handle.update(|s| s.clear_filters())
                            >
                                "フィルタ解除"
                            </button>
                            <button
                                class="btn btn-secondary btn-small"
                                on:click=move |_| handle.update_one(|s| s.refresh())
                            >
                                "更新"
                            </button>
                        </div>
                        <ExcelTable handle=handle on_image=move |row| image_row.set(Some(row)) />
                        <Pagination
                            page=Signal::derive(move || state.with(|s| s.page()))
                            total_pages=Signal::derive(move || state.with(|s| s.total_pages()))
                            on_page=move |p| handle.update_one(|s| s.go_to_page(p))
                        />
                    </Show>
                </section>
            </Show>

            <Show when=move || image_row.with(|r| r.is_some())>
                <ImageModal
                    row=Signal::derive(move || image_row.get())
                    on_close=move |_| image_row.set(None)
                />
            </Show>
        </div>
    }
}
