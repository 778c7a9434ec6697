//! 検索バーコンポーネント
//!
//! メーカー → 設備 → 品目 → ロット の連動セレクトと、期間+テキストのポップアップ検索。

use crate::app::{alert, use_app, AppContext};
use chrono::NaiveDate;
use leptos::prelude::*;
use leptos::task::spawn_local;
use pcb_inspect_common::cascade::{CascadeEffect, DateRange};
use pcb_inspect_common::{CascadeState, Vendor};

/// 連動セレクトの副作用を実行する
fn run_cascade(ctx: AppContext, cascade: RwSignal<CascadeState>, searching: RwSignal<bool>, effects: Vec<CascadeEffect>) {
    for effect in effects {
        match effect {
            CascadeEffect::ClearResults => ctx.set_results(Vec::new()),
            CascadeEffect::LoadMachines => spawn_local(async move {
                let machines = ctx.api().machines().await;
                cascade.try_update(|c| c.set_machines(machines.into_iter().map(|o| o.value).collect()));
            }),
            CascadeEffect::LoadItems { machine } => spawn_local(async move {
                let items = ctx.api().items(&machine).await;
                cascade.try_update(|c| c.set_items(&machine, items.into_iter().map(|o| o.value).collect()));
            }),
            CascadeEffect::LoadLots { item } => spawn_local(async move {
                let lots = ctx.api().lots(&item).await;
                cascade.try_update(|c| c.set_lots(&item, lots.into_iter().map(|o| o.value).collect()));
            }),
            CascadeEffect::Search(query) => {
                searching.set(true);
                spawn_local(async move {
                    let results = ctx.api().search(&query).await;
                    ctx.set_results(results);
                    searching.try_set(false);
                });
            }
        }
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

#[component]
pub fn FilterBar() -> impl IntoView {
    let ctx = use_app();
    let cascade = RwSignal::new(CascadeState::new());
    let searching = RwSignal::new(false);
    let popup_open = RwSignal::new(false);

    let run = move |effects: Vec<CascadeEffect>| run_cascade(ctx, cascade, searching, effects);

    let on_vendor = move |ev| {
        if let Ok(vendor) = event_target_value(&ev).parse::<Vendor>() {
            let effects = cascade.try_update(|c| c.select_vendor(vendor)).unwrap_or_default();
            run(effects);
        }
    };
    let on_machine = move |ev| {
        let value = event_target_value(&ev);
        let effects = cascade.try_update(|c| c.select_machine(value)).unwrap_or_default();
        run(effects);
    };
    let on_item = move |ev| {
        let value = event_target_value(&ev);
        let effects = cascade.try_update(|c| c.select_item(value)).unwrap_or_default();
        run(effects);
    };
    let on_lot = move |ev| {
        let value = event_target_value(&ev);
        let effects = cascade.try_update(|c| c.select_lot(value)).unwrap_or_default();
        run(effects);
    };

    let on_open_popup = move |_| {
        let today = chrono::Local::now().date_naive();
        if cascade.try_update(|c| c.open_popup(today)).unwrap_or(false) {
            popup_open.set(true);
        } else {
            alert("先にメーカーを選択してください");
        }
    };

    let options = move |values: Vec<String>, current: Option<String>| {
        values
            .into_iter()
            .map(|v| {
                let selected = current.as_deref() == Some(v.as_str());
                view! { <option value=v.clone() selected=selected>{v.clone()}</option> }
            })
            .collect_view()
    };

    view! {
        <div class="filter-bar card">
            <div class="form-group">
                <label>"メーカー"</label>
                <select on:change=on_vendor>
                    <option value="" disabled selected=move || cascade.with(|c| c.vendor().is_none())>"選択"</option>
                    {Vendor::ALL
                        .into_iter()
                        .map(|v| view! {
                            <option value=v.label() disabled=!v.is_supported()>{v.label()}</option>
                        })
                        .collect_view()}
                </select>
            </div>

            <div class="form-group">
                <label>"設備"</label>
                <select on:change=on_machine disabled=move || !cascade.with(|c| c.machine_enabled())>
                    <option value="" disabled selected=move || cascade.with(|c| c.machine().is_none())>"選択"</option>
                    {move || cascade.with(|c| options(c.machines().to_vec(), c.machine().map(str::to_string)))}
                </select>
            </div>

            <div class="form-group">
                <label>"品目"</label>
                <select on:change=on_item disabled=move || !cascade.with(|c| c.item_enabled())>
                    <option value="" disabled selected=move || cascade.with(|c| c.item().is_none())>"選択"</option>
                    {move || cascade.with(|c| options(c.items().to_vec(), c.item().map(str::to_string)))}
                </select>
            </div>

            <div class="form-group">
                <label>"ロット"</label>
                <select on:change=on_lot disabled=move || !cascade.with(|c| c.lot_enabled())>
                    <option value="" disabled selected=move || cascade.with(|c| c.lot().is_none())>"選択"</option>
                    {move || cascade.with(|c| options(c.lots().to_vec(), c.lot().map(str::to_string)))}
                </select>
            </div>

            <button class="btn btn-secondary" on:click=on_open_popup>"期間検索"</button>

            <Show when=move || searching.get()>
                <span class="text-muted">"検索中..."</span>
            </Show>

            <Show when=move || popup_open.get()>
                <SearchPopup
                    cascade=cascade
                    on_search=move |_| {
                        let query = cascade.with_untracked(|c| c.popup_query());
                        match query {
                            Some(query) => {
                                popup_open.set(false);
                                run(vec![CascadeEffect::Search(query)]);
                            }
                            None => alert("期間を指定してください"),
                        }
                    }
                    on_close=move |_| popup_open.set(false)
                />
            </Show>
        </div>
    }
}

#[component]
fn SearchPopup<FS, FC>(cascade: RwSignal<CascadeState>, on_search: FS, on_close: FC) -> impl IntoView
where
    FS: Fn(()) + 'static + Clone + Send + Sync,
    FC: Fn(()) + 'static + Clone + Send + Sync,
{
    let range = move || cascade.with(|c| c.popup_label().and_then(|l| DateRange::parse_label(&l)));
    let start = move || range().map(|r| r.start.to_string()).unwrap_or_default();
    let end = move || range().map(|r| r.end.to_string()).unwrap_or_default();

    let set_start = move |ev| {
        let Some(start) = parse_date(&event_target_value(&ev)) else {
            return;
        };
        cascade.update(|c| {
            let end = c
                .popup_label()
                .and_then(|l| DateRange::parse_label(&l))
                .map(|r| r.end.max(start))
                .unwrap_or(start);
            c.set_popup_range(DateRange { start, end });
        });
    };
    let set_end = move |ev| {
        let Some(end) = parse_date(&event_target_value(&ev)) else {
            return;
        };
        cascade.update(|c| {
            let start = c
                .popup_label()
                .and_then(|l| DateRange::parse_label(&l))
                .map(|r| r.start.min(end))
                .unwrap_or(end);
            c.set_popup_range(DateRange { start, end });
        });
    };

    view! {
        <div class="modal-backdrop">
            <div class="modal popup-search">
                <h3>"期間検索"</h3>
                <p class="text-muted">{move || cascade.with(|c| c.popup_label().unwrap_or_default())}</p>
                <div class="form-group">
                    <label>"開始日"</label>
                    <input type="date" prop:value=start on:change=set_start />
                </div>
                <div class="form-group">
                    <label>"終了日"</label>
                    <input type="date" prop:value=end on:change=set_end />
                </div>
                <div class="form-group">
                    <label>"テキスト"</label>
                    <input
                        type="text"
                        placeholder="ロット・品目など"
                        prop:value=move || cascade.with(|c| c.popup_text().to_string())
                        on:input=move |ev| cascade.update(|c| c.set_popup_text(event_target_value(&ev)))
                    />
                </div>
                <div class="modal-actions">
                    <button
                        class="btn btn-primary"
                        on:click={
                            let on_search = on_search.clone();
                            move |_| on_search(())
                        }
                    >
                        "検索"
                    </button>
                    <button
                        class="btn btn-tertiary"
                        on:click={
                            let on_close = on_close.clone();
                            move |_| on_close(())
                        }
                    >
                        "閉じる"
                    </button>
                </div>
            </div>
        </div>
    }
}
