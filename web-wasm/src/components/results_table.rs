//! 検索結果テーブル
//!
//! チェックで作業リストに入れる。上限を超える変更は丸ごと取り消して警告する。

use crate::app::{alert, use_app, Route};
use crate::components::pagination::Pagination;
use leptos::prelude::*;
use pcb_inspect_common::pagination::total_pages;
use pcb_inspect_common::{Lot, LotId};

/// 1ページの表示件数
const RESULTS_PAGE_SIZE: u32 = 20;

#[component]
pub fn ResultsTable() -> impl IntoView {
    let ctx = use_app();
    let page = RwSignal::new(1u32);

    // 新しい検索結果で1ページ目に戻す
    Effect::new(move |_| {
        ctx.results.track();
        page.set(1);
    });

    let pages = Signal::derive(move || ctx.results.with(|r| total_pages(r.len() as u64, RESULTS_PAGE_SIZE)));
    let visible = move || {
        ctx.results.with(|r| {
            let start = ((page.get() - 1) * RESULTS_PAGE_SIZE) as usize;
            r.iter().skip(start).take(RESULTS_PAGE_SIZE as usize).cloned().collect::<Vec<Lot>>()
        })
    };

    let toggle = move |id: LotId| {
        let mut selected = ctx.working_set.with_untracked(|ws| ws.highlighted().to_vec());
        if let Some(pos) = selected.iter().position(|s| *s == id) {
            selected.remove(pos);
        } else {
            selected.push(id);
        }
        let result = ctx
            .results
            .with_untracked(|results| ctx.working_set.try_update(|ws| ws.apply_selection(results, &selected)));
        if let Some(Err(e)) = result {
            alert(&e.to_string());
        }
    };

    view! {
        <Show
            when=move || ctx.results.with(|r| !r.is_empty())
            fallback=|| view! { <p class="text-muted">"検索結果がありません"</p> }
        >
            <table class="data-table results-table">
                <thead>
                    <tr>
                        <th></th>
                        <th>"ID"</th>
                        <th>"Lot"</th>
                        <th>"Itemcode"</th>
                        <th>"Version"</th>
                        <th>"Customer"</th>
                        <th>"Machine"</th>
                        <th>"Sorter"</th>
                        <th>"AI Date"</th>
                    </tr>
                </thead>
                <tbody>
                    <For
                        each=visible
                        key=|lot| lot.id
                        children=move |lot| {
                            let id = lot.id;
                            let checked = move || ctx.working_set.with(|ws| ws.highlighted().contains(&id));
                            view! {
                                <tr class:selected=checked>
                                    <td>
                                        <input type="checkbox" prop:checked=checked on:change=move |_| toggle(id) />
                                    </td>
                                    <td>{id}</td>
                                    <td>
                                        <a class="lot-link" on:click=move |_| ctx.route.set(Route::Detail(id))>
                                            {lot.lot.clone()}
                                        </a>
                                    </td>
                                    <td>{lot.itemcode.clone().unwrap_or_default()}</td>
                                    <td>{lot.version.clone().unwrap_or_default()}</td>
                                    <td>{lot.customer.clone().unwrap_or_default()}</td>
                                    <td>{lot.machine.clone().unwrap_or_default()}</td>
                                    <td>{lot.trial.clone().unwrap_or_default()}</td>
                                    <td>{lot.inspection_date().to_string()}</td>
                                </tr>
                            }
                        }
                    />
                </tbody>
            </table>
            <Pagination page=page total_pages=pages on_page=move |p| page.set(p) />
        </Show>
    }
}
