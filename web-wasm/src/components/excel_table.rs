//! 詳細テーブル（Excel風フィルタ付き）
//!
//! 1ページ分の行を固定行高で仮想スクロールする。
//! フィルタ可能な列はヘッダから値を絞り込み、GV / Longest はクリックでソートする。

use crate::app::use_app;
use crate::pages::detail::DetailHandle;
use leptos::html::Div;
use leptos::prelude::*;
use pcb_inspect_common::filter::search_values;
use pcb_inspect_common::image::thumbnail_path;
use pcb_inspect_common::sort::{is_sortable, SortDirection};
use pcb_inspect_common::types::{column_label, RawRecord, COLUMNS_TO_SHOW, FILTERABLE_COLUMNS};

const ROW_HEIGHT: i32 = 36;
const VIEWPORT_HEIGHT: i32 = 540;
const OVERSCAN: usize = 8;

/// スクロール位置から描画する行の範囲を求める
fn visible_range(scroll_top: i32, len: usize) -> (usize, usize) {
    let first = (scroll_top.max(0) / ROW_HEIGHT) as usize;
    let start = first.saturating_sub(OVERSCAN).min(len);
    let count = (VIEWPORT_HEIGHT / ROW_HEIGHT) as usize + OVERSCAN * 2;
    (start, (start + count).min(len))
}

#[component]
pub fn ExcelTable<FI>(handle: DetailHandle, on_image: FI) -> impl IntoView
where
    FI: Fn(RawRecord) + 'static + Clone + Send + Sync,
{
    let ctx = use_app();
    let state = handle.state;
    let scroll_top = RwSignal::new(0i32);
    let open_filter = RwSignal::new(None::<&'static str>);
    let container = NodeRef::<Div>::new();

    // ページが変わったら先頭に戻す
    Effect::new(move |_| {
        state.with(|s| s.page());
        state.with(|s| s.rows().len());
        scroll_top.set(0);
        if let Some(el) = container.get_untracked() {
            el.set_scroll_top(0);
        }
    });

    let header_cell = move |column: &'static str| {
        let filterable = FILTERABLE_COLUMNS.contains(&column);
        let sortable = is_sortable(column);
        let arrow = move || match state.with(|s| s.sort().direction_for(column)) {
            Some(SortDirection::Asc) => " ▲",
            Some(SortDirection::Desc) => " ▼",
            None => "",
        };
        let filtered = move || state.with(|s| s.filters().is_filtered(column, s.values_for(column)));

        view! {
            <th class="excel-th">
                <span
                    class:sortable=sortable
                    on:click=move |_| {
                        if sortable {
                            handle.update(|s| s.toggle_sort(column));
                        }
                    }
                >
                    {column_label(column)}
                    {arrow}
                </span>
                {filterable.then(|| view! {
                    <button
                        class="filter-icon"
                        class:filtered=filtered
                        on:click=move |_| {
                            open_filter.update(|f| {
                                *f = if *f == Some(column) { None } else { Some(column) };
                            });
                        }
                    >
                        "▾"
                    </button>
                    <Show when=move || open_filter.get() == Some(column)>
                        <FilterDropdown handle=handle column=column on_close=move |_| open_filter.set(None) />
                    </Show>
                })}
            </th>
        }
    };

    let rows_view = move || {
        let scroll = scroll_top.get();
        state.with(|s| {
            let rows = s.rows();
            let (start, end) = visible_range(scroll, rows.len());
            let top = start as i32 * ROW_HEIGHT;
            let bottom = (rows.len() - end) as i32 * ROW_HEIGHT;
            let body = rows[start..end]
                .iter()
                .cloned()
                .map(|row| {
                    let on_image = on_image.clone();
                    let cells = COLUMNS_TO_SHOW
                        .into_iter()
                        .map(|column| {
                            if column == "image_path" {
                                let thumb = row.image_path().map(|p| ctx.api.with_value(|api| api.image_url(&thumbnail_path(p))));
                                let row = row.clone();
                                let on_image = on_image.clone();
                                view! {
                                    <td class="image-cell">
                                        {thumb.map(|src| view! {
                                            <img
                                                class="thumbnail"
                                                src=src
                                                loading="lazy"
                                                on:click=move |_| on_image(row.clone())
                                            />
                                        })}
                                    </td>
                                }
                                .into_any()
                            } else {
                                view! { <td>{row.cell_text(column)}</td> }.into_any()
                            }
                        })
                        .collect_view();
                    view! { <tr style=format!("height: {}px", ROW_HEIGHT)>{cells}</tr> }
                })
                .collect_view();

            view! {
                <tr class="spacer" style=format!("height: {}px", top)></tr>
                {body}
                <tr class="spacer" style=format!("height: {}px", bottom)></tr>
            }
        })
    };

    view! {
        <div
            class="excel-table-container"
            style=format!("max-height: {}px", VIEWPORT_HEIGHT)
            node_ref=container
            on:scroll=move |ev| {
                let el = event_target::<web_sys::Element>(&ev);
                scroll_top.set(el.scroll_top());
            }
        >
            <table class="data-table excel-table">
                <thead>
                    <tr>{COLUMNS_TO_SHOW.into_iter().map(header_cell).collect_view()}</tr>
                </thead>
                <tbody>
                    <Show
                        when=move || state.with(|s| !s.rows().is_empty())
                        fallback=|| view! { <tr><td colspan=COLUMNS_TO_SHOW.len()>"No Data"</td></tr> }
                    >
                        {rows_view.clone()}
                    </Show>
                </tbody>
            </table>
        </div>
    }
}

/// 列フィルタのドロップダウン
#[component]
fn FilterDropdown<FC>(handle: DetailHandle, column: &'static str, on_close: FC) -> impl IntoView
where
    FC: Fn(()) + 'static + Clone + Send + Sync,
{
    let state = handle.state;
    let search = RwSignal::new(String::new());

    let candidates = move || {
        let needle = search.get();
        state.with(|s| {
            let all = s.values_for(column);
            let selected = s.filters().effective(column, all);
            search_values(all, &needle)
                .into_iter()
                .map(|v| (v.to_string(), selected.contains(&v)))
                .collect::<Vec<_>>()
        })
    };
    let all_selected = move || {
        let needle = search.get();
        state.with(|s| s.filters().is_all_selected(column, s.values_for(column), &needle))
    };

    view! {
        <div class="filter-dropdown" on:click=|ev| ev.stop_propagation()>
            <input
                type="text"
                placeholder="検索"
                prop:value=move || search.get()
                on:input=move |ev| search.set(event_target_value(&ev))
            />
            <label class="checkbox select-all">
                <input
                    type="checkbox"
                    prop:checked=all_selected
                    on:change=move |_| {
                        let needle = search.get_untracked();
                        handle.update(|s| s.toggle_filter_all(column, &needle));
                    }
                />
                "(すべて選択)"
            </label>
            <div class="filter-values">
                {move || {
                    candidates()
                        .into_iter()
                        .map(|(value, checked)| {
                            let toggled = value.clone();
                            view! {
                                <label class="checkbox">
                                    <input
                                        type="checkbox"
                                        prop:checked=checked
                                        on:change=move |_| {
                                            let value = toggled.clone();
                                            handle.update(move |s| s.toggle_filter_value(column, &value));
                                        }
                                    />
                                    {value}
                                </label>
                            }
                        })
                        .collect_view()
                }}
            </div>
            <button
                class="btn btn-small"
                on:click={
                    let on_close = on_close.clone();
                    move |_| on_close(())
                }
            >
                "閉じる"
            </button>
        </div>
    }
}
