//! 作業リストの一覧

use crate::app::{confirm, use_app};
use leptos::prelude::*;

#[component]
pub fn SelectedLots() -> impl IntoView {
    let ctx = use_app();

    view! {
        <Show
            when=move || ctx.working_set.with(|ws| !ws.is_empty())
            fallback=|| view! { <p class="text-muted">"ロットが選択されていません"</p> }
        >
            <ul class="selected-lots">
                <For
                    each=move || ctx.working_set.with(|ws| ws.lots().to_vec())
                    key=|lot| lot.id
                    children=move |lot| {
                        let id = lot.id;
                        view! {
                            <li>
                                <span class="lot-name">{lot.lot.clone()}</span>
                                <span class="text-muted">
                                    {format!(" {} / {}", lot.itemcode.clone().unwrap_or_default(), lot.version.clone().unwrap_or_default())}
                                </span>
                                <button
                                    class="btn btn-tertiary btn-small"
                                    on:click=move |_| {
                                        ctx.working_set.update(|ws| {
                                            ws.remove(id);
                                        });
                                    }
                                >
                                    "×"
                                </button>
                            </li>
                        }
                    }
                />
            </ul>
            <button class="btn btn-tertiary btn-small" on:click=move |_| {
                if confirm("すべてのロットを作業リストから外しますか？") {
                    ctx.working_set.update(|ws| ws.clear());
                }
            }>
                "すべて外す"
            </button>
        </Show>
    }
}
