//! ヘッダーコンポーネント

use crate::app::{use_app, Route};
use leptos::prelude::*;

#[component]
pub fn Header() -> impl IntoView {
    let ctx = use_app();
    let in_detail = move || matches!(ctx.route.get(), Route::Detail(_));

    view! {
        <header class="header">
            <h1>"PCB AI Inspection Dashboard"</h1>
            <div class="header-actions">
                <Show when=in_detail>
                    <button class="btn btn-secondary btn-small" on:click=move |_| ctx.route.set(Route::Search)>
                        "← 検索に戻る"
                    </button>
                </Show>
                <span class="working-count">
                    {move || format!("作業リスト: {}件", ctx.working_set.with(|ws| ws.len()))}
                </span>
                <button
                    class="btn btn-tertiary btn-small theme-toggle"
                    on:click=move |_| ctx.theme.update(|t| *t = t.toggle())
                >
                    {move || if ctx.theme.get().is_dark() { "☀ ライト" } else { "☾ ダーク" }}
                </button>
            </div>
        </header>
    }
}
