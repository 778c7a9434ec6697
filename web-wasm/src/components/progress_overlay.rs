//! グローバル進捗オーバーレイ
//!
//! 進捗ストアの一覧をバーで表示し、各行から中断できる。

use crate::app::use_app;
use leptos::prelude::*;
use pcb_inspect_common::progress::format_bytes;

#[component]
pub fn ProgressOverlay() -> impl IntoView {
    let ctx = use_app();

    view! {
        <Show when=move || ctx.progress_views.with(|v| !v.is_empty())>
            <div class="progress-overlay">
                <For
                    each=move || ctx.progress_views.get()
                    key=|view| view.id
                    children=move |view| {
                        let id = view.id;
                        let current = move || ctx.progress_views.with(|v| v.iter().find(|p| p.id == id).cloned());
                        let progress = move || current().map(|p| p.progress).unwrap_or(0.0);
                        let bytes = move || current().map(|p| p.bytes).unwrap_or(0);
                        view! {
                            <div class="progress-container">
                                <div class="progress-header">
                                    <span class="progress-label">{view.label.clone()}</span>
                                    <button
                                        class="btn btn-tertiary btn-small"
                                        disabled={move || progress() >= 100.0}
                                        on:click=move |_| {
                                            ctx.progress.update_value(|store| {
                                                store.cancel(id);
                                            });
                                        }
                                    >
                                        "中断"
                                    </button>
                                </div>
                                <div class="progress-bar">
                                    <div class="progress-fill" style=move || format!("width: {}%", progress()) />
                                </div>
                                <p class="progress-text">
                                    {move || format!("{:.0}% ({})", progress(), format_bytes(bytes()))}
                                </p>
                            </div>
                        }
                    }
                />
            </div>
        </Show>
    }
}
