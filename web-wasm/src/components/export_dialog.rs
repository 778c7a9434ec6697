//! エクスポートダイアログ
//!
//! 作業リストと出力内容を送ってストリームで受け取り、ブラウザに保存させる。
//! 進捗と中断はグローバルの進捗オーバーレイから行う。

use crate::api::download::download_export;
use crate::api::pms::warn;
use crate::app::{alert, use_app};
use leptos::prelude::*;
use leptos::task::spawn_local;
use pcb_inspect_common::{ExportOptions, ExportRequest};
use wasm_bindgen::JsValue;

fn option_label(key: &str) -> &'static str {
    match key {
        "rawdata" => "Raw Data",
        "summary" => "Summary",
        "overkill" => "Overkill",
        "underkill" => "Underkill",
        _ => "",
    }
}

/// fetch の中断による失敗か
fn is_abort(e: &JsValue) -> bool {
    js_sys::Reflect::get(e, &JsValue::from_str("name"))
        .ok()
        .and_then(|n| n.as_string())
        .is_some_and(|n| n == "AbortError")
}

#[component]
pub fn ExportDialog<FC>(on_close: FC) -> impl IntoView
where
    FC: Fn(()) + 'static + Clone + Send + Sync,
{
    let ctx = use_app();
    let options = RwSignal::new(ExportOptions::default());

    let on_download = {
        let on_close = on_close.clone();
        move |_| {
            let opts = options.get_untracked();
            if opts.is_empty() {
                alert("出力する内容を選択してください");
                return;
            }
            let request = ctx.working_set.with_untracked(|ws| ExportRequest::new(ws.lots(), opts));
            on_close(());

            spawn_local(async move {
                match download_export(&ctx.api(), &request, ctx.progress).await {
                    Ok(filename) => web_sys::console::log_1(&JsValue::from_str(&format!("saved {}", filename))),
                    Err(e) if is_abort(&e) => warn("エクスポートを中断しました"),
                    Err(e) => {
                        web_sys::console::error_1(&e);
                        alert("エクスポートに失敗しました");
                    }
                }
            });
        }
    };

    view! {
        <div class="modal-backdrop">
            <div class="modal export-dialog">
                <h3>"エクスポート"</h3>
                <p class="text-muted">{move || format!("{}件のロット", ctx.working_set.with(|ws| ws.len()))}</p>
                <div class="export-options">
                    {ExportOptions::KEYS
                        .into_iter()
                        .map(|key| view! {
                            <label class="checkbox">
                                <input
                                    type="checkbox"
                                    prop:checked=move || options.with(|o| o.get(key))
                                    on:change=move |_| {
                                        options.update(|o| {
                                            let _ = o.toggle(key);
                                        });
                                    }
                                />
                                {option_label(key)}
                            </label>
                        })
                        .collect_view()}
                </div>
                <div class="modal-actions">
                    <button
                        class="btn btn-primary"
                        disabled=move || options.with(|o| o.is_empty())
                        on:click=on_download
                    >
                        "ダウンロード"
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
