//! 不良画像モーダル
//!
//! Axial / Pad / 無印 の画像候補と、行にファイル名があればガーバー画像を並べる。
//! 読み込めなかった候補は表示しない。

use crate::api::pms::warn;
use crate::app::use_app;
use leptos::prelude::*;
use leptos::task::spawn_local;
use pcb_inspect_common::image::{modal_candidates, GerberQuery};
use pcb_inspect_common::types::RawRecord;

#[component]
pub fn ImageModal<FC>(#[prop(into)] row: Signal<Option<RawRecord>>, on_close: FC) -> impl IntoView
where
    FC: Fn(()) + 'static + Clone + Send + Sync,
{
    let ctx = use_app();
    let failed = RwSignal::new(Vec::<String>::new());
    let gerber = RwSignal::new(None::<String>);

    // 行が変わるたびにガーバー画像を取り直す
    Effect::new(move |_| {
        failed.set(Vec::new());
        gerber.set(None);
        let Some(query) = row.with(|r| r.as_ref().and_then(GerberQuery::from_record)) else {
            return;
        };
        spawn_local(async move {
            match ctx.api().gerber(&query).await {
                Ok(image) => {
                    gerber.try_set(image.data_url());
                }
                Err(e) => warn(&format!("ガーバー画像の取得に失敗: {:?}", e)),
            }
        });
    });

    let candidates = move || {
        row.with(|r| {
            r.as_ref()
                .and_then(|r| r.image_path())
                .map(modal_candidates)
                .unwrap_or_default()
        })
    };

    let title = move || {
        row.with(|r| {
            r.as_ref()
                .map(|r| format!("{} / {}", r.cell_text("strip_id"), r.cell_text("afvi_ai_defect")))
                .unwrap_or_default()
        })
    };

    view! {
        <div
            class="modal-backdrop"
            on:click={
                let on_close = on_close.clone();
                move |_| on_close(())
            }
        >
            <div class="modal image-modal" on:click=|ev| ev.stop_propagation()>
                <div class="modal-title">
                    <h3>{title}</h3>
                    <button
                        class="btn btn-tertiary btn-small"
                        on:click={
                            let on_close = on_close.clone();
                            move |_| on_close(())
                        }
                    >
                        "×"
                    </button>
                </div>
                <div class="image-grid">
                    {move || {
                        candidates()
                            .into_iter()
                            .filter(|c| failed.with(|f| !f.contains(&c.path)))
                            .map(|c| {
                                let src = ctx.api.with_value(|api| api.image_url(&c.path));
                                let path = c.path.clone();
                                view! {
                                    <figure>
                                        <img
                                            src=src
                                            on:error=move |_| failed.update(|f| f.push(path.clone()))
                                        />
                                        <figcaption>{c.label}</figcaption>
                                    </figure>
                                }
                            })
                            .collect_view()
                    }}
                    {move || gerber.get().map(|src| view! {
                        <figure>
                            <img src=src />
                            <figcaption>"Gerber"</figcaption>
                        </figure>
                    })}
                </div>
                <Show when=move || candidates().iter().all(|c| failed.with(|f| f.contains(&c.path))) && gerber.with(|g| g.is_none())>
                    <p class="text-muted">"画像がありません"</p>
                </Show>
            </div>
        </div>
    }
}
