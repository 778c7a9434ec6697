//! 分析チャート
//!
//! 作業リストの集計を取得し、グループ別に Chart.js で描画する。
//! 指標は最大2つ。1つだけなら棒/折れ線を選べる。

use crate::app::{alert, use_app};
use crate::export::js_bindings::{destroy_chart, render_chart};
use leptos::prelude::*;
use leptos::task::spawn_local;
use pcb_inspect_common::chart::MAX_ACTIVE_METRICS;
use pcb_inspect_common::{AnalysisOptions, ChartSpec, GraphType, GroupBy, Metric, MultiSummary};

const CANVAS_ID: &str = "analysis-chart";

#[component]
pub fn AnalysisChart() -> impl IntoView {
    let ctx = use_app();
    let options = RwSignal::new(AnalysisOptions::default());
    let applied = RwSignal::new(None::<AnalysisOptions>);
    let group_by = RwSignal::new(GroupBy::Lot);
    let single = RwSignal::new(GraphType::Bar);
    let summaries = RwSignal::new(Vec::<MultiSummary>::new());
    let loading = RwSignal::new(false);

    let on_toggle = move |metric: Metric| {
        if let Some(Err(_)) = options.try_update(|o| o.toggle(metric)) {
            alert(&format!("分析オプションは最大{}つまでです", MAX_ACTIVE_METRICS));
        }
    };

    let on_analyze = move |_| {
        let opts = options.get_untracked();
        if let Err(e) = opts.validate() {
            alert(&e.to_string());
            return;
        }
        let ids = ctx.working_set.with_untracked(|ws| ws.ids());
        if ids.is_empty() {
            alert("作業リストが空です");
            return;
        }
        if opts.selected().len() == 1 {
            single.set(GraphType::Bar);
        }

        loading.set(true);
        spawn_local(async move {
            let data = ctx.api().summary_multi(&ids).await;
            summaries.try_set(data);
            applied.try_set(Some(opts));
            loading.try_set(false);
        });
    };

    // 集計・グループ・描画タイプが変わるたびに描き直す
    Effect::new(move |_| {
        let Some(opts) = applied.get() else {
            return;
        };
        let group = group_by.get();
        let graph_type = single.get();
        summaries.with(|s| {
            if s.is_empty() {
                destroy_chart(CANVAS_ID);
                return;
            }
            let spec = ChartSpec::build(s, group, &opts, graph_type);
            if let Err(e) = render_chart(CANVAS_ID, &spec) {
                web_sys::console::warn_1(&e);
            }
        });
    });
    on_cleanup(|| destroy_chart(CANVAS_ID));

    let is_single = move || applied.get().map(|o| o.selected().len() == 1).unwrap_or(false);
    let no_data = move || applied.get().is_some() && summaries.with(|s| s.is_empty()) && !loading.get();

    view! {
        <div class="analysis-chart">
            <div class="analysis-options">
                {Metric::ALL
                    .into_iter()
                    .map(|metric| view! {
                        <label class="checkbox">
                            <input
                                type="checkbox"
                                prop:checked=move || options.with(|o| o.is_active(metric))
                                on:change=move |_| on_toggle(metric)
                            />
                            {metric.label()}
                        </label>
                    })
                    .collect_view()}
                <button
                    class="btn btn-primary btn-small"
                    disabled=move || loading.get() || ctx.working_set.with(|ws| ws.is_empty())
                    on:click=on_analyze
                >
                    {move || if loading.get() { "分析中..." } else { "分析" }}
                </button>
            </div>

            <Show when=move || applied.get().is_some()>
                <div class="chart-tabs">
                    {GroupBy::ALL
                        .into_iter()
                        .map(|g| view! {
                            <button
                                class="chart-tab"
                                class:active=move || group_by.get() == g
                                on:click=move |_| group_by.set(g)
                            >
                                {g.label()}
                            </button>
                        })
                        .collect_view()}
                </div>
                <Show when=is_single>
                    <div class="graph-toggle">
                        <label>"Type:"</label>
                        <select on:change=move |ev| {
                            if let Ok(t) = event_target_value(&ev).parse::<GraphType>() {
                                single.set(t);
                            }
                        }>
                            <option value="bar" selected=move || single.get() == GraphType::Bar>"Bar"</option>
                            <option value="line" selected=move || single.get() == GraphType::Line>"Line"</option>
                        </select>
                    </div>
                </Show>
            </Show>

            <Show when=no_data>
                <p class="text-muted">"No Data"</p>
            </Show>
            <div class="chart-container" class:hidden=move || applied.get().is_none() || no_data()>
                <canvas id=CANVAS_ID></canvas>
            </div>
        </div>
    }
}
