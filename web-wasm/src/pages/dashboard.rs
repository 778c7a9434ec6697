//! 検索画面
//!
//! 検索バー・結果テーブル・作業リスト・分析チャートを並べる。

use crate::app::use_app;
use crate::components::{
    analysis_chart::AnalysisChart,
    export_dialog::ExportDialog,
    filter_bar::FilterBar,
    results_table::ResultsTable,
    selected_lots::SelectedLots,
};
use leptos::prelude::*;

#[component]
pub fn Dashboard() -> impl IntoView {
    let ctx = use_app();
    let (export_open, set_export_open) = signal(false);

    view! {
        <div class="dashboard">
            <FilterBar />

            <section class="card">
                <h2>"検索結果"</h2>
                <ResultsTable />
            </section>

            <section class="card">
                <div class="card-title">
                    <h2>"作業リスト"</h2>
                    <button
                        class="btn btn-primary btn-small"
                        disabled=move || ctx.working_set.with(|ws| ws.is_empty())
                        on:click=move |_| set_export_open.set(true)
                    >
                        "エクスポート"
                    </button>
                </div>
                <SelectedLots />
            </section>

            <section class="card">
                <h2>"分析チャート"</h2>
                <AnalysisChart />
            </section>

            <Show when=move || export_open.get()>
                <ExportDialog on_close=move |_| set_export_open.set(false) />
            </Show>
        </div>
    }
}
