//! 詳細サマリ
//!
//! セクションごとの表と横棒。選択したセクションを先頭に出す。
//! UNK結果の行をクリックするとその不良内訳を表示する。

use leptos::prelude::*;
use pcb_inspect_common::summary::{chart_rows, ordered_sections, parse_rate, unk_breakdown, Section};
use pcb_inspect_common::types::{LotSummary, SummaryRow};

fn rows_view(headers: [&'static str; 3], rows: Vec<SummaryRow>) -> impl IntoView {
    view! {
        <table class="data-table summary-table">
            <thead>
                <tr>{headers.into_iter().map(|h| view! { <th>{h}</th> }).collect_view()}</tr>
            </thead>
            <tbody>
                {rows
                    .into_iter()
                    .map(|r| view! {
                        <tr class:total=r.is_total()>
                            <td>{r.key().to_string()}</td>
                            <td>{r.count}</td>
                            <td>{r.rate.clone()}</td>
                        </tr>
                    })
                    .collect_view()}
            </tbody>
        </table>
    }
}

fn bars_view(section: Section, summary: &LotSummary) -> impl IntoView {
    let rows = chart_rows(summary, section);
    let max = rows.iter().map(|r| r.count).max().unwrap_or(0).max(1);
    rows.into_iter()
        .enumerate()
        .map(|(i, r)| {
            let width = if matches!(section, Section::Rate | Section::UnitRate) {
                parse_rate(&r.rate).clamp(0.0, 100.0)
            } else {
                r.count as f64 / max as f64 * 100.0
            };
            let style = format!("width: {:.1}%; background: {}", width, section.bar_color(r, i));
            view! {
                <div class="bar-row">
                    <span class="bar-label">{r.key().to_string()}</span>
                    <div class="bar-track"><div class="bar-fill" style=style /></div>
                    <span class="bar-value">{r.rate.clone()}</span>
                </div>
            }
        })
        .collect_view()
}

#[component]
pub fn SummaryView(#[prop(into)] summary: Signal<Option<LotSummary>>) -> impl IntoView {
    let selected = RwSignal::new(Section::default());
    let unk_category = RwSignal::new(None::<String>);

    let section_view = move |section: Section, summary: &LotSummary| {
        let rows = section.rows(summary).to_vec();
        let table = if section == Section::UnkResult {
            view! {
                <table class="data-table summary-table">
                    <thead>
                        <tr>{section.headers().into_iter().map(|h| view! { <th>{h}</th> }).collect_view()}</tr>
                    </thead>
                    <tbody>
                        {rows
                            .into_iter()
                            .map(|r| {
                                let key = r.key().to_string();
                                let clickable = !r.is_total();
                                view! {
                                    <tr
                                        class:clickable=clickable
                                        class:active={
                                            let key = key.clone();
                                            move || unk_category.get().as_deref() == Some(key.as_str())
                                        }
                                        on:click={
                                            let key = key.clone();
                                            move |_| {
                                                if clickable {
                                                    unk_category.set(Some(key.clone()));
                                                }
                                            }
                                        }
                                    >
                                        <td>{key.clone()}</td>
                                        <td>{r.count}</td>
                                        <td>{r.rate.clone()}</td>
                                    </tr>
                                }
                            })
                            .collect_view()}
                    </tbody>
                </table>
            }
            .into_any()
        } else {
            rows_view(section.headers(), rows).into_any()
        };

        view! {
            <div class="summary-section" class:selected=move || selected.get() == section>
                <h3 class="clickable" on:click=move |_| selected.set(section)>{section.title()}</h3>
                <div class="summary-body">
                    {table}
                    <div class="summary-bars">{bars_view(section, summary)}</div>
                </div>
            </div>
        }
    };

    let breakdown = move || {
        let category = unk_category.get()?;
        let rows = summary.with(|s| s.as_ref().map(|s| unk_breakdown(s, &category).to_vec()))?;
        Some(view! {
            <div class="summary-section unk-breakdown">
                <h3>{format!("UNK: {}", category)}</h3>
                {if rows.is_empty() {
                    view! { <p class="text-muted">"内訳がありません"</p> }.into_any()
                } else {
                    rows_view(["Defect", "Count", "Rate"], rows).into_any()
                }}
            </div>
        })
    };

    view! {
        <Show
            when=move || summary.with(|s| s.is_some())
            fallback=|| view! { <p class="text-muted">"サマリがありません"</p> }
        >
            <div class="summary-view">
                {move || {
                    summary.with(|s| {
                        s.as_ref().map(|s| {
                            ordered_sections(selected.get())
                                .into_iter()
                                .map(|section| section_view(section, s))
                                .collect_view()
                        })
                    })
                }}
                {breakdown}
            </div>
        </Show>
    }
}
