//! ページネーションコンポーネント

use leptos::prelude::*;
use pcb_inspect_common::pagination::{can_prev, page_items, PageItem};

fn next_disabled(page: u32, total_pages: u32) -> bool {
    page >= total_pages
}

/// ページボタン。1ページ以下なら何も出さない
#[component]
pub fn Pagination<FP>(
    #[prop(into)] page: Signal<u32>,
    #[prop(into)] total_pages: Signal<u32>,
    on_page: FP,
) -> impl IntoView
where
    FP: Fn(u32) + 'static + Clone + Send + Sync,
{
    let items = move || page_items(page.get(), total_pages.get());

    view! {
        <Show when=move || !items().is_empty()>
            <nav class="pagination">
                <button
                    class="btn btn-small"
                    disabled={move || !can_prev(page.get())}
                    on:click={
                        let on_page = on_page.clone();
                        move |_| on_page(page.get_untracked().saturating_sub(1))
                    }
                >
                    "‹"
                </button>
                {
                    let on_page = on_page.clone();
                    move || {
                        items()
                            .into_iter()
                            .map(|item| match item {
                                PageItem::Page(n) => {
                                    let on_page = on_page.clone();
                                    view! {
                                        <button
                                            class="btn btn-small page-button"
                                            class:active=move || page.get() == n
                                            on:click=move |_| on_page(n)
                                        >
                                            {n}
                                        </button>
                                    }
                                    .into_any()
                                }
                                PageItem::Ellipsis => view! { <span class="ellipsis">"…"</span> }.into_any(),
                            })
                            .collect_view()
                    }
                }
                <button
                    class="btn btn-small"
                    disabled={move || next_disabled(page.get(), total_pages.get())}
                    on:click={
                        let on_page = on_page.clone();
                        move |_| on_page(page.get_untracked() + 1)
                    }
                >
                    "›"
                </button>
            </nav>
        </Show>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nav_buttons_at_bounds() {
        assert!(!can_prev(1));
        assert!(can_prev(2));
        assert!(next_disabled(5, 5));
        assert!(!next_disabled(4, 5));
    }

    #[test]
    fn test_single_page_hides_navigation() {
        assert!(page_items(1, 1).is_empty());
        assert_eq!(page_items(1, 2).len(), 2);
    }
}
