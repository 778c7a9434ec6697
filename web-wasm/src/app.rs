//! メインアプリケーションコンポーネント

use crate::api::download::ProgressHandle;
use crate::api::pms::{api_base_from_document, PmsApi};
use crate::components::{header::Header, progress_overlay::ProgressOverlay};
use crate::pages::{dashboard::Dashboard, detail::DetailPage};
use leptos::prelude::*;
use pcb_inspect_common::progress::ProgressView;
use pcb_inspect_common::{Lot, LotId, ProgressStore, Theme, WorkingSet};
use wasm_bindgen::JsCast;

/// 表示中の画面
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Search,
    Detail(LotId),
}

/// 画面をまたいで共有する状態
///
/// 検索結果と作業リストはタブを閉じるまで保持する。
#[derive(Clone, Copy)]
pub struct AppContext {
    pub api: StoredValue<PmsApi>,
    pub results: RwSignal<Vec<Lot>>,
    pub working_set: RwSignal<WorkingSet>,
    pub progress: ProgressHandle,
    pub progress_views: RwSignal<Vec<ProgressView>>,
    pub route: RwSignal<Route>,
    pub theme: RwSignal<Theme>,
}

impl AppContext {
    /// 新しい検索結果を反映（作業リストはそのまま、ハイライトだけ付け替える）
    pub fn set_results(&self, results: Vec<Lot>) {
        self.working_set.update(|ws| ws.on_new_results(&results));
        self.results.set(results);
    }

    pub fn api(&self) -> PmsApi {
        self.api.get_value()
    }
}

pub fn use_app() -> AppContext {
    expect_context::<AppContext>()
}

/// ブラウザのアラート
pub fn alert(message: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(message);
    }
}

/// ブラウザの確認ダイアログ
pub fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

/// テーマのCSS変数をドキュメントルートに書き込む
fn apply_theme(theme: Theme) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    if let Some(root) = document
        .document_element()
        .and_then(|e| e.dyn_into::<web_sys::HtmlElement>().ok())
    {
        let style = root.style();
        for (name, value) in theme.vars() {
            let _ = style.set_property(name, value);
        }
    }
    if let Some(body) = document.body() {
        let _ = body.style().set_property("background", theme.body_background());
    }
}

/// メインアプリケーションコンポーネント
#[component]
pub fn App() -> impl IntoView {
    let ctx = AppContext {
        api: StoredValue::new(PmsApi::new(api_base_from_document())),
        results: RwSignal::new(Vec::new()),
        working_set: RwSignal::new(WorkingSet::new()),
        progress: StoredValue::new_local(ProgressStore::new()),
        progress_views: RwSignal::new(Vec::new()),
        route: RwSignal::new(Route::Search),
        theme: RwSignal::new(Theme::default()),
    };
    provide_context(ctx);

    // 進捗ストアの変更をシグナルに流す
    let progress_views = ctx.progress_views;
    let subscription = ctx
        .progress
        .try_update_value(|store| store.subscribe(move |views: &[ProgressView]| progress_views.set(views.to_vec())));
    on_cleanup(move || {
        if let Some(id) = subscription {
            ctx.progress.try_update_value(|store| store.unsubscribe(id));
        }
    });

    Effect::new(move |_| apply_theme(ctx.theme.get()));

    view! {
        <div class="container">
            <Header />

            {move || match ctx.route.get() {
                Route::Search => view! { <Dashboard /> }.into_any(),
                Route::Detail(id) => view! { <DetailPage lot_id=id /> }.into_any(),
            }}

            <ProgressOverlay />
        </div>
    }
}
