//! JavaScript Bridge バインディング
//!
//! チャート描画は Chart.js（js/chart-bridge.js）に委譲する。
//! ダウンロード保存は Blob URL を作ってアンカーをクリックさせる。

use pcb_inspect_common::ChartSpec;
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(module = "/js/chart-bridge.js")]
extern "C" {
    /// canvas にチャートを描画（既存のチャートは置き換える）
    #[wasm_bindgen(js_name = "renderChart", catch)]
    fn render_chart_js(canvas_id: &str, config: JsValue) -> Result<(), JsValue>;

    /// canvas のチャートを破棄
    #[wasm_bindgen(js_name = "destroyChart")]
    fn destroy_chart_js(canvas_id: &str);
}

/// Chart.js の設定に変換して描画する
pub fn render_chart(canvas_id: &str, spec: &ChartSpec) -> Result<(), JsValue> {
    let config = spec
        .to_chartjs_config()
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    render_chart_js(canvas_id, config)
}

pub fn destroy_chart(canvas_id: &str) {
    destroy_chart_js(canvas_id);
}

/// Blob をファイルとして保存させる
pub fn save_blob(blob: &web_sys::Blob, filename: &str) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("document がありません"))?;

    let url = web_sys::Url::create_object_url_with_blob(blob)?;
    let anchor: web_sys::HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(&url);
    anchor.set_download(filename);
    anchor.click();
    web_sys::Url::revoke_object_url(&url)?;
    Ok(())
}
