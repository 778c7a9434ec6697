//! バックエンド（/api/pms）の呼び出し
//!
//! 一覧系は失敗してもコンソールに警告を出して空を返す。

use pcb_inspect_common::detail::{DataMode, DataRequest};
use pcb_inspect_common::image::{encode_component, GerberImage, GerberQuery};
use pcb_inspect_common::types::{value_text, DataPage, UniqueValues};
use pcb_inspect_common::{Lot, LotHeader, LotId, LotSummary, MultiSummary, SearchQuery, SelectOption};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

const DEFAULT_API_URL: &str = "http://localhost:8000";
const API_META: &str = "pcb-inspect-api";

pub fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

pub fn warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

/// `<meta name="pcb-inspect-api" content="...">` があればそれを使う
pub fn api_base_from_document() -> String {
    web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.query_selector(&format!("meta[name=\"{}\"]", API_META)).ok().flatten())
        .and_then(|e| e.dyn_into::<web_sys::HtmlMetaElement>().ok())
        .map(|m| m.content())
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct PmsApi {
    base: String,
}

impl PmsApi {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, path: &str, query: &[(&str, String)]) -> String {
        if query.is_empty() {
            return format!("{}{}", self.base, path);
        }
        let qs = query
            .iter()
            .map(|(k, v)| format!("{}={}", k, encode_component(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}{}?{}", self.base, path, qs)
    }

    /// fetch して2xxを確認する
    pub async fn send(&self, method: &str, url: &str, body: Option<String>, signal: Option<&web_sys::AbortSignal>) -> Result<Response, JsValue> {
        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::Cors);
        if let Some(body) = &body {
            opts.set_body(&JsValue::from_str(body));
        }
        if let Some(signal) = signal {
            opts.set_signal(Some(signal));
        }

        let request = Request::new_with_str_and_init(url, &opts)?;
        if body.is_some() {
            request.headers().set("Content-Type", "application/json")?;
        }

        let window = web_sys::window().ok_or_else(|| js_err("window がありません"))?;
        let resp_value = JsFuture::from(window.fetch_with_request(&request)).await?;
        let resp: Response = resp_value.dyn_into()?;

        if !resp.ok() {
            return Err(js_err(format!("API error: {} {}", resp.status(), url)));
        }
        Ok(resp)
    }

    async fn json<T: DeserializeOwned>(&self, method: &str, path: &str, query: &[(&str, String)], body: Option<String>) -> Result<T, JsValue> {
        let resp = self.send(method, &self.url(path, query), body, None).await?;
        let text = JsFuture::from(resp.text()?).await?;
        let text = text.as_string().unwrap_or_default();
        serde_json::from_str(&text).map_err(js_err)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, JsValue> {
        self.json("GET", path, query, None).await
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T, JsValue> {
        let body = serde_json::to_string(body).map_err(js_err)?;
        self.json("POST", path, &[], Some(body)).await
    }

    async fn options(&self, path: &str, query: &[(&str, String)]) -> Vec<SelectOption> {
        match self.get::<Vec<Value>>(path, query).await {
            Ok(raw) => raw.iter().map(to_option).collect(),
            Err(e) => {
                warn(&format!("{} の取得に失敗: {:?}", path, e));
                Vec::new()
            }
        }
    }

    pub async fn machines(&self) -> Vec<SelectOption> {
        self.options("/api/pms/machines", &[]).await
    }

    pub async fn items(&self, machine: &str) -> Vec<SelectOption> {
        self.options("/api/pms/items", &[("machine", machine.to_string())]).await
    }

    pub async fn lots(&self, item: &str) -> Vec<SelectOption> {
        self.options("/api/pms/lots", &[("item", item.to_string())]).await
    }

    pub async fn search(&self, query: &SearchQuery) -> Vec<Lot> {
        self.get("/api/pms/search", &query.params()).await.unwrap_or_else(|e| {
            warn(&format!("検索に失敗: {:?}", e));
            Vec::new()
        })
    }

    pub async fn detail_header(&self, id: LotId) -> Result<LotHeader, JsValue> {
        self.get(&format!("/api/pms/detail/{}", id), &[]).await
    }

    pub async fn detail_summary(&self, id: LotId, sorters: &[String]) -> Result<LotSummary, JsValue> {
        self.get(&format!("/api/pms/detail/{}/summary", id), &sorters_query(sorters)).await
    }

    pub async fn detail_sorters(&self, id: LotId) -> Vec<SelectOption> {
        self.options(&format!("/api/pms/detail/{}/sorter", id), &[]).await
    }

    pub async fn detail_data(&self, id: LotId, request: &DataRequest) -> Result<DataPage, JsValue> {
        self.post(&format!("/api/pms/detail/{}/data", id), request).await
    }

    pub async fn unique_values(&self, id: LotId, mode: DataMode, sorters: &[String]) -> Result<UniqueValues, JsValue> {
        let mut query = vec![("type", mode.as_str().to_string())];
        query.extend(sorters_query(sorters));
        self.get(&format!("/api/pms/detail/{}/unique-values", id), &query).await
    }

    /// 指定順に並べ、null のロットは除く
    pub async fn summary_multi(&self, ids: &[LotId]) -> Vec<MultiSummary> {
        match self.post::<BTreeMap<String, Option<MultiSummary>>, _>("/api/pms/summary/multi", ids).await {
            Ok(map) => ids
                .iter()
                .filter_map(|id| map.get(&id.to_string()).cloned().flatten())
                .collect(),
            Err(e) => {
                warn(&format!("集計の取得に失敗: {:?}", e));
                Vec::new()
            }
        }
    }

    pub async fn gerber(&self, query: &GerberQuery) -> Result<GerberImage, JsValue> {
        let params: Vec<(&str, String)> = query.pairs().iter().map(|(k, v)| (*k, v.to_string())).collect();
        self.get("/image/gerber", &params).await
    }

    pub fn image_url(&self, path: &str) -> String {
        pcb_inspect_common::image::image_url(&self.base, path)
    }
}

fn sorters_query(sorters: &[String]) -> Vec<(&'static str, String)> {
    if sorters.is_empty() {
        Vec::new()
    } else {
        vec![("sorters", sorters.join(","))]
    }
}

/// 文字列か `{value, label}` の選択肢
fn to_option(item: &Value) -> SelectOption {
    match item {
        Value::Object(map) => {
            let text = |key: &str| map.get(key).filter(|v| !v.is_null()).map(value_text);
            let value = text("value").or_else(|| text("label")).unwrap_or_default();
            let label = text("label").unwrap_or_else(|| value.clone());
            SelectOption { label, value }
        }
        other => SelectOption::new(value_text(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_encodes_query() {
        let api = PmsApi::new("http://host:8000/");
        assert_eq!(api.url("/api/pms/machines", &[]), "http://host:8000/api/pms/machines");
        assert_eq!(
            api.url("/api/pms/search", &[("text", "a b&c".into())]),
            "http://host:8000/api/pms/search?text=a%20b%26c"
        );
    }

    #[test]
    fn test_to_option() {
        assert_eq!(to_option(&serde_json::json!("M1")), SelectOption::new("M1"));
        assert_eq!(to_option(&serde_json::json!({"value": "S01"})), SelectOption::new("S01"));
    }
}
