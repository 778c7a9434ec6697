//! バックエンド（/api/pms）のHTTPクライアント
//!
//! 厳密なメソッドは `Result` を返す。一覧取得には失敗時に警告ログを出して
//! 空を返す `*_or_empty` 版があり、画面側はそちらで空表示に落とす。

use crate::config::Config;
use crate::error::{PcbInspectError, Result};
use pcb_inspect_common::detail::{DataMode, DataRequest};
use pcb_inspect_common::export::ExportRequest;
use pcb_inspect_common::image::{GerberImage, GerberQuery};
use pcb_inspect_common::types::{DataPage, UniqueValues};
use pcb_inspect_common::{Lot, LotHeader, LotId, LotSummary, MultiSummary, SearchQuery, SelectOption};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct PmsClient {
    http: reqwest::Client,
    base_url: String,
}

impl PmsClient {
    pub fn new(base_url: impl Into<String>, timeout: std::time::Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.api_base_url.clone(), config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        debug!(path, ?query, "GET");
        let response = self.http.get(self.url(path)).query(query).send().await?;
        Self::parse(response).await
    }

    async fn post_json<T: DeserializeOwned, B: serde::Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        debug!(path, "POST");
        let response = self.http.post(self.url(path)).json(body).send().await?;
        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let response = Self::check(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// 2xx 以外はサーバーエラーにする
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PcbInspectError::NotFound(response.url().path().to_string()));
        }
        let body = response.text().await.unwrap_or_default();
        Err(PcbInspectError::Server {
            status: status.as_u16(),
            body,
        })
    }

    async fn options(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<SelectOption>> {
        let raw: Vec<Value> = self.get_json(path, query).await?;
        Ok(raw.iter().map(to_option).collect())
    }

    pub async fn machines(&self) -> Result<Vec<SelectOption>> {
        self.options("/api/pms/machines", &[]).await
    }

    pub async fn items(&self, machine: &str) -> Result<Vec<SelectOption>> {
        self.options("/api/pms/items", &[("machine", machine.to_string())]).await
    }

    pub async fn lots(&self, item: &str) -> Result<Vec<SelectOption>> {
        self.options("/api/pms/lots", &[("item", item.to_string())]).await
    }

    pub async fn sorters(&self, lot: &str) -> Result<Vec<SelectOption>> {
        self.options("/api/pms/sorter", &[("lot", lot.to_string())]).await
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Lot>> {
        self.get_json("/api/pms/search", &query.params()).await
    }

    pub async fn detail_header(&self, id: LotId) -> Result<LotHeader> {
        self.get_json(&format!("/api/pms/detail/{}", id), &[]).await
    }

    pub async fn detail_summary(&self, id: LotId, sorters: &[String]) -> Result<LotSummary> {
        self.get_json(&format!("/api/pms/detail/{}/summary", id), &sorters_query(sorters))
            .await
    }

    pub async fn detail_sorters(&self, id: LotId) -> Result<Vec<SelectOption>> {
        self.options(&format!("/api/pms/detail/{}/sorter", id), &[]).await
    }

    pub async fn detail_data(&self, id: LotId, request: &DataRequest) -> Result<DataPage> {
        self.post_json(&format!("/api/pms/detail/{}/data", id), request).await
    }

    pub async fn unique_values(&self, id: LotId, mode: DataMode, sorters: &[String]) -> Result<UniqueValues> {
        let mut query = vec![("type", mode.as_str().to_string())];
        query.extend(sorters_query(sorters));
        self.get_json(&format!("/api/pms/detail/{}/unique-values", id), &query)
            .await
    }

    /// 複数ロットの集計（指定順。バックエンドが null を返したロットは除く）
    pub async fn summary_multi(&self, ids: &[LotId]) -> Result<Vec<MultiSummary>> {
        let map: BTreeMap<String, Option<MultiSummary>> = self.post_json("/api/pms/summary/multi", ids).await?;
        Ok(ids
            .iter()
            .filter_map(|id| map.get(&id.to_string()).cloned().flatten())
            .collect())
    }

    /// エクスポートのストリーム応答（本文は呼び出し側が読む）
    pub async fn download_export(&self, request: &ExportRequest) -> Result<reqwest::Response> {
        debug!(lots = request.test_list.len(), "POST /api/pms/download-zip");
        let response = self
            .http
            .post(self.url("/api/pms/download-zip"))
            .json(request)
            .send()
            .await?;
        Self::check(response).await
    }

    pub async fn gerber(&self, query: &GerberQuery) -> Result<GerberImage> {
        let params: Vec<(&str, String)> = query.pairs().iter().map(|(k, v)| (*k, v.to_string())).collect();
        self.get_json("/image/gerber", &params).await
    }

    /// `/images/{path}` の画像。存在しなければ None
    pub async fn image(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let url = pcb_inspect_common::image::image_url(&self.base_url, path);
        let response = self.http.get(url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check(response).await?;
        Ok(Some(response.bytes().await?.to_vec()))
    }

    pub async fn machines_or_empty(&self) -> Vec<SelectOption> {
        or_empty("machines", self.machines().await)
    }

    pub async fn items_or_empty(&self, machine: &str) -> Vec<SelectOption> {
        or_empty("items", self.items(machine).await)
    }

    pub async fn lots_or_empty(&self, item: &str) -> Vec<SelectOption> {
        or_empty("lots", self.lots(item).await)
    }

    pub async fn sorters_or_empty(&self, lot: &str) -> Vec<SelectOption> {
        or_empty("sorter", self.sorters(lot).await)
    }

    pub async fn search_or_empty(&self, query: &SearchQuery) -> Vec<Lot> {
        or_empty("search", self.search(query).await)
    }

    pub async fn detail_sorters_or_empty(&self, id: LotId) -> Vec<SelectOption> {
        or_empty("detail sorter", self.detail_sorters(id).await)
    }

    pub async fn summary_multi_or_empty(&self, ids: &[LotId]) -> Vec<MultiSummary> {
        or_empty("summary multi", self.summary_multi(ids).await)
    }
}

fn or_empty<T>(what: &str, result: Result<Vec<T>>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!("{} の取得に失敗: {}", what, e);
        Vec::new()
    })
}

fn sorters_query(sorters: &[String]) -> Vec<(&'static str, String)> {
    if sorters.is_empty() {
        Vec::new()
    } else {
        vec![("sorters", sorters.join(","))]
    }
}

/// 選択肢は文字列か `{value, label}` のどちらでも受ける
fn to_option(item: &Value) -> SelectOption {
    match item {
        Value::String(s) => SelectOption::new(s.clone()),
        Value::Object(map) => {
            let text = |key: &str| map.get(key).filter(|v| !v.is_null()).map(pcb_inspect_common::types::value_text);
            let value = text("value").or_else(|| text("label")).unwrap_or_else(|| item.to_string());
            let label = text("label").unwrap_or_else(|| value.clone());
            SelectOption { label, value }
        }
        other => SelectOption::new(pcb_inspect_common::types::value_text(other)),
    }
}
