//! エクスポートのストリーミングダウンロード
//!
//! ReadableStream を読みながら進捗ストアを更新し、完了したら Blob を保存させる。
//! AbortController で中断できる。

use super::pms::{js_err, PmsApi};
use crate::export::js_bindings::save_blob;
use pcb_inspect_common::export::{export_filename, ExportKind, ExportRequest};
use pcb_inspect_common::progress::{Abort, ProgressId, ProgressStore};
use js_sys::{Array, Reflect, Uint8Array};
use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, Blob, BlobPropertyBag, ReadableStreamDefaultReader};

/// AbortController を中断ハンドルにする
pub struct FetchAbort(pub AbortController);

impl Abort for FetchAbort {
    fn abort(&self) {
        self.0.abort();
    }
}

pub type ProgressHandle = StoredValue<ProgressStore<FetchAbort>, LocalStorage>;

/// ダウンロードして保存させる。中断・失敗時は進捗から外してエラーを返す
pub async fn download_export(api: &PmsApi, request: &ExportRequest, progress: ProgressHandle) -> Result<String, JsValue> {
    let controller = AbortController::new()?;
    let signal = controller.signal();
    let label = request.label();
    let id = progress
        .try_update_value(|store| store.start(label, FetchAbort(controller)))
        .ok_or_else(|| js_err("進捗ストアが破棄されています"))?;

    match receive(api, request, progress, id, &signal).await {
        Ok((blob, kind)) => {
            let filename = export_filename(&request.excel_options, chrono::Local::now().date_naive());
            save_blob(&blob, &filename)?;
            if kind.is_none() {
                super::pms::warn("エクスポートの Content-Type が不明です");
            }
            progress.update_value(|store| {
                store.finish(id);
            });
            remove_later(progress, id);
            Ok(filename)
        }
        Err(e) => {
            // 中断済みなら既に消えている
            progress.update_value(|store| {
                store.remove(id);
            });
            Err(e)
        }
    }
}

fn remove_later(progress: ProgressHandle, id: ProgressId) {
    let linger = pcb_inspect_common::progress::FINISH_LINGER.as_millis() as u32;
    gloo::timers::callback::Timeout::new(linger, move || {
        progress.try_update_value(|store| store.remove(id));
    })
    .forget();
}

async fn receive(
    api: &PmsApi,
    request: &ExportRequest,
    progress: ProgressHandle,
    id: ProgressId,
    signal: &web_sys::AbortSignal,
) -> Result<(Blob, Option<ExportKind>), JsValue> {
    let body = serde_json::to_string(request).map_err(js_err)?;
    let url = api.url("/api/pms/download-zip", &[]);
    let resp = api.send("POST", &url, Some(body), Some(signal)).await?;

    let headers = resp.headers();
    let content_type = headers.get("Content-Type")?;
    let kind = ExportKind::from_content_type(content_type.as_deref());
    let total = headers
        .get("Content-Length")?
        .and_then(|v| v.parse::<u64>().ok());

    let stream = resp.body().ok_or_else(|| js_err("レスポンス本文がありません"))?;
    let reader: ReadableStreamDefaultReader = stream.get_reader().dyn_into()?;

    let chunks = Array::new();
    let mut received: u64 = 0;
    loop {
        let result = JsFuture::from(reader.read()).await?;
        let done = Reflect::get(&result, &JsValue::from_str("done"))?
            .as_bool()
            .unwrap_or(true);
        if done {
            break;
        }
        let chunk: Uint8Array = Reflect::get(&result, &JsValue::from_str("value"))?.dyn_into()?;
        received += chunk.length() as u64;
        chunks.push(&chunk);
        progress.update_value(|store| {
            store.update_bytes(id, received, total);
        });
    }

    let options = BlobPropertyBag::new();
    options.set_type(kind.map(|k| k.content_type()).unwrap_or("application/octet-stream"));
    let blob = Blob::new_with_u8_array_sequence_and_options(&chunks, &options)?;
    Ok((blob, kind))
}
