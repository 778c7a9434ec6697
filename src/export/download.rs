//! エクスポートのストリーミングダウンロード
//!
//! 受信バイト数を進捗ストアに流し、完了したら日付付きのファイル名で保存する。
//! 中断された場合はファイルを作らない。

use crate::api::PmsClient;
use crate::error::{PcbInspectError, Result};
use crate::progress::{lock, remove_later, SharedStore, TokenAbort};
use chrono::NaiveDate;
use pcb_inspect_common::export::{export_filename, ExportKind, ExportRequest};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOutcome {
    pub path: PathBuf,
    pub kind: Option<ExportKind>,
    pub bytes: u64,
}

/// ダウンロードして `dir` に保存する
///
/// `cancel` が発火するか、進捗ストアから cancel された時点で中断する。
pub async fn download_export(
    client: &PmsClient,
    request: &ExportRequest,
    dir: &Path,
    date: NaiveDate,
    store: &SharedStore,
    cancel: CancellationToken,
) -> Result<DownloadOutcome> {
    let id = lock(store).start(request.label(), TokenAbort(cancel.clone()));

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PcbInspectError::Cancelled),
        r = receive(client, request, store, id) => r,
    };

    match result {
        Ok((bytes, kind)) => {
            let path = dir.join(export_filename(&request.excel_options, date));
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, &bytes).await?;
            info!(path = %path.display(), bytes = bytes.len(), "export saved");

            lock(store).finish(id);
            remove_later(store, id);
            Ok(DownloadOutcome {
                path,
                kind,
                bytes: bytes.len() as u64,
            })
        }
        Err(e) => {
            debug!("export aborted: {}", e);
            lock(store).cancel(id);
            Err(e)
        }
    }
}

async fn receive(
    client: &PmsClient,
    request: &ExportRequest,
    store: &SharedStore,
    id: pcb_inspect_common::progress::ProgressId,
) -> Result<(Vec<u8>, Option<ExportKind>)> {
    let mut response = client.download_export(request).await?;
    let total = response.content_length();
    let kind = ExportKind::from_content_type(
        response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
    );

    // 申告された Content-Length では事前確保しない
    let mut buffer = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        buffer.extend_from_slice(&chunk);
        lock(store).update_bytes(id, buffer.len() as u64, total);
    }
    Ok((buffer, kind))
}
