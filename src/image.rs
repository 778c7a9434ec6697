//! 不良画像の保存
//!
//! 行の画像パスから Axial / Pad / 無印 の候補を取り、存在するものを保存する。
//! ガーバー画像はbase64のPNGをデコードして保存する。

use crate::api::PmsClient;
use crate::error::{PcbInspectError, Result};
use pcb_inspect_common::image::{modal_candidates, GerberImage, GerberQuery};
use pcb_inspect_common::RawRecord;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct SavedImage {
    pub label: String,
    pub path: PathBuf,
}

/// 画像パスのファイル名から拡張子を除いたもの
pub fn file_stem(image_path: &str) -> String {
    Path::new(image_path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string())
}

/// 候補画像のうち存在するものを保存
pub async fn save_candidates(client: &PmsClient, image_path: &str, dir: &Path) -> Result<Vec<SavedImage>> {
    tokio::fs::create_dir_all(dir).await?;
    let mut saved = Vec::new();
    for candidate in modal_candidates(image_path) {
        let Some(bytes) = client.image(&candidate.path).await? else {
            debug!(path = %candidate.path, "image not found");
            continue;
        };
        let path = dir.join(format!("{}.png", file_stem(&candidate.path)));
        tokio::fs::write(&path, bytes).await?;
        saved.push(SavedImage {
            label: candidate.label.to_string(),
            path,
        });
    }
    Ok(saved)
}

/// ガーバー画像のデコード（画像が無ければ None）
pub fn decode_gerber(image: &GerberImage) -> Result<Option<Vec<u8>>> {
    match image.decode() {
        None => Ok(None),
        Some(Ok(bytes)) => Ok(Some(bytes)),
        Some(Err(e)) => Err(PcbInspectError::ImageDecode(e.to_string())),
    }
}

pub async fn save_gerber(client: &PmsClient, query: &GerberQuery, path: &Path) -> Result<bool> {
    let image = client.gerber(query).await?;
    let Some(bytes) = decode_gerber(&image)? else {
        return Ok(false);
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(true)
}

/// 1行分の画像（候補画像とガーバー）を保存
///
/// ガーバーの失敗は警告にとどめ、候補画像の結果を返す。
pub async fn save_row_images(client: &PmsClient, row: &RawRecord, dir: &Path) -> Result<Vec<SavedImage>> {
    let Some(image_path) = row.image_path() else {
        return Err(PcbInspectError::NotFound("行に画像パスがありません".into()));
    };
    let mut saved = save_candidates(client, image_path, dir).await?;

    if let Some(query) = GerberQuery::from_record(row) {
        let path = dir.join(format!("{}_gerber.png", file_stem(image_path)));
        match save_gerber(client, &query, &path).await {
            Ok(true) => saved.push(SavedImage {
                label: "Gerber".to_string(),
                path,
            }),
            Ok(false) => debug!("gerber image empty"),
            Err(e) => warn!("ガーバー画像の取得に失敗: {}", e),
        }
    }
    Ok(saved)
}
