//! 不良画像のパス解決
//!
//! - モーダル: `_Axial` / `_Pad` / 無印 の3候補
//! - ギャラリーのサムネイル: `_Pad.png` を `_Axial.png` に置き換える
//! - ガーバー画像: `/image/gerber` が base64 のPNGを返す

use crate::types::{value_text, RawRecord};
use base64::Engine;
use serde::Deserialize;

/// 画像候補（表示ラベルと画像パス）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    pub label: &'static str,
    pub path: String,
}

/// ファイル名部分の拡張子とサフィックスを外したベース名
fn base_name(file_name: &str) -> &str {
    let lower = file_name.to_ascii_lowercase();
    let Some(stem_len) = lower.strip_suffix(".png").map(str::len) else {
        return file_name;
    };
    let stem = &lower[..stem_len];
    let cut = if stem.ends_with("_axial") {
        stem_len - "_axial".len()
    } else if stem.ends_with("_pad") {
        stem_len - "_pad".len()
    } else {
        stem_len
    };
    &file_name[..cut]
}

/// モーダルで試す画像パス（Axial → Pad → 無印 の順）
pub fn modal_candidates(image_path: &str) -> Vec<ImageCandidate> {
    let (dir, file_name) = match image_path.rfind('/') {
        Some(pos) => image_path.split_at(pos + 1),
        None => ("", image_path),
    };
    let base = base_name(file_name);

    [("Axial", "_Axial.png"), ("Pad", "_Pad.png"), ("Raw", ".png")]
        .into_iter()
        .map(|(label, suffix)| ImageCandidate {
            label,
            path: format!("{}{}{}", dir, base, suffix),
        })
        .collect()
}

/// ギャラリーのサムネイルパス
pub fn thumbnail_path(image_path: &str) -> String {
    let trimmed = image_path.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.ends_with("_pad.png") {
        format!("{}_Axial.png", &trimmed[..trimmed.len() - "_pad.png".len()])
    } else {
        trimmed.to_string()
    }
}

/// `{base}/images/{path}`（先頭の `/` は外す）
pub fn image_url(api_base: &str, path: &str) -> String {
    let path = path.strip_prefix('/').unwrap_or(path);
    format!("{}/images/{}", api_base.trim_end_matches('/'), encode_uri(path))
}

/// ガーバー画像のクエリ
#[derive(Debug, Clone, PartialEq)]
pub struct GerberQuery {
    pub json_path: String,
    pub cx: String,
    pub cy: String,
    pub defect_width: String,
    pub defect_height: String,
}

impl GerberQuery {
    /// 行にファイル名が無ければ None
    pub fn from_record(row: &RawRecord) -> Option<Self> {
        let json_path = value_text(&row.file_name);
        if json_path.is_empty() {
            return None;
        }
        Some(Self {
            json_path,
            cx: value_text(&row.rel_x_unit),
            cy: value_text(&row.rel_y_unit),
            defect_width: value_text(&row.defect_width),
            defect_height: value_text(&row.defect_height),
        })
    }

    pub fn pairs(&self) -> [(&'static str, &str); 5] {
        [
            ("json_path", self.json_path.as_str()),
            ("cx", self.cx.as_str()),
            ("cy", self.cy.as_str()),
            ("defect_width", self.defect_width.as_str()),
            ("defect_height", self.defect_height.as_str()),
        ]
    }

    pub fn url(&self, api_base: &str) -> String {
        let query = self
            .pairs()
            .iter()
            .map(|(k, v)| format!("{}={}", k, encode_component(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}/image/gerber?{}", api_base.trim_end_matches('/'), query)
    }
}

/// `/image/gerber` のレスポンス
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GerberImage {
    #[serde(default)]
    pub image: Option<String>,
}

impl GerberImage {
    /// PNGバイト列（画像が無ければ None）
    pub fn decode(&self) -> Option<Result<Vec<u8>, base64::DecodeError>> {
        let encoded = self.image.as_deref().filter(|s| !s.is_empty())?;
        Some(base64::engine::general_purpose::STANDARD.decode(encoded))
    }

    /// `<img src>` 用の data URL
    pub fn data_url(&self) -> Option<String> {
        let encoded = self.image.as_deref().filter(|s| !s.is_empty())?;
        Some(format!("data:image/png;base64,{}", encoded))
    }
}

const URI_RESERVED: &[u8] = b";,/?:@&=+$#";
const UNRESERVED: &[u8] = b"-_.!~*'()";

/// パス用のエンコード（`/` などの区切り文字は残す）
pub fn encode_uri(s: &str) -> String {
    encode(s, true)
}

/// クエリ値用のエンコード
pub fn encode_component(s: &str) -> String {
    encode(s, false)
}

fn encode(s: &str, keep_reserved: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        let keep = b.is_ascii_alphanumeric()
            || UNRESERVED.contains(&b)
            || (keep_reserved && URI_RESERVED.contains(&b));
        if keep {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_modal_candidates_strip_suffix() {
        let c = modal_candidates("/data/2026/S01/U12_Pad.png");
        let paths: Vec<&str> = c.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["/data/2026/S01/U12_Axial.png", "/data/2026/S01/U12_Pad.png", "/data/2026/S01/U12.png"]
        );
        assert_eq!(c[0].label, "Axial");

        let c = modal_candidates("U12_axial.PNG");
        assert_eq!(c[2].path, "U12.png");
    }

    #[test]
    fn test_thumbnail_prefers_axial() {
        assert_eq!(thumbnail_path(" a/b_Pad.png "), "a/b_Axial.png");
        assert_eq!(thumbnail_path("a/b.png"), "a/b.png");
    }

    #[test]
    fn test_image_url() {
        assert_eq!(
            image_url("http://localhost:8000/", "/dir/my file.png"),
            "http://localhost:8000/images/dir/my%20file.png"
        );
    }

    #[test]
    fn test_gerber_query() {
        let row: RawRecord = serde_json::from_value(json!({
            "file_name": "a/b c.json",
            "rel_x_unit": 1.5,
            "rel_y_unit": 2,
            "defect_width": 10,
            "defect_height": 20
        }))
        .unwrap();
        let q = GerberQuery::from_record(&row).unwrap();
        assert_eq!(
            q.url("http://h"),
            "http://h/image/gerber?json_path=a%2Fb%20c.json&cx=1.5&cy=2&defect_width=10&defect_height=20"
        );

        assert!(GerberQuery::from_record(&RawRecord::default()).is_none());
    }

    #[test]
    fn test_gerber_decode() {
        let img = GerberImage { image: Some("iVBORw0KGgo=".into()) };
        let bytes = img.decode().unwrap().unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert!(img.data_url().unwrap().starts_with("data:image/png;base64,"));
        assert!(GerberImage::default().decode().is_none());
    }
}
