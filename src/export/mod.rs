//! エクスポート（サーバー生成ファイルのダウンロードとローカルExcel出力）

pub mod download;
pub mod excel;

pub use download::{download_export, DownloadOutcome};
