use thiserror::Error;

#[derive(Error, Debug)]
pub enum PcbInspectError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("HTTPエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("サーバーエラー ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] pcb_inspect_common::Error),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error("見つかりません: {0}")]
    NotFound(String),

    #[error("キャンセルされました")]
    Cancelled,

    #[error("引数が不正: {0}")]
    InvalidArgument(String),

    #[error("選択できるロットは最大{limit}件です（選択しようとした件数: {attempted}）")]
    SelectionLimit { limit: usize, attempted: usize },

    #[error("画像デコードエラー: {0}")]
    ImageDecode(String),

    #[error("対話入力エラー: {0}")]
    Prompt(String),
}

impl PcbInspectError {
    /// 共通ライブラリの上限エラーはCLI側の表示に寄せる
    pub fn from_common(err: pcb_inspect_common::Error) -> Self {
        match err {
            pcb_inspect_common::Error::SelectionLimit { limit, attempted } => {
                PcbInspectError::SelectionLimit { limit, attempted }
            }
            other => PcbInspectError::Common(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, PcbInspectError>;
