//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[cfg(feature = "excel")]
    #[error("Excel error: {0}")]
    Excel(#[from] rust_xlsxwriter::XlsxError),

    #[error("Selection limit exceeded: up to {limit} lots (attempted {attempted})")]
    SelectionLimit { limit: usize, attempted: usize },

    #[error("Too many analysis options: up to {0}")]
    TooManyOptions(usize),

    #[error("No analysis option selected")]
    NoOptionSelected,
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
