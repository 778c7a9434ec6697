//! PCB Inspect CLI
//!
//! AI検査結果のロット検索、作業リスト、分析チャート、詳細表示、エクスポート

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod detail;
pub mod error;
pub mod export;
pub mod image;
pub mod progress;
pub mod report;
pub mod session;
