//! 対話式の詳細ビュー
//!
//! 1行コマンドで表示モード・ソーター・フィルタ・ソート・ページを操作する。
//! フィルタとソーターの変更はデバウンスされ、次の描画前にまとめて取得する。

use super::DetailSession;
use crate::api::PmsClient;
use crate::error::{PcbInspectError, Result};
use crate::report;
use dialoguer::Input;
use pcb_inspect_common::ViewMode;
use std::path::{Path, PathBuf};

/// 対話アクション
#[derive(Debug, Clone, PartialEq)]
pub enum DetailAction {
    /// 表示モード切り替え
    View(ViewMode),
    /// ソーターの選択切り替え
    Sorter(String),
    /// フィルタ値の切り替え
    Filter { column: String, value: String },
    /// フィルタを全解除
    ClearFilters,
    /// ソート列の切り替え
    Sort(String),
    Next,
    Prev,
    Page(u32),
    /// フィルタとソートを消して再取得
    Refresh,
    /// 表示中ページの行の画像を保存
    Images(usize),
    Help,
    Quit,
}

pub const HELP: &str = "操作: v <summary|raw_point|raw_unit|underkill|overkill>  s <sorter>  f <列> <値>  fc  o <列>  n  p  g <page>  r  i <行番号>  h  q";

/// 入力行をアクションに変換
pub fn parse_action(line: &str) -> std::result::Result<DetailAction, String> {
    let mut parts = line.split_whitespace();
    let cmd = parts.next().unwrap_or("");
    let rest: Vec<&str> = parts.collect();
    let arg = |i: usize| {
        rest.get(i)
            .map(|s| s.to_string())
            .ok_or_else(|| format!("引数が足りません: {}", line.trim()))
    };

    match cmd {
        "v" => Ok(DetailAction::View(arg(0)?.parse()?)),
        "s" => Ok(DetailAction::Sorter(arg(0)?)),
        "f" => Ok(DetailAction::Filter {
            column: arg(0)?,
            value: rest.get(1..).map(|v| v.join(" ")).filter(|v| !v.is_empty()).ok_or_else(|| "値を指定してください".to_string())?,
        }),
        "fc" => Ok(DetailAction::ClearFilters),
        "o" => Ok(DetailAction::Sort(arg(0)?)),
        "n" => Ok(DetailAction::Next),
        "p" => Ok(DetailAction::Prev),
        "g" => arg(0)?
            .parse()
            .map(DetailAction::Page)
            .map_err(|_| "ページ番号は数値で指定してください".to_string()),
        "r" => Ok(DetailAction::Refresh),
        "i" => arg(0)?
            .parse()
            .map(DetailAction::Images)
            .map_err(|_| "行番号は数値で指定してください".to_string()),
        "h" | "?" => Ok(DetailAction::Help),
        "q" | "quit" | "exit" => Ok(DetailAction::Quit),
        other => Err(format!("不明なコマンド: {}", other)),
    }
}

/// 対話ループ
pub async fn run_interactive(client: &PmsClient, session: &mut DetailSession<'_>, image_dir: &Path) -> Result<()> {
    println!("{}", report::detail_view(session.state()));
    println!("\n{}", HELP);

    loop {
        let line: String = Input::new()
            .with_prompt("detail")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| PcbInspectError::Prompt(e.to_string()))?;

        if line.trim().is_empty() {
            continue;
        }

        let action = match parse_action(&line) {
            Ok(a) => a,
            Err(msg) => {
                println!("⚠ {}", msg);
                continue;
            }
        };

        let result = match action {
            DetailAction::Quit => return Ok(()),
            DetailAction::Help => {
                println!("{}", HELP);
                continue;
            }
            DetailAction::Images(index) => {
                save_images(client, session, index, image_dir).await;
                continue;
            }
            DetailAction::View(view) => session.set_view(view).await,
            DetailAction::Sorter(value) => session.toggle_sorter(&value).await,
            DetailAction::Filter { column, value } => session.toggle_filter_value(&column, &value).await,
            DetailAction::ClearFilters => session.clear_filters().await,
            DetailAction::Sort(field) => session.toggle_sort(&field).await,
            DetailAction::Next => session.next_page().await,
            DetailAction::Prev => session.prev_page().await,
            DetailAction::Page(page) => session.go_to_page(page).await,
            DetailAction::Refresh => session.refresh().await,
        };

        // 取得エラーは表示して続ける（前の表示を残す）
        if let Err(e) = result.and(session.settle().await) {
            println!("⚠ {}", e);
        }
        println!("{}", report::detail_view(session.state()));
    }
}

/// 表示上の行番号（通し番号）で行を選び、画像を保存する
async fn save_images(client: &PmsClient, session: &DetailSession<'_>, index: usize, dir: &Path) {
    let state = session.state();
    let offset = (state.page().max(1) as usize - 1) * pcb_inspect_common::pagination::PAGE_SIZE as usize;
    let Some(row) = index.checked_sub(offset + 1).and_then(|i| state.rows().get(i)) else {
        println!("⚠ 表示中のページに行 {} がありません", index);
        return;
    };

    let dir: PathBuf = dir.to_path_buf();
    match crate::image::save_row_images(client, row, &dir).await {
        Ok(saved) if saved.is_empty() => println!("画像が見つかりません"),
        Ok(saved) => {
            for image in saved {
                println!("✔ {}: {}", image.label, image.path.display());
            }
        }
        Err(e) => println!("⚠ {}", e),
    }
}
