use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use pcb_inspect_common::summary::Section;
use pcb_inspect_common::{GraphType, GroupBy, LotId, Metric, Vendor, ViewMode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pcb-inspect")]
#[command(about = "PCB AI検査結果の検索・分析・詳細表示・エクスポート", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// セッションファイル（デフォルト: ~/.config/pcb-inspect/session.json）
    #[arg(long, global = true)]
    pub session: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 連動選択で検索（設備 → 品目 → ロット）
    ///
    /// 指定が途中までなら次の段の候補を表示する。ロットまで指定すると検索する。
    Search {
        /// メーカー (ATI/PIXEL)
        #[arg(long, default_value = "ATI")]
        vendor: Vendor,

        /// 設備
        #[arg(short, long)]
        machine: Option<String>,

        /// 品目
        #[arg(short, long, requires = "machine")]
        item: Option<String>,

        /// ロット
        #[arg(short, long, requires = "item")]
        lot: Option<String>,
    },

    /// 期間とテキストで検索
    Find {
        /// 開始日 (YYYY-MM-DD、デフォルト: 今日)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// 終了日 (YYYY-MM-DD、デフォルト: 開始日)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// 検索テキスト
        #[arg(short, long, default_value = "")]
        text: String,
    },

    /// 検索結果のチェック状態を作業リストに反映
    Select {
        /// チェックするテストID（検索結果上の選択全体）
        #[arg(required = true)]
        ids: Vec<LotId>,

        /// 現在のチェックに追加する
        #[arg(short, long)]
        add: bool,
    },

    /// 作業リストの表示・編集
    Lots {
        /// 作業リストから外すID
        #[arg(short, long)]
        remove: Vec<LotId>,

        /// 作業リストを空にする
        #[arg(long)]
        clear: bool,

        /// 作業リストをxlsxに出力
        #[arg(long)]
        xlsx: Option<PathBuf>,
    },

    /// 作業リストの分析チャート
    Chart {
        /// グループ化 (lot/version/customer/itemcode)
        #[arg(short, long, default_value = "lot")]
        group: GroupBy,

        /// 指標 (rate/rate_unit/overkill/underkill、最大2つ)
        #[arg(short, long = "metric", required = true)]
        metrics: Vec<Metric>,

        /// 指標が1つのときのグラフ種別 (bar/line)
        #[arg(long, default_value = "bar")]
        graph_type: GraphType,

        /// 集計表をxlsxに出力
        #[arg(long)]
        xlsx: Option<PathBuf>,

        /// Chart.js の設定JSONを出力
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// ロットの詳細（サマリ・生データ）
    Detail {
        /// テストID
        #[arg(required = true)]
        id: LotId,

        /// 表示モード (summary/raw_point/raw_unit/underkill/overkill)
        #[arg(short, long, default_value = "summary")]
        view: ViewMode,

        /// サマリの先頭に出すセクション
        #[arg(long, default_value = "rate")]
        section: Section,

        /// ソーター（指定しない場合は全ソーター）
        #[arg(short, long = "sorter")]
        sorters: Vec<String>,

        /// 列フィルタ（列=値1,値2）
        #[arg(short, long = "filter")]
        filters: Vec<String>,

        /// ソート（列 または 列:desc）
        #[arg(long)]
        sort: Option<String>,

        /// ページ番号
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// 対話モード
        #[arg(short, long)]
        interactive: bool,

        /// 表示中のページをxlsxに出力
        #[arg(long)]
        xlsx: Option<PathBuf>,

        /// 画像の保存先（対話モード用）
        #[arg(long, default_value = "images")]
        image_dir: PathBuf,
    },

    /// 作業リストのデータをダウンロード
    Export {
        /// 出力内容 (rawdata/summary/overkill/underkill)
        #[arg(short = 'O', long = "option", required = true)]
        options: Vec<String>,

        /// 保存先ディレクトリ（デフォルト: 設定の download_dir）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 詳細テーブルの行の不良画像を保存
    Image {
        /// テストID
        #[arg(required = true)]
        id: LotId,

        /// 行番号（通し番号）
        #[arg(short, long)]
        row: u64,

        /// 表示モード
        #[arg(short, long, default_value = "raw_point")]
        view: ViewMode,

        /// 保存先ディレクトリ
        #[arg(short, long, default_value = "images")]
        output: PathBuf,
    },

    /// 設定
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// APIのURLを設定
        #[arg(long)]
        set_api_url: Option<String>,
    },
}
