//! サブコマンドの実装

use crate::api::PmsClient;
use crate::config::Config;
use crate::detail::{interactive, DetailSession};
use crate::error::{PcbInspectError, Result};
use crate::export::{self, excel};
use crate::progress;
use crate::report;
use crate::session::Session;
use chrono::{Local, NaiveDate};
use pcb_inspect_common::cascade::{CascadeEffect, DateRange};
use pcb_inspect_common::pagination::PAGE_SIZE;
use pcb_inspect_common::summary::Section;
use pcb_inspect_common::{
    AnalysisOptions, CascadeState, ChartSpec, ExportOptions, ExportRequest, GraphType, GroupBy, LotId, Metric,
    SearchQuery, Vendor, ViewMode,
};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// コマンド共通の文脈
pub struct Context {
    pub config: Config,
    pub client: PmsClient,
    pub session_path: PathBuf,
}

impl Context {
    pub fn new(config: Config, session_path: Option<PathBuf>) -> Result<Self> {
        let client = PmsClient::from_config(&config)?;
        let session_path = match session_path {
            Some(p) => p,
            None => Session::default_path()?,
        };
        Ok(Self {
            config,
            client,
            session_path,
        })
    }

    fn load_session(&self) -> Session {
        Session::load(&self.session_path)
    }

    fn save_session(&self, session: &Session) -> Result<()> {
        session.save(&self.session_path)
    }
}

/// 連動選択の副作用を実行し、検索が走れば結果を返す
async fn run_cascade(
    client: &PmsClient,
    cascade: &mut CascadeState,
    session: &mut Session,
    effects: Vec<CascadeEffect>,
) -> Option<usize> {
    let mut searched = None;
    for effect in effects {
        match effect {
            CascadeEffect::LoadMachines => {
                let machines = client.machines_or_empty().await;
                cascade.set_machines(machines.into_iter().map(|o| o.value).collect());
            }
            CascadeEffect::LoadItems { machine } => {
                let items = client.items_or_empty(&machine).await;
                cascade.set_items(&machine, items.into_iter().map(|o| o.value).collect());
            }
            CascadeEffect::LoadLots { item } => {
                let lots = client.lots_or_empty(&item).await;
                cascade.set_lots(&item, lots.into_iter().map(|o| o.value).collect());
            }
            CascadeEffect::ClearResults => session.set_results(Vec::new()),
            CascadeEffect::Search(query) => {
                let results = client.search_or_empty(&query).await;
                searched = Some(results.len());
                session.set_results(results);
            }
        }
    }
    searched
}

fn print_options(title: &str, values: &[String]) {
    if values.is_empty() {
        println!("{}: 候補がありません", title);
        return;
    }
    println!("{} ({}件):", title, values.len());
    for v in values {
        println!("  {}", v);
    }
}

fn print_results(session: &Session) {
    if session.results.is_empty() {
        println!("No Data");
        return;
    }
    println!("{}", report::lots_table(&session.results, session.working_set.highlighted()));
    println!("\n✔ {}件", session.results.len());
}

pub async fn search(
    ctx: &Context,
    vendor: Vendor,
    machine: Option<String>,
    item: Option<String>,
    lot: Option<String>,
) -> Result<()> {
    let mut cascade = CascadeState::new();
    let mut session = ctx.load_session();

    let effects = cascade.select_vendor(vendor);
    if cascade.vendor().is_none() {
        return Err(PcbInspectError::InvalidArgument(format!("{} は未対応のメーカーです", vendor.label())));
    }
    run_cascade(&ctx.client, &mut cascade, &mut session, effects).await;

    let Some(machine) = machine else {
        print_options("設備", cascade.machines());
        return ctx.save_session(&session);
    };
    if !cascade.machines().is_empty() && !cascade.machines().contains(&machine) {
        warn!("設備 {} は候補にありません", machine);
    }
    let effects = cascade.select_machine(machine);
    run_cascade(&ctx.client, &mut cascade, &mut session, effects).await;

    let Some(item) = item else {
        print_options("品目", cascade.items());
        return ctx.save_session(&session);
    };
    let effects = cascade.select_item(item);
    run_cascade(&ctx.client, &mut cascade, &mut session, effects).await;

    let Some(lot) = lot else {
        print_options("ロット", cascade.lots());
        return ctx.save_session(&session);
    };
    let effects = cascade.select_lot(lot);
    run_cascade(&ctx.client, &mut cascade, &mut session, effects).await;

    print_results(&session);
    ctx.save_session(&session)
}

pub async fn find(ctx: &Context, from: Option<NaiveDate>, to: Option<NaiveDate>, text: String) -> Result<()> {
    let today = Local::now().date_naive();
    let start = from.unwrap_or(today);
    let end = to.unwrap_or(start);
    if end < start {
        return Err(PcbInspectError::InvalidArgument(format!("期間が逆転しています: {} ~ {}", start, end)));
    }

    let mut cascade = CascadeState::new();
    cascade.select_vendor(Vendor::Ati);
    cascade.open_popup(today);
    cascade.set_popup_range(DateRange { start, end });
    cascade.set_popup_text(text);

    let query: SearchQuery = cascade
        .popup_query()
        .ok_or_else(|| PcbInspectError::InvalidArgument("検索条件が不正です".into()))?;
    if let Some(label) = cascade.popup_label() {
        println!("期間: {}", label);
    }

    let mut session = ctx.load_session();
    run_cascade(&ctx.client, &mut cascade, &mut session, vec![CascadeEffect::Search(query)]).await;
    print_results(&session);
    ctx.save_session(&session)
}

pub fn select(ctx: &Context, ids: &[LotId], add: bool) -> Result<()> {
    let mut session = ctx.load_session();
    if add {
        session.add(ids)?;
    } else {
        session.select(ids)?;
    }
    ctx.save_session(&session)?;
    println!("✔ 作業リスト: {}件", session.working_set.len());
    Ok(())
}

pub fn lots(ctx: &Context, remove: &[LotId], clear: bool, xlsx: Option<&Path>) -> Result<()> {
    let mut session = ctx.load_session();
    if clear {
        session.clear();
        println!("✔ 作業リストを空にしました");
    }
    for id in remove {
        if session.remove(*id) {
            println!("✔ {} を外しました", id);
        } else {
            println!("⚠ {} は作業リストにありません", id);
        }
    }
    ctx.save_session(&session)?;

    let lots = session.working_set.lots();
    if lots.is_empty() {
        println!("作業リストは空です");
    } else {
        println!("{}", report::lots_table(lots, &session.working_set.ids()));
    }
    if let Some(path) = xlsx {
        excel::write_lots(lots, path)?;
        println!("✔ 保存: {}", path.display());
    }
    Ok(())
}

pub async fn chart(
    ctx: &Context,
    group: GroupBy,
    metrics: &[Metric],
    graph_type: GraphType,
    xlsx: Option<&Path>,
    json: Option<&Path>,
) -> Result<()> {
    let options = AnalysisOptions::from_metrics(metrics)?;
    options.validate()?;

    let session = ctx.load_session();
    let ids = session.working_set.ids();
    if ids.is_empty() {
        return Err(PcbInspectError::InvalidArgument("作業リストが空です".into()));
    }

    let summaries = ctx.client.summary_multi_or_empty(&ids).await;
    info!(requested = ids.len(), received = summaries.len(), "summary multi");
    if summaries.is_empty() {
        println!("No Data");
        return Ok(());
    }

    let spec = ChartSpec::build(&summaries, group, &options, graph_type);
    println!("{}\n", group.label());
    println!("{}", report::chart_table(&spec));

    if let Some(path) = xlsx {
        excel::write_chart(&spec, group, path)?;
        println!("✔ 保存: {}", path.display());
    }
    if let Some(path) = json {
        std::fs::write(path, serde_json::to_string_pretty(&spec.to_chartjs_config())?)?;
        println!("✔ 保存: {}", path.display());
    }
    Ok(())
}

/// `列=値1,値2`
pub fn parse_filter(arg: &str) -> Result<(String, Vec<String>)> {
    let (column, values) = arg
        .split_once('=')
        .ok_or_else(|| PcbInspectError::InvalidArgument(format!("フィルタは 列=値1,値2 の形式です: {}", arg)))?;
    let values = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect();
    Ok((column.trim().to_string(), values))
}

/// `列` または `列:desc`
pub fn parse_sort(arg: &str) -> Result<(String, bool)> {
    let (field, direction) = match arg.split_once(':') {
        Some((f, d)) => (f, d),
        None => (arg, "asc"),
    };
    if !pcb_inspect_common::sort::is_sortable(field) {
        return Err(PcbInspectError::InvalidArgument(format!("ソートできない列です: {}", field)));
    }
    let descending = match direction.parse::<pcb_inspect_common::SortDirection>() {
        Ok(d) => d == pcb_inspect_common::SortDirection::Desc,
        Err(e) => return Err(PcbInspectError::InvalidArgument(e)),
    };
    Ok((field.to_string(), descending))
}

pub struct DetailArgs {
    pub id: LotId,
    pub view: ViewMode,
    pub section: Section,
    pub sorters: Vec<String>,
    pub filters: Vec<String>,
    pub sort: Option<String>,
    pub page: u32,
    pub interactive: bool,
    pub xlsx: Option<PathBuf>,
    pub image_dir: PathBuf,
}

/// 引数で指定された状態まで詳細画面を進める
async fn prepare_detail(
    session: &mut DetailSession<'_>,
    view: ViewMode,
    sorters: &[String],
    filters: &[String],
    sort: Option<&str>,
    page: u32,
) -> Result<()> {
    if !sorters.is_empty() {
        session.set_sorters(&[]).await?;
        session.set_sorters(sorters).await?;
    }
    session.set_view(view).await?;

    for filter in filters {
        let (column, values) = parse_filter(filter)?;
        if session.state().values_for(&column).is_empty() {
            warn!("列 {} の候補がありません", column);
        }
        session.set_filter(&column, values).await?;
    }
    session.settle().await?;

    if let Some(sort) = sort {
        let (field, descending) = parse_sort(sort)?;
        session.toggle_sort(&field).await?;
        if descending {
            session.toggle_sort(&field).await?;
        }
    }
    if page > 1 {
        session.go_to_page(page).await?;
        if session.state().page() != page {
            return Err(PcbInspectError::InvalidArgument(format!(
                "ページ {} は範囲外です（全{}ページ）",
                page,
                session.state().total_pages()
            )));
        }
    }
    Ok(())
}

pub async fn detail(ctx: &Context, args: DetailArgs) -> Result<()> {
    let mut session = DetailSession::open(&ctx.client, args.id, ctx.config.debounce()).await?;
    prepare_detail(
        &mut session,
        args.view,
        &args.sorters,
        &args.filters,
        args.sort.as_deref(),
        args.page,
    )
    .await?;

    if args.interactive {
        interactive::run_interactive(&ctx.client, &mut session, &args.image_dir).await?;
    } else if args.view.data_mode().is_none() {
        if let Some(header) = session.state().header() {
            println!("{}\n", report::header_line(header));
        }
        match session.state().summary() {
            Some(summary) => println!("{}", report::summary_sections(summary, args.section)),
            None => println!("サマリがありません"),
        }
    } else {
        println!("{}", report::detail_view(session.state()));
    }

    if let Some(path) = &args.xlsx {
        excel::write_rows(session.state().rows(), path)?;
        println!("✔ 保存: {}", path.display());
    }
    session.close();
    Ok(())
}

pub async fn image(ctx: &Context, id: LotId, row: u64, view: ViewMode, output: &Path) -> Result<()> {
    if view.data_mode().is_none() || row == 0 {
        return Err(PcbInspectError::InvalidArgument("行番号と生データの表示モードを指定してください".into()));
    }
    let page = ((row - 1) / PAGE_SIZE as u64 + 1) as u32;
    let index = ((row - 1) % PAGE_SIZE as u64) as usize;

    let mut session = DetailSession::open(&ctx.client, id, ctx.config.debounce()).await?;
    prepare_detail(&mut session, view, &[], &[], None, page).await?;

    let record = session
        .state()
        .rows()
        .get(index)
        .cloned()
        .ok_or_else(|| PcbInspectError::NotFound(format!("行 {}", row)))?;
    session.close();

    let saved = crate::image::save_row_images(&ctx.client, &record, output).await?;
    if saved.is_empty() {
        println!("画像が見つかりません");
    }
    for image in saved {
        println!("✔ {}: {}", image.label, image.path.display());
    }
    Ok(())
}

pub async fn export(ctx: &Context, options: &[String], output: Option<PathBuf>) -> Result<()> {
    let options = ExportOptions::from_keys(options).map_err(PcbInspectError::InvalidArgument)?;
    if options.is_empty() {
        return Err(PcbInspectError::InvalidArgument("出力内容を1つ以上指定してください".into()));
    }

    let session = ctx.load_session();
    if session.working_set.is_empty() {
        return Err(PcbInspectError::InvalidArgument("作業リストが空です".into()));
    }
    let request = ExportRequest::new(session.working_set.lots(), options);
    let dir = output.unwrap_or_else(|| ctx.config.download_dir.clone());

    let store = progress::new_store();
    let subscription = progress::attach_terminal(&store);
    let cancel = CancellationToken::new();

    // Ctrl-C で中断
    let ctrl_c = {
        let store = store.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                progress::cancel_all(&store);
            }
        })
    };

    let today = Local::now().date_naive();
    let result = export::download_export(&ctx.client, &request, &dir, today, &store, cancel).await;
    ctrl_c.abort();
    tokio::time::sleep(pcb_inspect_common::progress::FINISH_LINGER).await;
    progress::lock(&store).unsubscribe(subscription);

    let outcome = result?;
    println!(
        "✔ 保存: {} ({})",
        outcome.path.display(),
        pcb_inspect_common::progress::format_bytes(outcome.bytes)
    );
    Ok(())
}

pub fn config(config: &mut Config, show: bool, set_api_url: Option<String>) -> Result<()> {
    if let Some(url) = set_api_url {
        config.set_api_url(url)?;
        println!("✔ APIのURLを設定しました");
    }
    if show {
        println!("設定:");
        println!("  API URL: {}", config.api_base_url);
        println!("  タイムアウト: {}秒", config.timeout_seconds);
        println!("  保存先: {}", config.download_dir.display());
        println!("  ページサイズ: {}", config.page_size);
        println!("  デバウンス: {}ms", config.debounce_ms);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        let (column, values) = parse_filter("defect_code=A1, B2,").unwrap();
        assert_eq!(column, "defect_code");
        assert_eq!(values, vec!["A1", "B2"]);

        let (_, empty) = parse_filter("strip_id=").unwrap();
        assert!(empty.is_empty(), "空指定は何も一致しないフィルタ");

        assert!(parse_filter("strip_id").is_err());
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!(parse_sort("afvi_ai_gv").unwrap(), ("afvi_ai_gv".to_string(), false));
        assert_eq!(parse_sort("afvi_ai_longest:desc").unwrap(), ("afvi_ai_longest".to_string(), true));
        assert!(parse_sort("strip_id").is_err(), "ソート対象外の列");
        assert!(parse_sort("afvi_ai_gv:up").is_err());
    }
}
