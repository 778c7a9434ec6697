use anyhow::Context as _;
use clap::Parser;
use pcb_inspect::cli::{Cli, Commands};
use pcb_inspect::commands::{self, Context, DetailArgs};
use pcb_inspect::config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(verbose: bool) {
    let default = if verbose { "pcb_inspect=debug,pcb_inspect_common=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load().context("設定の読み込みに失敗しました")?;

    let command = match cli.command {
        Commands::Config { show, set_api_url } => {
            commands::config(&mut config, show, set_api_url)?;
            return Ok(());
        }
        other => other,
    };

    let ctx = Context::new(config, cli.session).context("クライアントの初期化に失敗しました")?;

    match command {
        Commands::Search { vendor, machine, item, lot } => {
            commands::search(&ctx, vendor, machine, item, lot).await?;
        }

        Commands::Find { from, to, text } => {
            commands::find(&ctx, from, to, text).await?;
        }

        Commands::Select { ids, add } => {
            commands::select(&ctx, &ids, add)?;
        }

        Commands::Lots { remove, clear, xlsx } => {
            commands::lots(&ctx, &remove, clear, xlsx.as_deref())?;
        }

        Commands::Chart { group, metrics, graph_type, xlsx, json } => {
            commands::chart(&ctx, group, &metrics, graph_type, xlsx.as_deref(), json.as_deref()).await?;
        }

        Commands::Detail { id, view, section, sorters, filters, sort, page, interactive, xlsx, image_dir } => {
            let args = DetailArgs { id, view, section, sorters, filters, sort, page, interactive, xlsx, image_dir };
            commands::detail(&ctx, args)
                .await
                .with_context(|| format!("ロット {} の詳細表示に失敗しました", id))?;
        }

        Commands::Export { options, output } => {
            println!("📦 pcb-inspect - エクスポート\n");
            commands::export(&ctx, &options, output).await?;
        }

        Commands::Image { id, row, view, output } => {
            commands::image(&ctx, id, row, view, &output).await?;
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}
