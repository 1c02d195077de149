mod commands;
mod docker;

use clap::{Parser, Subcommand};
use commands::SelectionArgs;
use shipflow_config::RunConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ship")]
#[command(about = "Dockerfile を探索し、依存順にビルド・プッシュする", long_about = None)]
struct Cli {
    /// 設定ファイル (shipflow.kdl) のパス
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// デバッグログを出力
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// イメージをビルドしてレジストリにプッシュ
    Run {
        #[command(flatten)]
        selection: SelectionArgs,

        /// プッシュを行わない（ビルドのみ）
        #[arg(long)]
        no_push: bool,

        /// ビルドキャッシュを使わない
        #[arg(long)]
        no_cache: bool,

        /// 失敗したユニットがあっても終了コード 0 で終了する
        #[arg(long)]
        allow_failures: bool,
    },
    /// ビルド対象とビルド順を表示（Docker 不要）
    Plan {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// バージョン情報を表示
    Version,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>, selection: &SelectionArgs) -> anyhow::Result<RunConfig> {
    let mut config = RunConfig::load(path.map(PathBuf::as_path))?;
    selection.apply(&mut config);
    tracing::debug!(?config, "Resolved run configuration");
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Version => {
            println!("shipflow {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Plan { selection } => {
            let config = load_config(cli.config.as_ref(), &selection)?;
            commands::plan::handle(&config)
        }
        Commands::Run {
            selection,
            no_push,
            no_cache,
            allow_failures,
        } => {
            let mut config = load_config(cli.config.as_ref(), &selection)?;
            if no_push {
                config.push_enabled = false;
            }
            if no_cache {
                config.no_cache = true;
            }
            commands::run::handle(&config, allow_failures).await
        }
    }
}
