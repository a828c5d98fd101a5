use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

mod commands;
mod context;
mod ui;

#[derive(Parser)]
#[command(name = "locflow", version, about = "Localization sync toolkit (Rust)")]
struct Cli {
    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a starter locflow.toml in the current directory
    Init {
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },

    /// List translatable source files discovered under the include roots
    Scan {
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Upload sources and enqueue them for translation
    Push {
        /// Re-translate content the service already knows
        #[arg(long, default_value_t = false)]
        force: bool,
        /// Poll until translations are ready, then download and merge them
        #[arg(long, default_value_t = false)]
        wait: bool,
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },

    /// Download ready translations and merge them into local files
    Pull {
        /// Rewrite outputs even when the ledger says they are up to date
        #[arg(long, default_value_t = false)]
        force: bool,
        /// Copy existing outputs to .bak before overwriting
        #[arg(long, default_value_t = false)]
        backup: bool,
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },

    /// Show per-file translation readiness for an enqueued version
    Status {
        #[arg(long)]
        version_id: String,
    },

    /// Dump JSON Schemas for the CLI result types
    Schema {
        #[arg(long, default_value = "docs/schemas")]
        out_dir: PathBuf,
    },
}

async fn dispatch(cmd: Commands, use_color: bool) -> Result<()> {
    let cmd_name = format!("{cmd:?}");
    info!("▶ Starting command: {}", cmd_name);

    let result = match cmd {
        Commands::Init { overwrite } => commands::init::run_init(overwrite),
        Commands::Scan { json } => commands::scan::run_scan(json),
        Commands::Push {
            force,
            wait,
            dry_run,
        } => commands::push::run_push(force, wait, dry_run).await,
        Commands::Pull {
            force,
            backup,
            dry_run,
        } => commands::pull::run_pull(force, backup, dry_run).await,
        Commands::Status { version_id } => commands::status::run_status(version_id, use_color).await,
        Commands::Schema { out_dir } => commands::schema::run_schema(out_dir),
    };

    match &result {
        Ok(_) => info!("✔ Finished command: {}", cmd_name),
        Err(e) => error!("✖ Command {} failed: {:?}", cmd_name, e),
    }

    result
}

fn init_tracing() {
    let file_appender = tracing_appender::rolling::daily("logs", "locflow.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    // Keep the guard alive for the process lifetime so buffered log lines
    // are flushed on exit.
    Box::leak(Box::new(guard));

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_writer)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();

    let use_color = !cli.no_color
        && std::io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none();

    dispatch(cli.cmd, use_color).await
}
