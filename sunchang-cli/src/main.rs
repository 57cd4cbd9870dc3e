use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use sunchang_core::{NodeStatus, monthly_cash_flow, payables, receivables, today_in_firm_tz};
use sunchang_sheet::fetcher::cache_busted_url;
use sunchang_sheet::{
    ConnectionTest, ExportView, SheetClient, Snapshot, SnapshotStore, export_to_path, load_snapshot,
    test_connection,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod advisor;
mod config;
mod llm;
mod render;
mod state;

use config::{Config, init_config, load_config, save_config};

#[derive(Parser, Debug)]
#[command(
    name = "sunchang",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("SUNCHANG_BUILD_SHA"), ")"),
    about = "上澄聯合 receivable/payable milestone ledger"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the collection and print the dashboard
    Sync {
        /// Sheet endpoint (overrides config)
        #[arg(long)]
        url: Option<String>,

        /// Print the normalized nodes as JSON instead
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Re-sync every N seconds until Ctrl-C
        #[arg(long)]
        watch: Option<u64>,
    },

    /// Accounts receivable nodes
    Receivables {
        #[arg(long)]
        url: Option<String>,

        /// Write CSV (default file name when PATH is omitted)
        #[arg(long, value_name = "PATH")]
        export: Option<Option<PathBuf>>,
    },

    /// Accounts payable nodes with per-category totals
    Payables {
        #[arg(long)]
        url: Option<String>,

        /// Write CSV (default file name when PATH is omitted)
        #[arg(long, value_name = "PATH")]
        export: Option<Option<PathBuf>>,
    },

    /// Month-by-month projection of open nodes
    Cashflow {
        #[arg(long)]
        url: Option<String>,
    },

    /// Fetch once and report what came back
    TestConnection {
        #[arg(long)]
        url: Option<String>,
    },

    /// Data-source and advisor settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// AI CFO report on the current collection
    Advise {
        #[arg(long)]
        url: Option<String>,
    },

    /// Draft a reminder email for a receivable
    Remind {
        /// Node id
        id: String,

        #[arg(long)]
        url: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the effective config and its path
    Show,
    /// Write a default config.toml if none exists
    Init,
    /// Save the sheet endpoint URL
    SetUrl { url: String },
    /// Forget the endpoint (offline mode)
    ClearUrl,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Sync { url, json, watch } => {
            let cfg = load_config()?;
            match watch {
                Some(secs) => watch_loop(&cfg, url.as_deref(), json, secs.max(1)).await?,
                None => {
                    let snap = load(&cfg, url.as_deref()).await;
                    print_sync(&cfg, &snap, json)?;
                }
            }
        }

        Command::Receivables { url, export } => {
            let cfg = load_config()?;
            let snap = load(&cfg, url.as_deref()).await;
            println!("# 應收帳款節點\n");
            println!("{}", render::source_line(&snap));
            print!("{}", render::node_table(&receivables(&snap.nodes)));
            if let Some(path) = export {
                write_export(path, ExportView::Receivables, &snap)?;
            }
        }

        Command::Payables { url, export } => {
            let cfg = load_config()?;
            let snap = load(&cfg, url.as_deref()).await;
            println!("# 支付節點與支出\n");
            println!("{}", render::source_line(&snap));
            print!("{}", render::category_summary(&snap.nodes));
            println!();
            print!("{}", render::node_table(&payables(&snap.nodes)));
            if let Some(path) = export {
                write_export(path, ExportView::Payables, &snap)?;
            }
        }

        Command::Cashflow { url } => {
            let cfg = load_config()?;
            let snap = load(&cfg, url.as_deref()).await;
            println!("# 現金流預測\n");
            println!("{}", render::source_line(&snap));
            print!("{}", render::cash_flow(&monthly_cash_flow(&snap.nodes)));
        }

        Command::TestConnection { url } => {
            let cfg = load_config()?;
            let target = cfg.resolve_endpoint(url.as_deref()).unwrap_or_default();
            let result = test_connection(&SheetClient::new(), &target, today_in_firm_tz()).await;
            println!("{}", connection_report(&result)?);
        }

        Command::Config { command } => match command {
            ConfigCommand::Show => {
                let cfg = load_config()?;
                println!("# {}\n", config::config_path()?.display());
                let mut shown = cfg.clone();
                if shown.advisor.api_key.is_some() {
                    shown.advisor.api_key = Some("********".to_string());
                }
                print!("{}", toml::to_string_pretty(&shown).context("serialize config")?);
            }
            ConfigCommand::Init => init_config()?,
            ConfigCommand::SetUrl { url } => {
                cache_busted_url(&url, 0).with_context(|| format!("rejecting endpoint {url}"))?;
                let mut cfg = load_config()?;
                cfg.sheet.endpoint_url = Some(url.trim().to_string());
                save_config(&cfg)?;
                println!("Saved endpoint to {}", config::config_path()?.display());
            }
            ConfigCommand::ClearUrl => {
                let mut cfg = load_config()?;
                cfg.sheet.endpoint_url = None;
                save_config(&cfg)?;
                println!("Endpoint cleared; using built-in offline data.");
            }
        },

        Command::Advise { url } => {
            let cfg = load_config()?;
            let snap = load(&cfg, url.as_deref()).await;
            println!("# AI 財務長洞察\n");
            println!("{}\n", render::source_line(&snap));
            let report = advisor::analyze_financial_health(&cfg.advisor, &snap.nodes).await;
            println!("{report}");
        }

        Command::Remind { id, url } => {
            let cfg = load_config()?;
            let snap = load(&cfg, url.as_deref()).await;
            let Some(node) = snap.nodes.iter().find(|n| n.id == id) else {
                bail!("no node with id {id} ({} nodes loaded)", snap.nodes.len());
            };
            if !node.is_income() {
                bail!("node {id} is a payable; reminders are for receivables");
            }
            if node.status != NodeStatus::Overdue {
                eprintln!("note: node {id} is {}, not overdue", node.status.code());
            }
            let email = advisor::generate_reminder_email(&cfg.advisor, node).await;
            println!("{email}");
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Success message, or the failure message as an error.
fn connection_report(result: &ConnectionTest) -> Result<String> {
    if !result.is_success() {
        bail!("{}", result.message());
    }
    Ok(result.message())
}

/// Fetch + normalize, or fall back; the banner goes to stderr.
async fn load(cfg: &Config, url_flag: Option<&str>) -> Snapshot {
    let endpoint = cfg.resolve_endpoint(url_flag);
    let snap = load_snapshot(&SheetClient::new(), endpoint.as_deref(), today_in_firm_tz()).await;
    if let Some(banner) = &snap.banner {
        eprintln!("! {banner}");
    }
    snap
}

fn print_sync(cfg: &Config, snap: &Snapshot, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&snap.nodes).context("serialize nodes")?
        );
    } else {
        print!(
            "{}",
            render::dashboard(snap, today_in_firm_tz(), cfg.display.upcoming_days)
        );
    }
    Ok(())
}

async fn watch_loop(cfg: &Config, url_flag: Option<&str>, json: bool, secs: u64) -> Result<()> {
    let store = SnapshotStore::new(load(cfg, url_flag).await);
    print_sync(cfg, &store.current(), json)?;

    let mut tick = tokio::time::interval(Duration::from_secs(secs));
    tick.tick().await;

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let ticket = store.begin();
                let snap = load(cfg, url_flag).await;
                if store.commit(ticket, snap) {
                    println!();
                    print_sync(cfg, &store.current(), json)?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nstopped");
                return Ok(());
            }
        }
    }
}

fn write_export(path: Option<PathBuf>, view: ExportView, snap: &Snapshot) -> Result<()> {
    let path = path.unwrap_or_else(|| PathBuf::from(view.default_file_name()));
    let rows = export_to_path(&path, view, &snap.nodes)
        .with_context(|| format!("write {}", path.display()))?;
    println!("\nExported {} rows to {}", rows, path.display());
    Ok(())
}
