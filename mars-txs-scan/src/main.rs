//! Mars transaction scanner CLI.
//!
//! Pages through FCD transaction history and writes one CSV row per
//! transaction that claimed staking rewards or moved MARS-UST LP tokens.
//!
//! # Usage
//!
//! ```bash
//! # Scan every task into ./data
//! mars-txs-scan scan --data-dir ./data
//!
//! # Scan only the Apollo compounder, discarding earlier progress
//! mars-txs-scan scan --task apollo --fresh
//!
//! # Use a different FCD endpoint and retry policy
//! mars-txs-scan scan --config ./config.toml
//!
//! # Export distinct users of a finished scan
//! mars-txs-scan users --task spectrum
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use mars_txs_scan::config::Config;
use mars_txs_scan::fetcher::{self, FcdClient};
use mars_txs_scan::{tasks, users};
// Only the library derives its errors with it.
use thiserror as _;

/// Mars transaction scanner.
#[derive(Debug, Parser)]
#[command(name = "mars-txs-scan", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Page through transaction history and write per-task CSV files.
    Scan {
        /// Output directory for CSV and cursor files.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Task to run (repeatable). If omitted, all tasks run.
        #[arg(long = "task")]
        tasks: Vec<String>,

        /// Runtime configuration file.
        #[arg(long, default_value = "config.toml")]
        config: PathBuf,

        /// Ignore saved progress and scan from the newest transaction.
        #[arg(long)]
        fresh: bool,
    },

    /// Export the distinct users of a task's CSV as JSON.
    Users {
        /// Directory holding the task's CSV.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Task whose CSV is read.
        #[arg(long)]
        task: String,
    },

    /// List all known scan tasks.
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Scan {
            data_dir,
            tasks: names,
            config,
            fresh,
        } => cmd_scan(data_dir, &names, config, fresh).await,
        Command::Users { data_dir, task } => {
            let task = tasks::by_name(&task).with_context(|| format!("unknown task {task}"))?;
            users::export(task, &data_dir).map(|_| ())
        }
        Command::List => {
            cmd_list();
            Ok(())
        }
    }
}

/// Execute the `scan` subcommand.
async fn cmd_scan(data_dir: PathBuf, names: &[String], config: PathBuf, fresh: bool) -> Result<()> {
    let config = Config::load(&config)?;

    let targets: Vec<&tasks::ScanTask> = if names.is_empty() {
        tasks::ALL.iter().collect()
    } else {
        names
            .iter()
            .map(|n| tasks::by_name(n).with_context(|| format!("unknown task {n}")))
            .collect::<Result<_>>()?
    };

    let client = FcdClient::new(&config)?;

    tracing::info!(
        tasks = targets.len(),
        api = %config.api_url,
        data_dir = %data_dir.display(),
        "starting scan"
    );

    let mut success = 0u32;
    let mut failed = 0u32;

    for task in &targets {
        match fetcher::scan_task(&client, task, &config, &data_dir, fresh).await {
            Ok(summary) => {
                success += 1;
                tracing::info!(
                    task = task.name,
                    pages = summary.pages,
                    new_rows = summary.new_rows,
                    rows = summary.total_rows,
                    "task complete"
                );
            }
            Err(e) => {
                failed += 1;
                tracing::error!(task = task.name, error = %format!("{e:#}"), "task failed");
            }
        }
    }

    tracing::info!(success, failed, "scan finished");

    if failed > 0 {
        bail!("{failed} task(s) failed");
    }

    Ok(())
}

/// Execute the `list` subcommand.
#[allow(clippy::print_stdout, reason = "table output is the command's purpose")]
fn cmd_list() {
    println!(
        "{:<10} {:<46} {:<32} COLUMNS",
        "Task", "Account", "Output"
    );
    println!("{}", "-".repeat(120));

    for task in tasks::ALL {
        println!(
            "{:<10} {:<46} {:<32} {} / {}",
            task.name, task.account, task.output, task.columns[0], task.columns[1],
        );
    }
}
