use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use series_source::providers::JsonDirSource;
use site_stats::config::load_settings_path;
use site_stats::db::migrate;
use site_stats::runner::{RunOptions, run_analysis};
use site_stats::store::{SqliteStatisticsStore, StatisticsStore};
use site_stats::tz;
use tracing::info;

#[derive(Parser)]
#[command(version, about = "Site energy statistics")]
struct Cli {
    /// SQLite database (path or sqlite: URL); falls back to DATABASE_URL, then the config file.
    #[arg(long, global = true, value_name = "URL")]
    database: Option<String>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Apply embedded migrations.
    Migrate,
    /// Run every configured analysis and store the results.
    Run {
        #[arg(long, value_name = "FILE")]
        config: String,
        #[arg(long)]
        dry_run: bool,
        /// Override the window with a rolling window of N months.
        #[arg(long, value_name = "N")]
        months: Option<u32>,
    },
    /// Print stored statistics of one series.
    Show {
        #[arg(long, value_name = "ID")]
        series: i64,
        /// RFC3339, inclusive.
        #[arg(long)]
        from: Option<String>,
        /// RFC3339, exclusive. Open-ended when omitted.
        #[arg(long)]
        to: Option<String>,
    },
}

fn database_url(flag: Option<String>, config: Option<&str>) -> Result<String> {
    if let Some(url) = flag {
        return Ok(url);
    }
    if let Some(url) = shared_utils::env::get_env_var_opt("DATABASE_URL") {
        return Ok(url);
    }
    match config {
        Some(url) => Ok(url.to_string()),
        None => bail!("no database: pass --database or set DATABASE_URL"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Cmd::Migrate => {
            let db_url = database_url(cli.database, None)?;
            migrate::run_all(&db_url)?;
        }
        Cmd::Run {
            config,
            dry_run,
            months,
        } => {
            // 1) Read TOML
            let mut settings = load_settings_path(&config)?;
            if let Some(n) = months {
                settings.window.months = Some(n);
                settings.window.from = None;
                settings.window.to = None;
            }

            // 2) Open DB + make sure the schema is current
            let db_url = database_url(cli.database, settings.database_url.as_deref())?;
            migrate::run_all(&db_url)?;
            let store = Arc::new(SqliteStatisticsStore::new(db_url));
            let source = Arc::new(JsonDirSource::new(settings.source.dir.clone()));

            // 3) Run
            let opts = RunOptions {
                dry_run,
                ..Default::default()
            };
            let summary = run_analysis(&settings, source, store, opts).await?;
            for f in &summary.failures {
                eprintln!("failed: {} ({})", f.series, f.error);
            }
            println!(
                "{} meters, {} rows computed, {} rows written",
                summary.meters, summary.rows_computed, summary.rows_written
            );
            if !summary.failures.is_empty() {
                bail!("{} meter(s) failed", summary.failures.len());
            }
        }
        Cmd::Show { series, from, to } => {
            let db_url = database_url(cli.database, None)?;
            let from = match from {
                Some(s) => tz::parse_ts_to_utc(&s).context("--from")?,
                None => chrono::DateTime::UNIX_EPOCH,
            };
            // open-ended by default: current-month windows end in the future
            let to = match to {
                Some(s) => tz::parse_ts_to_utc(&s).context("--to")?,
                None => chrono::DateTime::<chrono::Utc>::MAX_UTC,
            };
            let store = SqliteStatisticsStore::new(db_url);
            let rows = tokio::task::spawn_blocking(move || store.find_between(series, from, to)).await??;
            info!(series, rows = rows.len(), "statistics loaded");
            for r in rows {
                println!(
                    "{}\t{}\t{}\t{:.3}\t{}{}",
                    tz::to_rfc3339_millis(r.window_start),
                    tz::to_rfc3339_millis(r.window_end),
                    r.key,
                    r.value,
                    r.description,
                    r.event_time
                        .map(|t| format!("\t@{}", tz::to_rfc3339_millis(t)))
                        .unwrap_or_default()
                );
            }
        }
    }

    Ok(())
}
