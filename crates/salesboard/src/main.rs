mod render;
mod report;
mod routes;
mod state;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use salesboard_core::config::DashboardConfig;
use salesboard_core::fetch::{CsvDirectorySource, GoogleSheetsClient, TokenProvider};
use salesboard_core::{refresh_dashboard, Fetcher, WorksheetSource};
use state::AppState;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "salesboard.toml";
const SHEETS_ENDPOINT_VAR: &str = "SALESBOARD_SHEETS_ENDPOINT";

#[derive(Parser, Debug)]
#[command(author, version, about = "Weekly sales dashboard across department spreadsheets", long_about = None)]
struct Cli {
    /// Configuration file [default: salesboard.toml, else the built-in setup]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Read worksheets from <DIR>/<sheet_id>/<worksheet>.csv instead of Google Sheets
    #[arg(long, global = true)]
    csv_dir: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the auto-refreshing dashboard page and its JSON endpoint
    Serve(ServeArgs),
    /// Run one refresh cycle and print the result
    Report(ReportArgs),
    /// Fetch every configured source and report row counts or failures
    CheckSources,
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, default_value = "0.0.0.0:3000")]
    bind: SocketAddr,
}

#[derive(Args, Debug, Default)]
struct ReportArgs {
    /// Print the dashboard as JSON instead of tables
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // `.env` may carry RUST_LOG, so it is loaded before the subscriber.
    dotenvy::dotenv().ok();
    init_tracing(cli.log_format);

    let config = load_config(cli.config.as_deref())?;
    let source = build_source(&config, cli.csv_dir.as_deref())?;

    match cli.command {
        Command::Serve(args) => serve(config, source, args.bind).await,
        Command::Report(args) => {
            let dashboard = refresh_dashboard(&config, source.as_ref(), Utc::now()).await?;
            if args.json {
                println!("{}", dashboard.to_json()?);
            } else {
                report::print_dashboard(&dashboard);
            }
            Ok(())
        }
        Command::CheckSources => {
            let outcome = Fetcher::new(source.as_ref(), config.fetch_delay())
                .fetch_all(&config.sources, &config.columns, &config.statuses)
                .await?;
            report::print_source_check(&config, &outcome);
            if !outcome.warnings.is_empty() {
                bail!(
                    "{} of {} sources failed to load",
                    outcome.warnings.len(),
                    config.sources.len()
                );
            }
            Ok(())
        }
    }
}

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_tracing(format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

fn load_config(path: Option<&Path>) -> Result<DashboardConfig> {
    match path {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                DashboardConfig::load(default_path)
                    .with_context(|| format!("failed to load config from {DEFAULT_CONFIG_PATH}"))
            } else {
                info!("No {DEFAULT_CONFIG_PATH} found, using the built-in configuration");
                DashboardConfig::embedded_default().context("built-in configuration is invalid")
            }
        }
    }
}

fn build_source(
    config: &DashboardConfig,
    csv_dir: Option<&Path>,
) -> Result<Arc<dyn WorksheetSource>> {
    if let Some(dir) = csv_dir {
        if !dir.is_dir() {
            bail!("CSV directory {} does not exist", dir.display());
        }
        info!(dir = %dir.display(), "Reading worksheets from CSV exports");
        return Ok(Arc::new(CsvDirectorySource::new(dir)));
    }

    let tokens = TokenProvider::from_env(config.request_timeout())
        .context("Google Sheets credentials are not configured")?;
    info!(credentials = %tokens.describe(), "Reading worksheets from Google Sheets");

    let mut client = GoogleSheetsClient::new(tokens, config.request_timeout())?;
    if let Ok(endpoint) = std::env::var(SHEETS_ENDPOINT_VAR) {
        warn!(%endpoint, "Using non-default Sheets endpoint");
        client = client.with_endpoint(&endpoint)?;
    }
    Ok(Arc::new(client))
}

async fn serve(
    config: DashboardConfig,
    source: Arc<dyn WorksheetSource>,
    bind: SocketAddr,
) -> Result<()> {
    let app_state = AppState::new(config, source);
    let router = routes::router(app_state);

    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router.into_make_service()).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_from_env_file_drives_the_filter() {
        let dir = std::env::temp_dir().join(format!("salesboard-env-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let env_file = dir.join(".env");
        std::fs::write(&env_file, "RUST_LOG=salesboard=debug\n").unwrap();

        std::env::remove_var("RUST_LOG");
        assert_eq!(log_filter().to_string(), "info");

        dotenvy::from_path(&env_file).unwrap();
        assert_eq!(log_filter().to_string(), "salesboard=debug");

        std::env::remove_var("RUST_LOG");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
