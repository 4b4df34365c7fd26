//! yt-grab - grab videos with yt-dlp from your terminal
//!
//! Downloads a video capped at a chosen resolution, merging audio and video
//! with ffmpeg, and shows live progress.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use yt_grab::core::{downloader, pipeline};
use yt_grab::error::Result;
use yt_grab::storage::config;
use yt_grab::types::{Config, LaunchSpec, Resolution};
use yt_grab::ui::reporter::create_reporter;
use yt_grab::utils::paths::ensure_dir;

/// Grab videos with yt-dlp from your terminal, with live progress.
#[derive(Parser, Debug)]
#[command(name = "yt-grab")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Video URL (prompted for when omitted)
    url: Option<String>,

    /// Maximum video height
    #[arg(short, long, value_enum)]
    resolution: Option<Resolution>,

    /// Download folder (defaults to the configured one)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print progress as JSON lines instead of a progress bar
    #[arg(long)]
    json: bool,

    /// Edit the configuration file
    #[arg(short, long)]
    edit: bool,

    /// Show debug logs
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "yt_grab=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Turn CLI input and config into a ready-to-run yt-dlp invocation
async fn prepare(cli: &Cli, cfg: &Config, url: &str) -> Result<LaunchSpec> {
    let output_dir = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&cfg.download_dir));
    let resolution = cli.resolution.unwrap_or(cfg.resolution);

    let request = downloader::new_request(url, resolution, output_dir)?;
    let tools = downloader::resolve_tools(cfg)?;
    ensure_dir(&request.output_dir).await?;

    info!(
        url = %request.url,
        %resolution,
        dir = %request.output_dir.display(),
        "starting download"
    );
    Ok(downloader::build_launch_spec(&request, &tools))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Handle --edit flag
    if cli.edit {
        let cfg = config::load_config().await?;
        config::edit_config(&cfg.editor).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let cfg = config::load_config().await?;

    let url = match cli.url.clone() {
        Some(url) => url,
        None => dialoguer::Input::<String>::new()
            .with_prompt("Video URL")
            .allow_empty(true)
            .interact_text()?,
    };

    let reporter = create_reporter(cli.json);

    let spec = match prepare(&cli, &cfg, &url).await {
        Ok(spec) => spec,
        Err(e) => {
            reporter.finish(&Err(e));
            return Ok(ExitCode::FAILURE);
        }
    };

    // This loop is the only place the reporter is touched
    let mut job = pipeline::spawn(spec);
    while let Some(event) = job.next_event().await {
        reporter.handle(&event);
    }
    let result = job.wait().await;
    reporter.finish(&result);

    Ok(match result {
        Ok(outcome) if outcome.is_success() => ExitCode::SUCCESS,
        Ok(outcome) => u8::try_from(outcome.exit_code())
            .ok()
            .filter(|code| *code != 0)
            .map(ExitCode::from)
            .unwrap_or(ExitCode::FAILURE),
        Err(_) => ExitCode::FAILURE,
    })
}
