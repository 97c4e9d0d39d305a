use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::{Command as Process, ExitCode};

use eyre::{Result, WrapErr};
use log::{debug, info};

mod cli;

use cli::{Cli, Command};
use ytsum::config::{self, Config};
use ytsum::error::PipelineError;

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytsum.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytsum")
        .join("logs")
}

fn tool_version(name: &str) -> Option<String> {
    Process::new(name)
        .arg("--version")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| {
            String::from_utf8_lossy(&o.stdout)
                .trim()
                .lines()
                .next()
                .unwrap_or("")
                .to_string()
        })
}

fn build_after_help() -> String {
    let yt_dlp_line = match tool_version(config::DEFAULT_YT_DLP) {
        Some(v) => format!("  \x1b[32m✅\x1b[0m yt-dlp     {v}"),
        None => "  \x1b[31m❌\x1b[0m yt-dlp     (not found on PATH, needed for caption downloads)".to_string(),
    };

    let log_path = log_dir().join("ytsum.log");

    format!(
        "\nREQUIRED TOOLS:\n{yt_dlp_line}\n\nThe Gemini API key is read from GEMINI_API_KEY or gemini_api_key in the config file.\nLogs are written to: {}",
        log_path.display()
    )
}

/// Print a one-shot summary or its error message.
///
/// Pipeline errors already carry their own `Error:` prefix, so they are printed as-is.
fn report_summary(
    result: std::result::Result<String, PipelineError>,
    out: &mut impl Write,
    err: &mut impl Write,
) -> std::io::Result<ExitCode> {
    match result {
        Ok(summary) => {
            writeln!(out, "{summary}")?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            writeln!(err, "{e}")?;
            Ok(ExitCode::FAILURE)
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    let config_path = cli.config.clone().unwrap_or_else(config::config_path);
    let config = Config::load_from(&config_path)?;
    if cli.verbose && config_path.exists() {
        eprintln!("Config: {}", config_path.display());
    }
    debug!("Gemini model: {}, caption language: {}", config.gemini_model(), config.caption_lang());

    let client = reqwest::Client::new();
    let pipeline = ytsum::build_pipeline(&config, client)?;

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => {
            let bind = bind.as_deref().unwrap_or(config.bind());
            let addr: SocketAddr = bind.parse().wrap_err_with(|| format!("invalid bind address: {bind}"))?;

            let state = ytsum::server::AppState::new(pipeline);
            let app = ytsum::server::router(state, config.allowed_origin())?;

            if cli.verbose {
                eprintln!("Listening on http://{addr} (CORS origin {})", config.allowed_origin());
            }
            ytsum::server::serve(addr, app).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Summarize { url } => {
            let result = pipeline.run(url.trim()).await;
            let code = report_summary(result, &mut std::io::stdout(), &mut std::io::stderr())?;
            Ok(code)
        }
    }
}
