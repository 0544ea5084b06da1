use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use commands::{Robot, run_check, run_markup, run_upload};
use rosetta_common::RobotError;
use rosetta_common::observability::{LogConfig, LogFormat, init_logging};
use rosetta_config::{RobotConfig, RobotConfigLoader};
use rosetta_http::HttpClient;
use rosetta_source::RustdocGenerator;
use rosetta_web::{MarkupLocator, RosettaSite, WikiSession};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

mod cli;
mod commands;

const DEFAULT_CONFIG_FILE: &str = "rosetta-robot.yaml";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            eprintln!("{failed} file(s) failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<usize> {
    // 1) Load config (env wins)
    let loader = RobotConfigLoader::new();
    let loader = match &cli.config {
        Some(path) => loader.with_file(path),
        None => loader.with_optional_file(DEFAULT_CONFIG_FILE),
    };
    let cfg: RobotConfig = loader.load().context("loading configuration")?;

    // 2) Logging from config + verbosity flags
    let log_file = init_logging(LogConfig {
        log_dir: cfg.log.dir.as_deref().map(PathBuf::from),
        emit_stderr: cli.verbose,
        format: cfg
            .log
            .format
            .as_deref()
            .map(LogFormat::from_name)
            .unwrap_or(LogFormat::Text),
        default_filter: cli.log_filter(),
        ..Default::default()
    })?;
    tracing::info!(target: "app", log_file = %log_file.display(), command = ?cli.command, dry_run = cli.dry_run, "robot.start");

    // 3) Wire the site, doc generator and robot
    let http = HttpClient::new(&cfg.site.origin)?
        .with_timeout(Duration::from_secs(cfg.http.timeout_secs))
        .with_retries(cfg.http.retries);
    // Section anchors use underscores for spaces ("Visual_Basic").
    let locator = MarkupLocator::new(http.base().clone(), cfg.site.language.replace(' ', "_"));
    let robot = Robot::new(
        RustdocGenerator::new(cfg.rustdoc.program.clone(), cfg.rustdoc.args.clone()),
        RosettaSite::new(http.clone(), locator),
        cfg.site.language.clone(),
    );

    let mut out = std::io::stdout();
    match cli.command {
        Command::Check {
            out_file,
            offline,
            files,
        } => run_check(&robot, files.as_slice(), offline, out_file.as_deref(), &mut out).await,
        Command::Markup { files } => run_markup(&robot, files.as_slice(), &mut out).await,
        Command::Upload { files } => {
            let wiki = if cli.dry_run {
                None
            } else {
                Some(login(&cfg, http).await?)
            };
            run_upload(&robot, wiki.as_ref(), files.as_slice(), &mut out).await
        }
    }
}

async fn login(cfg: &RobotConfig, http: HttpClient) -> Result<WikiSession> {
    let (username, password) = cfg
        .credentials
        .resolved()
        .ok_or_else(|| {
            RobotError::Config(
                "upload needs credentials.username and credentials.password (or --dry-run)".into(),
            )
        })?;
    let wiki = WikiSession::new(http, cfg.site.api_path.clone());
    wiki.login(username, password)
        .await
        .with_context(|| format!("logging in to {} as {username}", cfg.site.origin))?;
    Ok(wiki)
}
