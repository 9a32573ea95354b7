// nodewatch - poll mesh node payloads and keep a reconciled CSV snapshot

mod config;
mod exit_codes;
mod fetch;
mod logging;
mod pass;
mod sources;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, info, warn, LevelFilter};
use serde::Serialize;

use config::{ConfigError, Overrides, Settings, SourceMode};
use exit_codes::{EXIT_CONFIG, EXIT_SOURCE_FAILED, EXIT_SUCCESS, EXIT_USAGE};
use fetch::FetchClient;
use pass::{run_pass, PassReport};

#[derive(Parser)]
#[command(name = "nodewatch")]
#[command(about = "Fetch mesh node payloads and reconcile them into a CSV snapshot")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one reconciliation pass per configured source
    #[command(after_help = "\
Examples:
  nodewatch run
  nodewatch run --url https://nef05mon.karte.neanderfunk.de/data/nodes.json
  nodewatch run --sources urls.txt --output-dir data/
  nodewatch run --config /etc/nodewatch.toml --order grouped --json")]
    Run {
        #[command(flatten)]
        overrides: Overrides,

        /// Print per-source reports as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Resolve and validate configuration without fetching anything
    #[command(after_help = "\
Examples:
  nodewatch check-config
  nodewatch check-config --sources urls.txt --output-dir data/")]
    CheckConfig {
        #[command(flatten)]
        overrides: Overrides,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nrecon:   nodewatch-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        None => Err(CliError::usage("no command given")
            .with_hint("run `nodewatch run` or see `nodewatch --help`")),
        Some(Commands::Run { overrides, json }) => cmd_run(&overrides, json),
        Some(Commands::CheckConfig { overrides }) => cmd_check_config(&overrides),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn config(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::NoSources => {
                Some("pass --url or --sources, or set them in nodewatch.toml".to_string())
            }
            ConfigError::SourcesEmpty { .. } => {
                Some("add one URL per line; `#` starts a comment".to_string())
            }
            _ => None,
        };
        Self { code: EXIT_CONFIG, message: err.to_string(), hint }
    }

    /// Already reported through the logger.
    pub fn silent(code: u8) -> Self {
        Self { code, message: String::new(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn load_settings(overrides: &Overrides) -> Result<(Settings, Option<PathBuf>), ConfigError> {
    let (mut settings, from) = Settings::load(overrides.config.as_deref())?;
    settings.apply(overrides);
    settings.validate()?;
    Ok((settings, from))
}

/// Route a failure that happened before logging was configured to the log
/// file named on the command line, or the default one. Falls back to a
/// plain stderr message when that file cannot be opened.
fn log_early_failure(overrides: &Overrides, err: ConfigError) -> CliError {
    let log_file = overrides
        .log_file
        .clone()
        .unwrap_or_else(|| Settings::default().log_file);
    let mut cli_err = CliError::config(err);
    if logging::init(&log_file, LevelFilter::Error).is_ok() {
        error!("{}", cli_err.message);
        cli_err.message.clear();
    }
    cli_err
}

#[derive(Serialize)]
#[serde(untagged)]
enum SourceOutcome {
    Reconciled(PassReport),
    Failed { url: String, error: String },
}

fn cmd_run(overrides: &Overrides, json: bool) -> Result<(), CliError> {
    let (settings, from) = match load_settings(overrides) {
        Ok(loaded) => loaded,
        Err(e) => return Err(log_early_failure(overrides, e)),
    };
    let level = settings.level_filter().map_err(|e| log_early_failure(overrides, e))?;
    logging::init(&settings.log_file, level).map_err(CliError::config)?;

    // From here on configuration errors are logged, not printed.
    let fail = |e: ConfigError| {
        error!("{e}");
        CliError::silent(EXIT_CONFIG)
    };

    match &from {
        Some(path) => info!("Configuration loaded from {}", path.display()),
        None => info!("No configuration file, using defaults and flags"),
    }

    let mode = settings.resolve_sources().map_err(fail)?;
    if let SourceMode::List { file, ignored_url, sources } = &mode {
        if let Some(url) = ignored_url {
            warn!("Both url ({url}) and sources_file set, using {}", file.display());
        }
        info!("{} sources listed in {}", sources.len(), file.display());
        fs::create_dir_all(&settings.output_dir)
            .map_err(|e| ConfigError::Setup {
                path: settings.output_dir.clone(),
                message: e.to_string(),
            })
            .map_err(fail)?;
    }

    let client = FetchClient::new(settings.timeout()).map_err(|e| {
        error!("{e}");
        CliError::silent(EXIT_SOURCE_FAILED)
    })?;

    let mut outcomes = Vec::new();
    let mut failed = 0usize;
    for source in mode.sources() {
        match run_pass(source, &client, &settings.recon) {
            Ok(report) => outcomes.push(SourceOutcome::Reconciled(report)),
            Err(e) => {
                error!("Source {} skipped: {e}", source.url);
                failed += 1;
                outcomes.push(SourceOutcome::Failed { url: source.url.clone(), error: e.to_string() });
            }
        }
    }

    if json {
        let text = serde_json::to_string_pretty(&outcomes).map_err(|e| CliError {
            code: EXIT_SOURCE_FAILED,
            message: format!("cannot encode report: {e}"),
            hint: None,
        })?;
        println!("{}", text);
    }

    if failed > 0 {
        error!("{failed} of {} sources failed", outcomes.len());
        return Err(CliError::silent(EXIT_SOURCE_FAILED));
    }
    Ok(())
}

fn cmd_check_config(overrides: &Overrides) -> Result<(), CliError> {
    let (settings, from) = load_settings(overrides).map_err(CliError::config)?;
    let mode = settings.resolve_sources().map_err(CliError::config)?;

    match &from {
        Some(path) => println!("config:    {}", path.display()),
        None => println!("config:    (none, defaults)"),
    }
    println!("log file:  {} ({})", settings.log_file.display(), settings.log_level);
    println!("timeout:   {}s", settings.timeout_secs);
    println!(
        "recon:     default_value={:?} ipv6={} order={}",
        settings.recon.default_value, settings.recon.ipv6, settings.recon.write_order
    );

    if let SourceMode::List { file, ignored_url, .. } = &mode {
        println!("sources:   {}", file.display());
        if let Some(url) = ignored_url {
            println!("note:      url {} ignored, sources file takes precedence", url);
        }
    }
    for source in mode.sources() {
        println!(
            "  {}\n    -> {}\n    -> {}",
            source.url,
            source.snapshot.display(),
            source.raw_json.display()
        );
    }
    Ok(())
}
