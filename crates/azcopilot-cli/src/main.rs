use anyhow::{Context, Result};
use azcopilot_core::{ConfigError, Configuration};
use azcopilot_planner::PlanOverrides;
use azcopilot_runtime::InMemoryBackend;
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::repl::run_repl;
use commands::run::{RunOptions, run_once};
use commands::session::Session;

#[derive(Parser, Debug)]
#[command(
    name = "azcopilot",
    version,
    about = "Natural-language commands for Azure resources"
)]
struct Cli {
    /// The command in plain words, e.g. "list my resources"
    command: Option<String>,

    /// Confirm all mutating actions without prompting
    #[arg(short = 'y', long)]
    yes: bool,

    /// Report what mutating actions would do without doing it
    #[arg(long, conflicts_with = "apply")]
    dry_run: bool,

    /// Perform mutating actions even if DEFAULT_DRY_RUN is set
    #[arg(long)]
    apply: bool,

    /// Env file to read settings from (defaults to ./.env when present)
    #[arg(long, env = "AZCOPILOT_ENV_FILE")]
    env_file: Option<PathBuf>,

    /// JSON or YAML list of resources to seed the sandbox backend with
    #[arg(long, env = "AZCOPILOT_INVENTORY")]
    inventory: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Read commands line by line, prompting for missing details
    #[arg(short, long, conflicts_with = "command")]
    interactive: bool,

    /// Print the loaded configuration and exit
    #[arg(long)]
    show_config: bool,

    /// With --show-config, print secrets in clear text
    #[arg(long, requires = "show_config")]
    unmasked: bool,
}

impl Cli {
    fn plan_overrides(&self) -> PlanOverrides {
        let dry_run = match (self.dry_run, self.apply) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        PlanOverrides { dry_run }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Configuration::load(cli.env_file.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            report_config_error(&err);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config);
    tracing::debug!(%config, "configuration loaded");

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("❌ Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: Configuration) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.show_config {
        if cli.unmasked {
            eprintln!("⚠️  Printing secrets in clear text.");
        }
        commands::config::show_config(&config, cli.unmasked, &mut out)?;
        return Ok(());
    }

    let backend = match &cli.inventory {
        Some(path) => InMemoryBackend::from_inventory_file(config.subscription_id.clone(), path)
            .with_context(|| format!("Failed to load inventory {}", path.display()))?,
        None => InMemoryBackend::new(config.subscription_id.clone()),
    };
    let overrides = cli.plan_overrides();
    let session = Session::new(config, backend, overrides);

    match cli.command.as_deref() {
        Some(command) if !cli.interactive => {
            let options = RunOptions {
                yes: cli.yes,
                json: cli.json,
            };
            run_once(&session, command, options, &mut out).await?;
        }
        _ => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            run_repl(&session, cli.yes, cli.json, &mut input, &mut out).await?;
        }
    }

    out.flush()?;
    Ok(())
}

/// Log filter: RUST_LOG wins, then DEBUG=true, then LOG_LEVEL.
fn init_tracing(config: &Configuration) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config.debug {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new(config.log_level.filter_directive())
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn report_config_error(err: &ConfigError) {
    eprintln!("\n❌ Configuration Error: {err}\n");
    if let ConfigError::Validation(validation) = err {
        eprintln!("💡 Quick Setup:");
        for (i, step) in validation.remediation().iter().enumerate() {
            eprintln!("   {}. {step}", i + 1);
        }
        eprintln!();
    }
}
