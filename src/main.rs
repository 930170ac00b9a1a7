use anyhow::Result;
use clap::{CommandFactory, Parser};

use unity_sweeper::cli::{Cli, Command};
use unity_sweeper::commands;
use unity_sweeper::config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbose, cli.quiet);

    // Completions need no configuration
    if let Command::Completions(args) = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(args.shell, &mut cmd, "unity-sweeper", &mut std::io::stdout());
        return Ok(());
    }

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    tracing::debug!(?config, "Loaded configuration");

    // Dispatch to subcommand
    match cli.command {
        Command::Validate(args) => {
            tracing::info!(?args, "Validating project");
            commands::validate::run(args, &config)?;
        }
        Command::Clean(args) => {
            tracing::info!(?args, "Starting clean");
            commands::clean::run(args, &config)?;
        }
        Command::Discover(args) => {
            tracing::info!(?args, "Discovering projects");
            commands::discover::run(args, &config)?;
        }
        Command::Recent(args) => {
            commands::recent::run(args, &config)?;
        }
        Command::Processes(args) => {
            commands::processes::run(args, &config)?;
        }
        Command::Build(args) => {
            tracing::info!(?args, "Starting build");
            commands::build::run(args, &config)?;
        }
        Command::Status(args) => {
            commands::status::run(args, &config)?;
        }
        Command::Completions(_) => {}
    }

    Ok(())
}

fn init_logging(verbosity: u8, quiet: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if quiet {
        "warn"
    } else {
        match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("unity_sweeper={}", level)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}
