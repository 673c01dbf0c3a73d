//! Forge CLI - a per-project build orchestrator for C and C++

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use forge::core::error::{BuildError, ConfigError};
use forge::util::diagnostic::{emit, suggestions, Diagnostic};
use forge::util::shell::Shell;

fn main() {
    let cli = Cli::parse();
    let shell = Shell::from_flags(cli.quiet, cli.verbose, cli.color);

    // Set up logging; RUST_LOG takes precedence over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("forge=debug")
        } else {
            EnvFilter::new("forge=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    if let Err(e) = run(cli.command, shell) {
        if let Some(config_error) = e.downcast_ref::<ConfigError>() {
            emit(&config_error.to_diagnostic(), shell.use_color());
        } else if let Some(BuildError::CompilationFailed { .. } | BuildError::LinkFailed { .. }) =
            e.downcast_ref::<BuildError>()
        {
            let diag =
                Diagnostic::error(format!("{:#}", e)).with_suggestion(suggestions::BUILD_FAILED);
            emit(&diag, shell.use_color());
        } else {
            eprintln!("error: {:#}", e);
        }
        std::process::exit(1);
    }
}

fn run(command: Commands, shell: Shell) -> Result<()> {
    match command {
        Commands::New(args) => commands::new::execute(args, shell),
        Commands::Edit(args) => commands::edit::execute(args, shell),
        Commands::Build(args) => commands::build::execute(args, shell),
        Commands::Run(args) => commands::run::execute(args, shell),
        Commands::Clean(args) => commands::clean::execute(args, shell),
        Commands::Test(args) => commands::test::execute(args, shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
