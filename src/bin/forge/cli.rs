//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell as CompletionShell;

use forge::util::shell::ColorChoice;

/// Forge - a per-project build orchestrator for C and C++
#[derive(Parser)]
#[command(name = "forge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring
    #[arg(long, global = true, value_name = "WHEN", value_enum, default_value_t)]
    pub color: ColorChoice,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new project
    New(NewArgs),

    /// Generate IDE files and open the project in an editor
    Edit(EditArgs),

    /// Build the current project and its dependencies
    Build(BuildArgs),

    /// Build and run the current application
    Run(RunArgs),

    /// Remove generated directories
    Clean(CleanArgs),

    /// Build and run the tests of the current library
    Test(TestArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct NewArgs {
    /// Project name, also used as the directory name
    pub name: String,

    /// Create a static library
    #[arg(long, conflicts_with = "dll")]
    pub lib: bool,

    /// Create a dynamic library
    #[arg(long)]
    pub dll: bool,

    /// Use the windowed subsystem (applications only)
    #[arg(long, conflicts_with_all = ["lib", "dll"])]
    pub windows: bool,

    /// Do not initialise a git repository
    #[arg(long)]
    pub no_git: bool,
}

#[derive(Args)]
pub struct EditArgs {
    /// Only generate the IDE files, do not launch the editor
    #[arg(long = "gen")]
    pub generate_only: bool,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Build with optimizations
    #[arg(short, long)]
    pub release: bool,

    /// Number of parallel compile jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct RunArgs {
    /// Build with optimizations
    #[arg(short, long)]
    pub release: bool,

    /// Number of parallel compile jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Parameters passed to the executable
    #[arg(last = true)]
    pub args: Vec<String>,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Clean every project of the workspace
    #[arg(long)]
    pub full: bool,
}

#[derive(Args)]
pub struct TestArgs {
    /// Build with optimizations
    #[arg(short, long)]
    pub release: bool,

    /// Number of parallel compile jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: CompletionShell,
}
