use std::path::PathBuf;

use armature_core::ProgressMode;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "armature",
    version,
    about = "Scaffold front-end projects and delegate their tooling"
)]
pub struct Args {
    /// Suppress progress rendering and non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Verbose logging (overrides the configured level)
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scaffold a new project from a template
    Create(CreateArgs),
    /// List available project templates
    Templates,
    /// Write a default user configuration file
    Init(InitArgs),
    /// Run the project's build script
    Build(ScriptArgs),
    /// Run the project's dev-server script
    Dev(ScriptArgs),
    /// Run the project's lint script
    Lint(ScriptArgs),
    /// Stage, commit, and push the current project
    Sync(SyncArgs),
}

#[derive(clap::Args, Debug)]
pub struct CreateArgs {
    /// Project name (also the default target directory)
    pub name: String,

    /// Template id; detected from the project name when omitted
    #[arg(long, short)]
    pub template: Option<String>,

    /// Target directory (defaults to ./<name>)
    #[arg(long, short)]
    pub directory: Option<PathBuf>,

    /// Scaffold into a non-empty directory
    #[arg(long)]
    pub force: bool,

    /// Skip git repository initialization
    #[arg(long)]
    pub no_git: bool,

    /// Skip registry resolution and pin dependencies to their dist-tag
    #[arg(long)]
    pub offline: bool,

    /// Progress indicator style
    #[arg(long, value_enum, default_value_t = ProgressStyleArg::Spinner)]
    pub progress: ProgressStyleArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStyleArg {
    Spinner,
    Bar,
}

impl From<ProgressStyleArg> for ProgressMode {
    fn from(style: ProgressStyleArg) -> Self {
        match style {
            ProgressStyleArg::Spinner => ProgressMode::Spinner,
            ProgressStyleArg::Bar => ProgressMode::Bar,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args, Debug)]
pub struct ScriptArgs {
    /// Project directory (defaults to the current directory)
    #[arg(long, short)]
    pub dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct SyncArgs {
    /// Commit message for local changes
    #[arg(long, short)]
    pub message: Option<String>,

    /// Project directory (defaults to the current directory)
    #[arg(long, short)]
    pub dir: Option<PathBuf>,
}
