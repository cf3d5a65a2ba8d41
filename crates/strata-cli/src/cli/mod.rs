//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use strata_adapters::ResolverStrategy;

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "strata",
    bin_name = "strata",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Layered project generation with line-level merge",
    long_about = "Strata builds a project from a stack of template layers. \
                  Files named by merge rules are merged line by line; \
                  overlapping edits become conflicts you can resolve.",
    after_help = "EXAMPLES:\n\
        \x20 strata generate ./templates/web-app my-app\n\
        \x20 strata generate web-app my-app -a lang=__template.typescript -C docker\n\
        \x20 strata generate web-app . --upgrade --strategy keep-former\n\
        \x20 strata plan web-app -a ci=true\n\
        \x20 strata completions bash > /usr/share/bash-completion/completions/strata",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate a project from a template.
    #[command(
        visible_alias = "g",
        about = "Generate a project",
        after_help = "EXAMPLES:\n\
            \x20 strata generate ./templates/web-app my-app\n\
            \x20 strata g web-app my-app --answer ci=true --component docker --yes\n\
            \x20 strata g web-app my-app --upgrade"
    )]
    Generate(GenerateArgs),

    /// Show which layers a template would stack, without merging.
    #[command(
        about = "Show the composed layer order",
        after_help = "EXAMPLES:\n\
            \x20 strata plan web-app\n\
            \x20 strata plan web-app -a lang=__template.typescript -C docker"
    )]
    Plan(PlanArgs),

    /// Initialise a Strata configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 strata init           # default location\n\
            \x20 strata init --local   # .strata.toml in CWD"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 strata completions bash > ~/.local/share/bash-completion/completions/strata\n\
            \x20 strata completions zsh  > ~/.zfunc/_strata\n\
            \x20 strata completions fish > ~/.config/fish/completions/strata.fish"
    )]
    Completions(CompletionsArgs),

    /// Manage the Strata configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 strata config get generate.strategy\n\
            \x20 strata config set loader.max_retries 5\n\
            \x20 strata config list"
    )]
    Config(ConfigCommands),
}

// ── shared template selection ─────────────────────────────────────────────────

/// Template, answers and components, shared by `generate` and `plan`.
#[derive(Debug, Clone, Args)]
pub struct TemplateArgs {
    /// Template directory, or a template name found in `generate.template_paths`.
    #[arg(value_name = "TEMPLATE", help = "Template path or name")]
    pub template: String,

    /// Answer a question up front. Values are read as JSON when they parse.
    #[arg(
        short = 'a',
        long = "answer",
        value_name = "KEY=VALUE",
        help = "Answer a question (repeatable)"
    )]
    pub answers: Vec<String>,

    /// JSON object of answers.
    #[arg(long = "answers", value_name = "FILE", help = "Read answers from a JSON file")]
    pub answers_file: Option<PathBuf>,

    /// Components to add, in order.
    #[arg(
        short = 'C',
        long = "component",
        value_name = "NAME",
        value_delimiter = ',',
        help = "Add a component (repeatable, or comma separated)"
    )]
    pub components: Vec<String>,

    /// Never prompt; unanswered questions take their defaults.
    #[arg(short = 'y', long = "yes", help = "Use defaults instead of prompting")]
    pub yes: bool,
}

// ── generate ──────────────────────────────────────────────────────────────────

/// Arguments for `strata generate`.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub template: TemplateArgs,

    /// Output directory.
    #[arg(value_name = "DEST", help = "Project directory to write")]
    pub dest: PathBuf,

    /// How to settle merge conflicts. Defaults to `generate.strategy`.
    #[arg(
        short = 's',
        long = "strategy",
        value_enum,
        value_name = "STRATEGY",
        help = "Conflict strategy"
    )]
    pub strategy: Option<StrategyArg>,

    /// Merge into an existing project, diffing against its current files.
    #[arg(long = "upgrade", conflicts_with = "force", help = "Merge into an existing project")]
    pub upgrade: bool,

    /// Write into an existing directory, replacing generated paths.
    #[arg(long = "force", help = "Overwrite files in an existing directory")]
    pub force: bool,

    /// Skip the patch cache for this run.
    #[arg(long = "no-cache", help = "Do not read or write the patch cache")]
    pub no_cache: bool,

    /// Preview what would be created without writing any files.
    #[arg(long = "dry-run", help = "Show what would be written without writing")]
    pub dry_run: bool,
}

/// Conflict strategies on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Take the later layer's lines.
    #[value(alias = "theirs")]
    KeepCurrent,
    /// Take the earlier layer's lines.
    #[value(alias = "ours")]
    KeepFormer,
    /// Keep markers without reporting the file.
    IgnoreAll,
    /// Keep markers and report the file.
    LeaveUnresolved,
    /// Ask for each conflict.
    Prompt,
}

impl StrategyArg {
    /// The scripted strategy, or `None` for `prompt`.
    pub fn scripted(self) -> Option<ResolverStrategy> {
        match self {
            Self::KeepCurrent => Some(ResolverStrategy::KeepCurrent),
            Self::KeepFormer => Some(ResolverStrategy::KeepFormer),
            Self::IgnoreAll => Some(ResolverStrategy::IgnoreAll),
            Self::LeaveUnresolved => Some(ResolverStrategy::LeaveUnresolved),
            Self::Prompt => None,
        }
    }
}

impl From<ResolverStrategy> for StrategyArg {
    fn from(strategy: ResolverStrategy) -> Self {
        match strategy {
            ResolverStrategy::KeepCurrent => Self::KeepCurrent,
            ResolverStrategy::KeepFormer => Self::KeepFormer,
            ResolverStrategy::IgnoreAll => Self::IgnoreAll,
            ResolverStrategy::LeaveUnresolved => Self::LeaveUnresolved,
        }
    }
}

// ── plan ──────────────────────────────────────────────────────────────────────

/// Arguments for `strata plan`.
#[derive(Debug, Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub template: TemplateArgs,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `strata init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write to `.strata.toml` in the current directory.
    #[arg(
        long = "local",
        help = "Create local configuration in current directory"
    )]
    pub local: bool,

    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `strata completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `strata config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `generate.strategy`.
        key: String,
    },
    /// Set a key in the configuration file.
    Set {
        /// Dotted key path.
        key: String,
        /// New value.
        value: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────
