//! CLI parse: clap types for proforma. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Proforma CLI - Batch proposal rendering through a generation backend
#[derive(Parser)]
#[command(name = "proforma")]
#[command(about = "Render proposal records to publishable HTML via an LLM backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Suppress all log output
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Record selection policy for `run` and `plan`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Every record in the input directory
    All,
    /// Records named in the changed-path list; all records if none match
    Changed,
    /// Records with no artifact in the output directory yet
    MissingOutput,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Select records, generate artifacts, and write the run summary
    Run {
        /// Record selection mode
        #[arg(long, value_enum, default_value_t = ModeArg::All)]
        mode: ModeArg,

        /// File listing changed source paths, one per line (for --mode changed)
        #[arg(long)]
        changed_list: Option<PathBuf>,

        /// Provider entry to use (defaults to config default_provider)
        #[arg(long)]
        provider: Option<String>,
    },
    /// Show which records a run would process, without calling any backend
    Plan {
        /// Record selection mode
        #[arg(long, value_enum, default_value_t = ModeArg::All)]
        mode: ModeArg,

        /// File listing changed source paths, one per line (for --mode changed)
        #[arg(long)]
        changed_list: Option<PathBuf>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Validate configuration and workspace layout
    Validate,
    /// Initialize workspace config, instructions, and directories
    Init {
        /// Force re-initialization (overwrite existing files)
        #[arg(long)]
        force: bool,

        /// List what would be initialized without creating
        #[arg(long)]
        list: bool,
    },
}
