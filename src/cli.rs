use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fencecheck")]
#[command(version, about = "Find uncommented lines in Markdown code samples", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Parser, Debug)]
pub enum Commands {
    /// Scan a Markdown file or directory for code lines without comments
    Scan(ScanArgs),

    /// Write a default configuration file
    Init(InitArgs),
}

#[derive(Parser, Debug)]
pub struct ScanArgs {
    /// File or directory to scan (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    pub format: OutputFormat,

    /// List every missing line instead of the top blocks
    #[arg(short, long)]
    pub detailed: bool,

    /// Show only the top N blocks with the most missing comments
    #[arg(long, default_value = "3")]
    pub top: usize,

    /// Output file (if not specified, writes to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to custom config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Fence language to audit (overrides config)
    #[arg(short, long)]
    pub language: Option<String>,

    /// Single-line comment marker (overrides config)
    #[arg(short = 'm', long)]
    pub comment_marker: Option<String>,

    /// Exit with status 1 when any line is missing a comment (errors exit with 2)
    #[arg(long)]
    pub check: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Where to write the config file
    #[arg(default_value = ".fencecheckrc")]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Formatted table output for terminal
    Terminal,
    /// Markdown format
    Markdown,
    /// JSON format
    Json,
}

/// How much of each result to print
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// Total plus the top N blocks per file
    Summary { top: usize },
    /// Every block and every missing line
    Detailed,
}

impl ScanArgs {
    pub fn report_mode(&self) -> ReportMode {
        if self.detailed {
            ReportMode::Detailed
        } else {
            ReportMode::Summary { top: self.top }
        }
    }
}
