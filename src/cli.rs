use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{DEFAULT_BUFFER_KB, DEFAULT_FILE_MB};
use crate::engine::CategoryHook;
use crate::scan::DEFAULT_EXTENSION;

#[derive(Debug, Clone, Parser)]
#[command(name = "class-catalog")]
#[command(about = "Catalog controller routes and service methods of a Java source tree")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// trace, debug, info, warn or error
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Scan a source tree and write one CSV file family per category
    Scan(ScanArgs),
    /// Extract a single file and print its record as JSON
    Extract {
        file: PathBuf,

        #[arg(short, long, value_enum)]
        category: Option<CategoryHook>,

        #[arg(long, value_name = "FILE")]
        keywords: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ScanArgs {
    pub root: PathBuf,

    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    #[arg(long, value_name = "KB", default_value_t = DEFAULT_BUFFER_KB)]
    pub buffer_kb: u64,

    #[arg(long, value_name = "MB", default_value_t = DEFAULT_FILE_MB)]
    pub file_mb: u64,

    /// JSON table of path keywords per category
    #[arg(long, value_name = "FILE")]
    pub keywords: Option<PathBuf>,

    #[arg(long, value_name = "EXT", default_value = DEFAULT_EXTENSION)]
    pub extension: String,

    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,
}
