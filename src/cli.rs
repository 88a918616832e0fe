use clap::Parser;
use std::path::PathBuf;

use crate::model::DEFAULT_MAX_BLOCKS;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Input .json blueprint document (compact or legacy)
    pub input: PathBuf,
    /// Output .json file, `-` for stdout
    #[arg(default_value = "-")]
    pub output: PathBuf,
    /// Block catalog: a JSON id list or {"version", "source", "blocks"}
    #[arg(long)]
    pub catalog: Option<PathBuf>,
    /// Maximum number of blocks kept in the blueprint
    #[arg(long, default_value_t = DEFAULT_MAX_BLOCKS)]
    pub max_blocks: usize,
    /// Pretty-print the output JSON
    #[arg(long)]
    pub pretty: bool,
    /// More log output (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            return tracing::Level::ERROR;
        }
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
