use clap::Parser;
use std::path::{Path, PathBuf};
use zlog_parser::{ParserOptions, DEFAULT_BATCH_SIZE};

const LOCAL_LOG: &str = "z.log";
const SYSTEM_LOG: &str = "/var/log/zypper.log";

/// Summarize zypper/libzypp log files per command.
#[derive(Debug, Parser)]
#[command(name = "zlog-viewer", version, about)]
pub struct Args {
    /// Log files, read in the given order. Defaults to ./z.log or /var/log/zypper.log.
    pub paths: Vec<PathBuf>,

    /// Deliver records to the model once more than this many are pending
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Print the records of the command with this pid
    #[arg(long)]
    pub pid: Option<u32>,

    /// Print a JSON summary instead of the text table
    #[arg(long)]
    pub json: bool,

    /// Export all records to this CSV file
    #[arg(long, value_name = "FILE")]
    pub csv: Option<PathBuf>,
}

impl Args {
    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            batch_size: self.batch_size,
        }
    }

    /// The paths to read, falling back to the usual log locations.
    pub fn resolve_paths(&self, cwd: &Path) -> Vec<PathBuf> {
        if !self.paths.is_empty() {
            return self.paths.clone();
        }
        let local = cwd.join(LOCAL_LOG);
        if local.exists() {
            vec![local]
        } else {
            vec![PathBuf::from(SYSTEM_LOG)]
        }
    }
}
