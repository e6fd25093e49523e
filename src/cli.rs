//! CLI argument parsing for blockpath

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "blockpath")]
#[command(version)]
#[command(
    about = "Install a path-block rule into the kernel's block_path_map",
    long_about = None
)]
pub struct Cli {
    /// Filesystem path to block; only the last two segments are encoded
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Enable verbose debug logging on stderr
    #[arg(long)]
    pub debug: bool,

    /// Seconds to wait for the loader to create the map before giving up
    #[arg(long = "ready-timeout", value_name = "SECS", default_value_t = 10)]
    pub ready_timeout_secs: u64,
}
