//! Sequential discover -> pin -> clear -> update pipeline
//!
//! Each stage fully completes before the next begins. The compiler check
//! runs before anything else so a missing toolchain aborts with no state
//! touched; after that, individual command failures are logged-only and
//! surface as a downstream fatal condition instead of an immediate one.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::loader;
use crate::lock::{RunLock, LOCK_PATH};
use crate::maptool::{MapTool, MAP_NAME, PIN_PATH};
use crate::shell::ShellRunner;

/// Pipeline knobs handed down from the CLI layer.
#[derive(Debug, Clone)]
pub struct Options {
    /// Path to encode and install.
    pub path: String,
    /// Bound on the loader readiness wait.
    pub ready_timeout: Duration,
}

/// Run the full pipeline for one path.
pub fn run(opts: &Options) -> Result<()> {
    println!("Checking for {}...", loader::COMPILER);
    loader::ensure_compiler()?;

    let _lock =
        RunLock::acquire(Path::new(LOCK_PATH)).context("acquiring the blockpath run lock")?;

    let runner = ShellRunner;

    println!("Compiling eBPF program from {}...", loader::KERNEL_SOURCE);
    loader::compile(&runner);

    println!("Starting loader in the background...");
    loader::start_loader().context("starting loader")?;

    println!("Waiting for map {MAP_NAME}...");
    let tool = MapTool::new(runner);
    let id = loader::wait_for_map(&tool, opts.ready_timeout)?;
    println!("Found map id: {id}");

    let pinned = tool.pin(&id);
    println!("Map pinned at {PIN_PATH}");

    println!("Adding path to map: {}", opts.path);
    pinned.install(&opts.path);

    println!("Completed!");
    Ok(())
}
