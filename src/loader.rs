//! External toolchain driver: compiler check, loader startup, readiness wait
//!
//! The compiler and loader are opaque collaborators looked up on PATH (or as
//! relative paths). The loader runs in the background and is never waited on;
//! readiness is observed by polling the map listing until the target map
//! appears, bounded by a real timeout, instead of assuming attachment after a
//! fixed sleep.

use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::maptool::{MapError, MapTool};
use crate::shell::CommandRunner;

/// Compiler that turns the kernel source into a loadable package.
pub const COMPILER: &str = "./ecc-aarch64";

/// Fixed kernel-side source file handed to the compiler.
pub const KERNEL_SOURCE: &str = "final.c";

/// Loader command started in the background.
const LOADER_CMD: &str = "env PATH=$PATH ./ecli run package.json";

/// Poll interval while waiting for the loader to create the map.
const READY_POLL: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("compiler `{0}` not found, install it and retry")]
    CompilerMissing(String),

    #[error("failed to start loader `{LOADER_CMD}`: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("loader did not become ready within {timeout:?}")]
    NotReady {
        timeout: Duration,
        #[source]
        source: MapError,
    },
}

/// Fatal pre-pipeline check: the compiler must exist before any state is
/// touched. Relative paths are resolved against the working directory, like
/// a shell would.
pub fn ensure_compiler() -> Result<(), LoaderError> {
    which::which(COMPILER)
        .map(|_| ())
        .map_err(|_| LoaderError::CompilerMissing(COMPILER.to_string()))
}

/// Compile the kernel program. A failed compile is logged by the runner and
/// surfaces downstream when the map never appears.
pub fn compile<R: CommandRunner>(runner: &R) {
    runner.run(&format!("{COMPILER} {KERNEL_SOURCE}"));
}

/// Start the loader in the background with inherited stdio. The child is
/// deliberately not waited on; the pipeline continues once the map shows up.
pub fn start_loader() -> Result<(), LoaderError> {
    Command::new("sh")
        .arg("-c")
        .arg(LOADER_CMD)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()?;
    Ok(())
}

/// Poll the map listing until the target map appears, returning its id.
///
/// Map creation is the loader's only effect this pipeline depends on, so the
/// listing doubles as the readiness signal. On timeout the last locator
/// failure is carried as the error source.
pub fn wait_for_map<R: CommandRunner>(
    tool: &MapTool<R>,
    timeout: Duration,
) -> Result<String, LoaderError> {
    let deadline = Instant::now() + timeout;
    loop {
        match tool.locate() {
            Ok(id) => return Ok(id),
            Err(source) => {
                if Instant::now() >= deadline {
                    return Err(LoaderError::NotReady { timeout, source });
                }
                thread::sleep(READY_POLL);
            }
        }
    }
}
