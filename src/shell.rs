//! Shell command execution with combined output capture
//!
//! Every external invocation (compiler, loader, map tool) goes through
//! [`CommandRunner`]. The runner never returns an error: callers get the
//! combined stdout+stderr blob whatever the exit status was, and an empty or
//! unexpected blob is the failure signal they interpret. Keeping the seam a
//! trait lets the map-tool layer run against canned output in tests.

use std::process::Command;

use tracing::{debug, error};

/// Executes one command line and returns its combined stdout+stderr.
pub trait CommandRunner {
    fn run(&self, command: &str) -> String;
}

/// Runs commands through `sh -c`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str) -> String {
        debug!("run command: {command}");

        let output = match Command::new("sh").arg("-c").arg(command).output() {
            Ok(output) => output,
            Err(err) => {
                error!("failed to spawn `{command}`: {err}");
                return String::new();
            }
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            error!(
                "`{command}` exited with {}: {}",
                output.status,
                combined.trim_end()
            );
        }

        combined
    }
}
