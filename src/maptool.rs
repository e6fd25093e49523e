//! Narrow interface over the external `bpftool` binary
//!
//! All textual parsing of `bpftool map` output lives in this module, behind
//! typed methods, so it could be swapped for a structured output mode without
//! touching the pipeline. Map ids are rediscovered on every run — they are
//! not stable across program reloads. Clearing and updating go through the
//! [`PinnedMap`] handle returned by [`MapTool::pin`], making the pin
//! dependency an explicit parameter rather than a filesystem side channel.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::encode::PathRecord;
use crate::shell::CommandRunner;

/// Name the kernel program gives the path-block map.
pub const MAP_NAME: &str = "block_path_map";

/// Well-known bpffs location where the map is exposed between commands.
pub const PIN_PATH: &str = "/sys/fs/bpf/block_path_map";

/// The map holds exactly one slot, keyed by this 4-byte zero sentinel.
pub const SENTINEL_KEY_HEX: &str = "00 00 00 00";

#[derive(Debug, Error)]
pub enum MapError {
    #[error("map `{0}` not found in `bpftool map show` output")]
    NotFound(&'static str),
}

/// Typed wrapper around `bpftool map` subcommands.
pub struct MapTool<R> {
    runner: R,
}

impl<R: CommandRunner> MapTool<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Locate the target map's id by name.
    ///
    /// The LAST matching listing line wins: when the listing carries stale or
    /// duplicate entries for the same name, the most recently listed one is
    /// authoritative.
    pub fn locate(&self) -> Result<String, MapError> {
        let listing = self.runner.run("bpftool map show");
        find_map_id(&listing, MAP_NAME).ok_or(MapError::NotFound(MAP_NAME))
    }

    /// Pin `id` at [`PIN_PATH`], unpinning any stale binding first — the
    /// kernel rejects pinning over an existing entry. Failures are logged by
    /// the runner and left for the clear/update steps to surface.
    pub fn pin(&self, id: &str) -> PinnedMap<'_, R> {
        if self.is_pinned() {
            println!("Stale pin at {PIN_PATH}, unpinning...");
            self.runner.run(&format!("bpftool map unpin {PIN_PATH}"));
        }
        self.runner
            .run(&format!("bpftool map pin id {id} {PIN_PATH}"));
        PinnedMap { tool: self }
    }

    /// Probe whether anything currently sits at [`PIN_PATH`]. Probe errors
    /// are suppressed: absence is an expected steady state, not a failure.
    fn is_pinned(&self) -> bool {
        !self
            .runner
            .run(&format!("ls {PIN_PATH} 2>/dev/null"))
            .is_empty()
    }
}

/// Handle to the map pinned at [`PIN_PATH`].
pub struct PinnedMap<'a, R> {
    tool: &'a MapTool<R>,
}

impl<R: CommandRunner> PinnedMap<'_, R> {
    /// Remove the sentinel entry if the map holds one.
    ///
    /// An empty map is an expected steady state and skips the delete; a dump
    /// without the element-count trailer (failed command, unexpected format)
    /// falls through to the delete, whose own failure is logged-only.
    pub fn clear(&self) {
        let dump = self
            .tool
            .runner
            .run(&format!("bpftool map dump pinned {PIN_PATH}"));
        if element_count(&dump) == Some(0) {
            println!("Map is empty, skipping delete.");
            return;
        }
        self.tool.runner.run(&format!(
            "bpftool map delete pinned {PIN_PATH} key hex {SENTINEL_KEY_HEX}"
        ));
    }

    /// Overwrite the single slot with the record for `path`.
    ///
    /// Clears first so the update can never collide with a previous entry;
    /// applying the same path twice leaves exactly one entry, the record of
    /// the second call. No retry — the command's raw output is surfaced for
    /// operator inspection.
    pub fn install(&self, path: &str) {
        self.clear();

        let record = PathRecord::from_path(path);
        let update = format!(
            "bpftool map update pinned {PIN_PATH} \\\n    key hex {SENTINEL_KEY_HEX} \\\n    value hex \\\n    {}",
            record.value_hex()
        );

        println!("Exec command:\n{update}");
        let output = self.tool.runner.run(&update);
        if !output.trim().is_empty() {
            println!("{}", output.trim_end());
        }
    }
}

/// Extract the id from the last listing line naming `map_name`: first
/// whitespace-delimited field, trailing colon stripped.
fn find_map_id(listing: &str, map_name: &str) -> Option<String> {
    let mut id = None;
    for line in listing.lines() {
        if !line.contains(map_name) {
            continue;
        }
        if let Some(first) = line.split_whitespace().next() {
            id = Some(first.strip_suffix(':').unwrap_or(first).to_string());
        }
    }
    debug!("map listing matched id: {id:?}");
    id
}

/// Parse the `Found N elements` trailer of a dump. `None` when the trailer
/// is absent.
fn element_count(dump: &str) -> Option<usize> {
    static TRAILER: OnceLock<Regex> = OnceLock::new();
    let re = TRAILER
        .get_or_init(|| Regex::new(r"Found (\d+) elements?").expect("hardcoded pattern is valid"));
    re.captures(dump)?.get(1)?.as_str().parse().ok()
}
