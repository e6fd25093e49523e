//! Fixed-width record encoding for the path-block map
//!
//! The kernel program holds one record of two null-padded 64-byte fields,
//! `parent` and `child`, matching its `char parent[64]; char child[64];`
//! struct. Only the last two path segments are retained. Segments longer
//! than a field are truncated to fit, never rejected — the consuming map
//! format fixes the width, so distinct overlong paths can collapse to the
//! same record; a warning makes that observable.

use tracing::warn;

/// Width of each record field in bytes, matching the kernel-side struct.
pub const FIELD_LEN: usize = 64;

/// Bytes rendered per line in `value hex` formatting.
const BYTES_PER_LINE: usize = 16;

/// Continuation joining hex lines into a single shell command.
const LINE_CONT: &str = " \\\n    ";

/// The two fixed-width fields written under the sentinel key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRecord {
    pub parent: [u8; FIELD_LEN],
    pub child: [u8; FIELD_LEN],
}

impl PathRecord {
    /// Build a record from a filesystem path.
    ///
    /// Leading/trailing separators are trimmed and the remainder split on
    /// `/`: the last segment becomes `child`, the one before it (if any)
    /// `parent`. A path with a single segment gets an all-zero parent, and
    /// an empty path encodes to an all-zero record.
    pub fn from_path(path: &str) -> Self {
        let (parent, child) = split_segments(path);
        Self {
            parent: pad_field(parent),
            child: pad_field(child),
        }
    }

    /// Both fields as hex blocks joined by a line continuation, in the shape
    /// `bpftool map update ... value hex` expects.
    pub fn value_hex(&self) -> String {
        format!(
            "{}{}{}",
            hex_block(&self.parent),
            LINE_CONT,
            hex_block(&self.child)
        )
    }
}

/// Split a path into its (parent, child) segments.
fn split_segments(path: &str) -> (&str, &str) {
    let trimmed = path.trim_matches('/');
    let segments: Vec<&str> = trimmed.split('/').collect();
    match segments.len() {
        0 => ("", ""),
        1 => ("", segments[0]),
        n => (segments[n - 2], segments[n - 1]),
    }
}

/// Null-pad one segment into a fixed-width field, truncating overlong input.
fn pad_field(segment: &str) -> [u8; FIELD_LEN] {
    let bytes = segment.as_bytes();
    if bytes.len() > FIELD_LEN {
        warn!(
            "segment `{segment}` exceeds {FIELD_LEN} bytes, truncating to fit the map field"
        );
    }

    let mut field = [0u8; FIELD_LEN];
    let len = bytes.len().min(FIELD_LEN);
    field[..len].copy_from_slice(&bytes[..len]);
    field
}

/// Format a field as space-separated lowercase hex byte pairs, with a line
/// continuation after every 16 bytes.
fn hex_block(field: &[u8; FIELD_LEN]) -> String {
    let encoded = hex::encode(field);
    let pairs: Vec<&str> = (0..encoded.len())
        .step_by(2)
        .map(|i| &encoded[i..i + 2])
        .collect();

    pairs
        .chunks(BYTES_PER_LINE)
        .map(|line| line.join(" "))
        .collect::<Vec<_>>()
        .join(LINE_CONT)
}
