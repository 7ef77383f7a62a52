//! # iospec-cli — Command-Line Front End
//!
//! Runs documents through a manager described by a YAML/JSON configuration
//! file, and prints canonical schemas.
//!
//! ## Subcommands
//!
//! - `process-input` — coerce then verify a document with the input processor
//! - `process-output` — verify then coerce a document with the output processor
//! - `normalize` — print the canonical form of a schema document
//!
//! ## Exit Codes
//!
//! `0` success, `1` the document (or schema) was rejected, `2` operational
//! error (unreadable file, malformed configuration).
//!
//! ## Crate Policy
//!
//! - Argument parsing is separate from the handlers; handlers return exit
//!   codes and leave process exit to `main`.
//! - All schema logic lives in `iospec-core`; coercion presets come from
//!   `iospec-web`.

pub mod normalize;
pub mod process;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

/// Path argument meaning standard input.
pub const STDIN_PATH: &str = "-";

/// Read a YAML or JSON document from `path` (or stdin for `-`).
///
/// Files ending in `.json` are parsed as JSON; everything else as YAML,
/// which also accepts JSON.
pub fn read_document(path: &Path) -> Result<serde_json::Value> {
    let (text, is_json) = if path.as_os_str() == STDIN_PATH {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read standard input")?;
        (buf, false)
    } else {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        (text, is_json)
    };

    if is_json {
        serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
    } else {
        serde_yaml::from_str(&text).with_context(|| format!("invalid YAML in {}", path.display()))
    }
}
