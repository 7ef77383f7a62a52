//! # Normalize Subcommand
//!
//! `iospec normalize <schema>` parses a schema document in the JSON/YAML
//! authoring form and prints its canonical tree, e.g.
//! `{age?: int = 0, name: str, tags: [str]}`.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use iospec_core::{normalize_json, SpecDefinitionError, SpecNode};

use crate::read_document;

/// Arguments for `iospec normalize`.
#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Schema document (YAML or JSON; `-` reads stdin).
    #[arg(value_name = "SCHEMA")]
    pub schema: PathBuf,
}

/// Parse and normalize the schema at `args.schema`.
pub fn normalize_schema(args: &NormalizeArgs) -> Result<Result<SpecNode, SpecDefinitionError>> {
    let document = read_document(&args.schema)?;
    Ok(normalize_json(&document))
}

/// Execute `normalize`.
///
/// Returns exit code: 0 when the schema is valid, 1 when it is not.
pub fn run_normalize(args: &NormalizeArgs) -> Result<u8> {
    match normalize_schema(args)? {
        Ok(spec) => {
            println!("{spec}");
            Ok(0)
        }
        Err(e) => {
            println!("FAIL: {}: {e}", args.schema.display());
            Ok(1)
        }
    }
}
