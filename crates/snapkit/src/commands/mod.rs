//! Command handlers for the snapkit CLI.

pub mod compare;
pub mod config;
pub mod job;
pub mod logging;
pub mod snapshot;

pub use compare::*;
pub use config::*;
pub use job::*;
pub use logging::*;
pub use snapshot::*;

use anyhow::{bail, Result};
use serde::Serialize;
use snapkit_snapshot::{Snapper, SnapperUndo};

/// Shared state for one CLI invocation.
pub struct Context {
    pub snapper: Snapper,
    pub undo: SnapperUndo,
    /// Snapper configuration to operate on.
    pub config: String,
    /// Print JSON instead of text.
    pub json: bool,
}

impl Context {
    /// Print `value` as JSON when `--json` was given, otherwise run `text`.
    pub fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text(value);
        }
        Ok(())
    }
}

/// Split a `KEY=VALUE` argument.
pub fn parse_assignment(arg: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => bail!("Expected KEY=VALUE, got '{arg}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("NUMBER_LIMIT=10").unwrap(),
            ("NUMBER_LIMIT".to_string(), "10".to_string())
        );
        assert_eq!(
            parse_assignment("note=a=b").unwrap(),
            ("note".to_string(), "a=b".to_string())
        );
        assert_eq!(parse_assignment("EMPTY=").unwrap().1, "");
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=x").is_err());
    }
}
