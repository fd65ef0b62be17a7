//! CLI subcommands

use std::path::PathBuf;

use frontdesk_core::config::Config;
use thiserror::Error;

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

pub mod completions;
pub mod config;
pub mod conflicts;

/// Settings shared by every subcommand
#[derive(Debug)]
pub struct CommandContext {
    pub format: OutputFormat,
    pub quiet: bool,
    /// Path given with `--config`, or the platform default
    pub config_path: PathBuf,
    /// Configuration loaded from `config_path`, or defaults
    pub config: Config,
}

impl CommandContext {
    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        get_formatter(self.format, self.quiet)
    }

    pub fn is_json(&self) -> bool {
        self.format.is_json()
    }
}

/// A failure the command has already shown to the user
///
/// `main` exits non-zero for it without printing it a second time.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct Reported(pub String);
