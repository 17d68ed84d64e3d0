//! Styled terminal output for the CLI
//!
//! [Progress] is handed to every pipeline stage. In [ExecMode::Cli] it prints
//! styled lines; in every mode it emits the matching tracing event.

use crate::logging::{ExecMode, Verbosity};
use console::style;
use tracing::info;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Format and print a skipped stage in dim text.
pub fn display_skipped(message: &str) {
    println!("{} {}", style("↷").dim(), style(message).dim());
}

/// Print a bold section heading
pub fn display_heading(message: &str) {
    println!("\n{}", style(message).bold());
}

/// Progress reporter for one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    mode: ExecMode,
    verbosity: Verbosity,
}

impl Progress {
    pub fn new(mode: ExecMode, verbosity: Verbosity) -> Self {
        Progress { mode, verbosity }
    }

    /// Reporter that only emits tracing events
    pub fn api() -> Self {
        Progress::new(ExecMode::Api, Verbosity::Normal)
    }

    pub fn mode(&self) -> ExecMode {
        self.mode
    }

    fn prints(&self) -> bool {
        self.mode == ExecMode::Cli && self.verbosity.shows_progress()
    }

    pub fn heading(&self, message: &str) {
        info!("{}", message);
        if self.prints() {
            display_heading(message);
        }
    }

    /// A stage has started
    pub fn step(&self, message: &str) {
        info!("{}", message);
        if self.prints() {
            display_status(message);
        }
    }

    /// A stage finished
    pub fn done(&self, message: &str) {
        info!("{}", message);
        if self.prints() {
            display_success(message);
        }
    }

    pub fn skipped(&self, message: &str) {
        info!(skipped = true, "{}", message);
        if self.prints() {
            display_skipped(message);
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Progress::new(ExecMode::Cli, Verbosity::Normal)
    }
}
