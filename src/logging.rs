//! Tracing setup and output modes

use crate::error::{AnnounceError, Result};
use std::io;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// How a pipeline reports progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecMode {
    /// Styled progress lines on stdout, plus tracing events
    #[default]
    Cli,
    /// Tracing events only; the embedding program owns the output
    Api,
}

/// Verbosity selected by the global CLI flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    Silent,
    Quiet,
    #[default]
    Normal,
    Debug,
}

impl Verbosity {
    /// `--silent` beats `--quiet`, which beats `--debug`
    pub fn from_flags(debug: bool, quiet: bool, silent: bool) -> Self {
        if silent {
            Verbosity::Silent
        } else if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }

    /// Level for this crate's tracing events when `RUST_LOG` is unset
    pub fn level(&self) -> &'static str {
        match self {
            Verbosity::Silent => "off",
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Debug => "debug",
        }
    }

    /// Whether styled progress lines are printed
    pub fn shows_progress(&self) -> bool {
        *self >= Verbosity::Normal
    }
}

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` overrides the level derived from `verbosity`.
pub fn init_tracing(verbosity: Verbosity) -> Result<()> {
    let level = verbosity.level();
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("announce={level}")))
        .map_err(|e| AnnounceError::config(format!("invalid tracing filter: {e}")))?;

    let layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(io::stderr)
        .with_target(verbosity == Verbosity::Debug);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layer)
        .try_init()
        .map_err(|e| AnnounceError::config(format!("cannot install tracing subscriber: {e}")))?;

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_precedence() {
        assert_eq!(Verbosity::from_flags(true, true, true), Verbosity::Silent);
        assert_eq!(Verbosity::from_flags(true, true, false), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(true, false, false), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(false, false, false), Verbosity::Normal);
    }

    #[test]
    fn test_progress_visibility() {
        assert!(Verbosity::Debug.shows_progress());
        assert!(Verbosity::Normal.shows_progress());
        assert!(!Verbosity::Quiet.shows_progress());
        assert!(!Verbosity::Silent.shows_progress());
    }
}
