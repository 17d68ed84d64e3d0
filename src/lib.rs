pub mod config;
pub mod domain;
pub mod error;
pub mod files;
pub mod git;
pub mod history;
pub mod host;
pub mod logging;
pub mod manifest;
pub mod pipeline;
pub mod ui;

pub use error::{AnnounceError, Result};
pub use logging::{ExecMode, Verbosity};
