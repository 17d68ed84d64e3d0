//! Project files: which ones carry the version, and rewriting them

pub mod ignore_rules;
pub mod replace;
pub mod resolver;

pub use ignore_rules::{compile_ignore_rules, IgnoreRule, IgnoreRules};
pub use replace::{
    replace_version_in_files, write_atomically, ReplacementFailure, ReplacementOutcome,
    ReplacementReport, TextReplacer,
};
pub use resolver::{resolve_file_set, FileSetResolver, FileTarget};
