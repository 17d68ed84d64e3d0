//! Commit history: mining entries, changelog sections and release notes

pub mod changelog;
pub mod miner;
pub mod notes;

pub use changelog::{compose_changelog, CHANGELOG_PLACEHOLDER};
pub use miner::{mine_commit_range, resolve_contributor_profiles, MinedHistory};
pub use notes::{
    compose_release_notes, MarkdownTemplate, ReleaseNotesContext, ReleaseType, TemplateRenderer,
    UserTemplate,
};
