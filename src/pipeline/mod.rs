//! The three release pipelines: prepare, release and publish
//!
//! Each pipeline is a plain function over an options struct built per
//! invocation. Stages check their precondition first and either run or
//! report a [SkipReason].

pub mod prepare;
pub mod publish;
pub mod release;
pub mod stage;

pub use prepare::{run_prepare, PrepareOptions, PrepareOutcome};
pub use publish::{run_publish, NpmPublisher, PackagePublisher, PublishOptions, PublishOutcome};
pub use release::{run_release, DirtyTree, ReleaseOptions, ReleaseOutcome, TaggedCommit};
pub use stage::{SkipReason, Stage};

use crate::domain::RepositoryIdentity;
use crate::error::Result;
use crate::git::Repository;
use tracing::debug;

/// Identity of the repository behind a remote
pub fn upstream_identity<R: Repository + ?Sized>(
    repo: &R,
    upstream: &str,
) -> Result<RepositoryIdentity> {
    let url = repo.remote_url(upstream)?;
    let identity = RepositoryIdentity::from_remote_url(&url)?;
    debug!(remote = upstream, repository = %identity, "resolved upstream repository");
    Ok(identity)
}
