//! Domain logic - pure release rules independent of git, files and hosts

pub mod commit;
pub mod contributor;
pub mod prerelease;
pub mod repo;
pub mod tag;
pub mod version;

pub use commit::{ChangeKind, CommitEntry, ParsedChange};
pub use contributor::{Contributor, ContributorTable};
pub use prerelease::{Ladder, PreRelease};
pub use repo::{HostKind, RepositoryIdentity};
pub use tag::TagPattern;
pub use version::{compute_next_version, Series, VersionBump};
