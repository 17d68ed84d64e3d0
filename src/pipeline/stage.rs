use std::fmt;

/// Why a stage did not run. These are reported, never treated as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No file under the project root survived the ignore rules
    NoTargetFiles,
    /// An existing tag was supplied, so nothing gets tagged
    TagSupplied { tag: String },
    TaggingDisabled,
    /// The local branch has nothing the upstream lacks
    NothingToPush { remote: String, branch: String },
    ReleaseDisabled,
    MissingNpmToken,
    ReleaseNotFound { name: String },
    MissingTarball { release: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoTargetFiles => write!(f, "No files to scan for the current version"),
            SkipReason::TagSupplied { tag } => {
                write!(f, "Using existing tag '{}'; not tagging the code", tag)
            }
            SkipReason::TaggingDisabled => write!(f, "Tagging disabled; not tagging the code"),
            SkipReason::NothingToPush { remote, branch } => {
                write!(f, "Branch '{}' is up to date with '{}'", branch, remote)
            }
            SkipReason::ReleaseDisabled => write!(f, "Release disabled; not creating a release"),
            SkipReason::MissingNpmToken => write!(f, "Cannot publish without an npm token"),
            SkipReason::ReleaseNotFound { name } => {
                write!(f, "Cannot publish without a release on the git host ('{}')", name)
            }
            SkipReason::MissingTarball { release } => {
                write!(f, "Cannot publish release '{}' without a tarball", release)
            }
        }
    }
}

/// Result of a pipeline stage with an up-front precondition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage<T> {
    Ran(T),
    Skipped(SkipReason),
}

impl<T> Stage<T> {
    pub fn ran(&self) -> Option<&T> {
        match self {
            Stage::Ran(value) => Some(value),
            Stage::Skipped(_) => None,
        }
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            Stage::Ran(_) => None,
            Stage::Skipped(reason) => Some(reason),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Stage::Skipped(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_accessors() {
        let ran: Stage<u32> = Stage::Ran(3);
        assert_eq!(ran.ran(), Some(&3));
        assert!(!ran.is_skipped());

        let skipped: Stage<u32> = Stage::Skipped(SkipReason::TaggingDisabled);
        assert_eq!(skipped.skip_reason(), Some(&SkipReason::TaggingDisabled));
        assert!(skipped.ran().is_none());
    }

    #[test]
    fn test_skip_reason_display() {
        let reason = SkipReason::NothingToPush {
            remote: "upstream".to_string(),
            branch: "main".to_string(),
        };
        assert_eq!(reason.to_string(), "Branch 'main' is up to date with 'upstream'");
    }
}
