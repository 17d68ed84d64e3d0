use crate::domain::prerelease::{Ladder, PreRelease};
use crate::error::{AnnounceError, Result};
use semver::{BuildMetadata, Prerelease, Version};
use std::fmt;
use std::str::FromStr;

/// Release channel controlling how the next version is derived
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Series {
    /// Stay on the current stage: bump the pre-release counter, or the patch
    Current,
    /// Climb one rung of the ladder, or promote to a final release
    Next,
    Patch,
    Minor,
    Major,
    /// Jump straight to the given version
    Explicit(Version),
}

impl FromStr for Series {
    type Err = AnnounceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "current" => Ok(Series::Current),
            "next" => Ok(Series::Next),
            "patch" => Ok(Series::Patch),
            "minor" => Ok(Series::Minor),
            "major" => Ok(Series::Major),
            other => Version::parse(other)
                .map(Series::Explicit)
                .map_err(|_| AnnounceError::InvalidSeries(other.to_string())),
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Series::Current => write!(f, "current"),
            Series::Next => write!(f, "next"),
            Series::Patch => write!(f, "patch"),
            Series::Minor => write!(f, "minor"),
            Series::Major => write!(f, "major"),
            Series::Explicit(v) => write!(f, "{}", v),
        }
    }
}

/// Version bump type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionBump {
    Major,
    Minor,
    Patch,
}

/// Parse the version the project is currently at.
pub fn parse_current_version(current: &str) -> Result<Version> {
    let trimmed = current.trim();
    if trimmed.is_empty() {
        return Err(AnnounceError::InvalidCurrentVersion(
            "no version given".to_string(),
        ));
    }

    Version::parse(trimmed)
        .map_err(|e| AnnounceError::InvalidCurrentVersion(format!("'{}': {}", trimmed, e)))
}

/// Bump one component, resetting the lower ones and discarding any
/// pre-release and build metadata.
pub fn bump(version: &Version, bump_type: VersionBump) -> Result<Version> {
    let overflow = |component: &str| {
        AnnounceError::VersionOverflow(format!("{} component of {}", component, version))
    };

    let mut next = match bump_type {
        VersionBump::Major => Version::new(
            version.major.checked_add(1).ok_or_else(|| overflow("major"))?,
            0,
            0,
        ),
        VersionBump::Minor => Version::new(
            version.major,
            version.minor.checked_add(1).ok_or_else(|| overflow("minor"))?,
            0,
        ),
        VersionBump::Patch => Version::new(
            version.major,
            version.minor,
            version.patch.checked_add(1).ok_or_else(|| overflow("patch"))?,
        ),
    };
    next.pre = Prerelease::EMPTY;
    next.build = BuildMetadata::EMPTY;
    Ok(next)
}

/// Compute the version that follows `current` on the given series.
///
/// Pure: no I/O and no global state.
///
/// # Example
/// ```
/// # use announce::domain::{compute_next_version, Ladder, Series};
/// let ladder: Ladder = "dev, alpha, beta, rc".parse().unwrap();
/// let next = compute_next_version("1.2.3", &Series::Next, &ladder).unwrap();
/// assert_eq!(next.to_string(), "1.2.3-dev.1");
/// ```
pub fn compute_next_version(current: &str, series: &Series, ladder: &Ladder) -> Result<Version> {
    let current = parse_current_version(current)?;
    let stage = PreRelease::from_semver(&current.pre);

    match series {
        Series::Current => match stage {
            Some(pre) => with_prerelease(&current, &pre.increment_counter()?),
            None => bump(&current, VersionBump::Patch),
        },
        Series::Next => match stage {
            Some(pre) => match ladder.next_after(&pre.stage) {
                Some(next_stage) => with_prerelease(&current, &PreRelease::new(next_stage, Some(1))),
                None => bump(&current, VersionBump::Patch),
            },
            None => match ladder.first() {
                Some(first) => with_prerelease(&current, &PreRelease::new(first, Some(1))),
                None => bump(&current, VersionBump::Patch),
            },
        },
        Series::Patch => bump(&current, VersionBump::Patch),
        Series::Minor => bump(&current, VersionBump::Minor),
        Series::Major => bump(&current, VersionBump::Major),
        Series::Explicit(target) => Ok(target.clone()),
    }
}

fn with_prerelease(base: &Version, pre: &PreRelease) -> Result<Version> {
    let mut next = Version::new(base.major, base.minor, base.patch);
    next.pre = pre.to_semver()?;
    Ok(next)
}
