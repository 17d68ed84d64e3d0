//! Pre-release stages and the ladder they climb
//!
//! A pre-release component such as `beta.2` is read as a stage name (`beta`)
//! plus an optional counter (`2`). The ladder is the ordered list of stages a
//! project walks through before a final release, e.g. `dev, alpha, beta, rc`.

use crate::error::{AnnounceError, Result};
use semver::Prerelease;
use std::fmt;
use std::str::FromStr;

/// Pre-release stage with an optional counter
///
/// # Examples
/// - "alpha" -> PreRelease { stage: "alpha", counter: None }
/// - "beta.1" -> PreRelease { stage: "beta", counter: Some(1) }
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreRelease {
    /// The stage name (first dot-separated identifier)
    pub stage: String,
    /// Numeric counter following the stage, if present
    pub counter: Option<u64>,
}

impl PreRelease {
    /// Create a new pre-release
    pub fn new(stage: impl Into<String>, counter: Option<u64>) -> Self {
        PreRelease {
            stage: stage.into(),
            counter,
        }
    }

    /// Read the stage and counter out of a semver pre-release component.
    ///
    /// Returns `None` for an empty component. A second identifier that is not
    /// numeric is treated as "no counter".
    pub fn from_semver(pre: &Prerelease) -> Option<Self> {
        if pre.is_empty() {
            return None;
        }

        let mut parts = pre.as_str().split('.');
        let stage = parts.next()?.to_string();
        let counter = parts.next().and_then(|p| p.parse::<u64>().ok());

        Some(PreRelease { stage, counter })
    }

    /// Increment the counter
    ///
    /// If counter is None, returns Some(1). Otherwise increments by 1.
    pub fn increment_counter(&self) -> Result<Self> {
        let counter = match self.counter {
            Some(n) => n.checked_add(1).ok_or_else(|| {
                AnnounceError::VersionOverflow(format!("pre-release counter of '{}'", self))
            })?,
            None => 1,
        };

        Ok(PreRelease {
            stage: self.stage.clone(),
            counter: Some(counter),
        })
    }

    /// Convert back into a semver pre-release component
    pub fn to_semver(&self) -> Result<Prerelease> {
        Prerelease::new(&self.to_string()).map_err(|e| {
            AnnounceError::InvalidLadder(format!("'{}' is not a valid pre-release: {}", self, e))
        })
    }
}

impl fmt::Display for PreRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stage)?;
        if let Some(counter) = self.counter {
            write!(f, ".{}", counter)?;
        }
        Ok(())
    }
}

/// Ordered, duplicate-free list of pre-release stage names
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ladder {
    stages: Vec<String>,
}

impl Ladder {
    /// Build a ladder from stage names, rejecting duplicates and names that
    /// cannot appear as a semver pre-release identifier.
    pub fn new<I, S>(stages: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut collected: Vec<String> = Vec::new();
        for stage in stages {
            let stage = stage.into();
            if !is_valid_stage(&stage) {
                return Err(AnnounceError::InvalidLadder(format!(
                    "invalid stage name '{}'",
                    stage
                )));
            }
            if collected.contains(&stage) {
                return Err(AnnounceError::InvalidLadder(format!(
                    "stage '{}' appears more than once",
                    stage
                )));
            }
            collected.push(stage);
        }

        Ok(Ladder { stages: collected })
    }

    /// The stage names in maturity order
    pub fn stages(&self) -> &[String] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// First (least mature) stage
    pub fn first(&self) -> Option<&str> {
        self.stages.first().map(String::as_str)
    }

    /// Stage following `stage`, or `None` when `stage` is unknown or last
    pub fn next_after(&self, stage: &str) -> Option<&str> {
        let position = self.stages.iter().position(|s| s == stage)?;
        self.stages.get(position + 1).map(String::as_str)
    }
}

impl FromStr for Ladder {
    type Err = AnnounceError;

    /// Parse a comma-separated list such as `"dev, alpha, beta, rc"`.
    fn from_str(s: &str) -> Result<Self> {
        Ladder::new(s.split(',').map(str::trim).filter(|stage| !stage.is_empty()))
    }
}

impl fmt::Display for Ladder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stages.join(", "))
    }
}

fn is_valid_stage(stage: &str) -> bool {
    !stage.is_empty()
        && !stage.chars().all(|c| c.is_ascii_digit())
        && stage.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prerelease_from_semver_with_counter() {
        let pre = Prerelease::new("beta.1").unwrap();
        let pr = PreRelease::from_semver(&pre).unwrap();
        assert_eq!(pr.stage, "beta");
        assert_eq!(pr.counter, Some(1));
    }

    #[test]
    fn test_prerelease_from_semver_without_counter() {
        let pre = Prerelease::new("alpha").unwrap();
        let pr = PreRelease::from_semver(&pre).unwrap();
        assert_eq!(pr.stage, "alpha");
        assert_eq!(pr.counter, None);
    }

    #[test]
    fn test_prerelease_from_empty_semver() {
        assert!(PreRelease::from_semver(&Prerelease::EMPTY).is_none());
    }

    #[test]
    fn test_prerelease_increment_with_counter() {
        let pr = PreRelease::new("beta", Some(1));
        assert_eq!(pr.increment_counter().unwrap(), PreRelease::new("beta", Some(2)));
    }

    #[test]
    fn test_prerelease_increment_from_none() {
        let pr = PreRelease::new("alpha", None);
        assert_eq!(pr.increment_counter().unwrap().counter, Some(1));
    }

    #[test]
    fn test_prerelease_increment_overflow() {
        let pr = PreRelease::new("rc", Some(u64::MAX));
        assert!(matches!(
            pr.increment_counter(),
            Err(AnnounceError::VersionOverflow(_))
        ));
    }

    #[test]
    fn test_prerelease_display() {
        assert_eq!(PreRelease::new("rc", Some(2)).to_string(), "rc.2");
        assert_eq!(PreRelease::new("alpha", None).to_string(), "alpha");
    }

    #[test]
    fn test_ladder_parse_trims_and_drops_blanks() {
        let ladder: Ladder = " dev, alpha,, beta ,rc ".parse().unwrap();
        assert_eq!(ladder.stages(), &["dev", "alpha", "beta", "rc"]);
    }

    #[test]
    fn test_ladder_rejects_duplicates() {
        let err = "alpha, beta, alpha".parse::<Ladder>().unwrap_err();
        assert!(matches!(err, AnnounceError::InvalidLadder(_)));
    }

    #[test]
    fn test_ladder_rejects_invalid_stage() {
        assert!("alpha, be.ta".parse::<Ladder>().is_err());
        assert!("alpha, 42".parse::<Ladder>().is_err());
    }

    #[test]
    fn test_ladder_next_after() {
        let ladder: Ladder = "alpha, beta, rc".parse().unwrap();
        assert_eq!(ladder.next_after("alpha"), Some("beta"));
        assert_eq!(ladder.next_after("rc"), None);
        assert_eq!(ladder.next_after("dev"), None);
        assert_eq!(ladder.first(), Some("alpha"));
    }

    #[test]
    fn test_empty_ladder() {
        let ladder: Ladder = "".parse().unwrap();
        assert!(ladder.is_empty());
        assert_eq!(ladder.first(), None);
    }
}
