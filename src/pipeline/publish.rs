//! `publish`: push a hosted release's tarball to the npm registry

use crate::config::PublishConfig;
use crate::domain::{RepositoryIdentity, TagPattern};
use crate::error::{AnnounceError, Result};
use crate::git::Repository;
use crate::host::{HostingApi, ReleaseInfo};
use crate::manifest::read_current_version;
use crate::pipeline::{upstream_identity, SkipReason, Stage};
use crate::ui::Progress;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Inputs of a publish run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOptions {
    pub root: PathBuf,
    pub access: String,
    /// Chosen from the release type when `None`
    pub dist_tag: Option<String>,
    pub dry_run: bool,
    pub npm_token: Option<String>,
    /// Name of the hosted release to publish
    pub release_name: TagPattern,
    pub upstream: String,
}

impl PublishOptions {
    /// Options from the `[publish]` section, rooted at `root`
    pub fn from_config(config: &PublishConfig, root: PathBuf) -> Self {
        PublishOptions {
            root,
            access: config.access.clone(),
            dist_tag: config.dist_tag.clone().filter(|t| !t.trim().is_empty()),
            dry_run: config.dry_run,
            npm_token: config.npm_token.clone(),
            release_name: TagPattern::new(config.release_name.clone()),
            upstream: config.upstream.clone(),
        }
    }
}

/// One `npm publish` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub tarball_url: String,
    pub dist_tag: String,
    pub access: String,
    pub dry_run: bool,
    pub token: String,
}

impl PublishRequest {
    /// Arguments passed to `npm`
    pub fn npm_args(&self) -> Vec<String> {
        let mut args = vec![
            "publish".to_string(),
            self.tarball_url.clone(),
            "--tag".to_string(),
            self.dist_tag.clone(),
            "--access".to_string(),
            self.access.clone(),
        ];
        if self.dry_run {
            args.push("--dry-run".to_string());
        }
        args
    }
}

/// Publishes a package tarball to a registry
pub trait PackagePublisher {
    fn publish(&self, request: &PublishRequest) -> Result<()>;
}

/// Runs the `npm` executable
#[derive(Debug, Clone)]
pub struct NpmPublisher {
    program: String,
}

impl NpmPublisher {
    pub fn new() -> Self {
        NpmPublisher {
            program: "npm".to_string(),
        }
    }

    /// Use a different npm executable
    pub fn with_program(program: impl Into<String>) -> Self {
        NpmPublisher {
            program: program.into(),
        }
    }
}

impl Default for NpmPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl PackagePublisher for NpmPublisher {
    fn publish(&self, request: &PublishRequest) -> Result<()> {
        let args = request.npm_args();
        debug!(program = %self.program, args = ?args, "running npm");

        let output = Command::new(&self.program)
            .args(&args)
            .env("NPM_TOKEN", &request.token)
            .env("NODE_AUTH_TOKEN", &request.token)
            .output()
            .map_err(|e| {
                AnnounceError::publish(format!("failed to execute {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            return Err(AnnounceError::publish(format!(
                "{} publish failed with exit code {}\nStdout: {}\nStderr: {}",
                self.program,
                output.status.code().unwrap_or(-1),
                stdout.trim(),
                stderr.trim()
            )));
        }

        Ok(())
    }
}

/// What a publish run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub repository: RepositoryIdentity,
    pub release_name: String,
    pub published: Stage<PublishRequest>,
}

/// `next` for prereleases, `latest` otherwise, unless a tag was given
pub fn dist_tag_for(release: &ReleaseInfo, configured: Option<&str>) -> String {
    match configured {
        Some(tag) => tag.to_string(),
        None if release.prerelease => "next".to_string(),
        None => "latest".to_string(),
    }
}

/// Publish the hosted release named by `options.release_name`.
pub fn run_publish<R, H, P>(
    options: &PublishOptions,
    repo: &R,
    host: &H,
    publisher: &P,
    progress: &Progress,
) -> Result<PublishOutcome>
where
    R: Repository + ?Sized,
    H: HostingApi + ?Sized,
    P: PackagePublisher + ?Sized,
{
    progress.heading("Publishing the release to npm");

    let version = read_current_version(&options.root)?;
    let release_name = options.release_name.format(&version);
    let repository = upstream_identity(repo, &options.upstream)?;
    progress.done(&format!("Fetched upstream repository info: {}", repository));

    let outcome = |published| PublishOutcome {
        repository: repository.clone(),
        release_name: release_name.clone(),
        published,
    };

    let Some(token) = options
        .npm_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    else {
        let reason = SkipReason::MissingNpmToken;
        progress.skipped(&reason.to_string());
        return Ok(outcome(Stage::Skipped(reason)));
    };

    let Some(release) = host.find_release(&repository, &release_name)? else {
        let reason = SkipReason::ReleaseNotFound {
            name: release_name.clone(),
        };
        progress.skipped(&reason.to_string());
        return Ok(outcome(Stage::Skipped(reason)));
    };

    let Some(tarball_url) = release.tarball_url.clone() else {
        let reason = SkipReason::MissingTarball {
            release: release.name.clone(),
        };
        progress.skipped(&reason.to_string());
        return Ok(outcome(Stage::Skipped(reason)));
    };

    let request = PublishRequest {
        tarball_url,
        dist_tag: dist_tag_for(&release, options.dist_tag.as_deref()),
        access: options.access.clone(),
        dry_run: options.dry_run,
        token: token.to_string(),
    };

    progress.step(&format!(
        "Publishing {} with dist-tag '{}'",
        release.name, request.dist_tag
    ));
    publisher.publish(&request)?;
    progress.done("Publish to npm: Done");

    Ok(outcome(Stage::Ran(request)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{AuthorProfile, ProfileLookup, ReleaseRequest};
    use crate::git::MockRepository;
    use std::cell::RefCell;
    use std::fs;

    struct FakeHost {
        release: Option<ReleaseInfo>,
    }

    impl ProfileLookup for FakeHost {
        fn author_profile(&self, _: &RepositoryIdentity, _: &str, _: &str) -> Result<Option<AuthorProfile>> {
            Ok(None)
        }
    }

    impl HostingApi for FakeHost {
        fn latest_release(&self, _: &RepositoryIdentity) -> Result<Option<ReleaseInfo>> {
            Ok(self.release.clone())
        }

        fn find_release(&self, _: &RepositoryIdentity, name: &str) -> Result<Option<ReleaseInfo>> {
            Ok(self.release.clone().filter(|r| r.name == name))
        }

        fn create_release(&self, _: &RepositoryIdentity, _: &ReleaseRequest) -> Result<ReleaseInfo> {
            Err(AnnounceError::host("not supported"))
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        requests: RefCell<Vec<PublishRequest>>,
    }

    impl PackagePublisher for RecordingPublisher {
        fn publish(&self, request: &PublishRequest) -> Result<()> {
            self.requests.borrow_mut().push(request.clone());
            Ok(())
        }
    }

    fn release(prerelease: bool, tarball: bool) -> ReleaseInfo {
        ReleaseInfo {
            name: "V2.0.0 Release".to_string(),
            tag: "V2.0.0".to_string(),
            published_at: Some("2024-03-05T10:00:00Z".to_string()),
            tarball_url: tarball.then(|| "https://api.github.com/repos/acme/widgets/tarball/V2.0.0".to_string()),
            prerelease,
        }
    }

    fn setup() -> (tempfile::TempDir, MockRepository, PublishOptions) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"version": "2.0.0"}"#).unwrap();

        let mut repo = MockRepository::new();
        repo.add_remote("upstream", "git@github.com:acme/widgets.git");

        let mut options = PublishOptions::from_config(&PublishConfig::default(), dir.path().to_path_buf());
        options.npm_token = Some("npm_secret".to_string());
        (dir, repo, options)
    }

    #[test]
    fn test_npm_args() {
        let request = PublishRequest {
            tarball_url: "https://x/t.tgz".to_string(),
            dist_tag: "next".to_string(),
            access: "public".to_string(),
            dry_run: true,
            token: "t".to_string(),
        };
        assert_eq!(
            request.npm_args(),
            vec!["publish", "https://x/t.tgz", "--tag", "next", "--access", "public", "--dry-run"]
        );
    }

    #[test]
    fn test_dist_tag_selection() {
        assert_eq!(dist_tag_for(&release(true, true), None), "next");
        assert_eq!(dist_tag_for(&release(false, true), None), "latest");
        assert_eq!(dist_tag_for(&release(true, true), Some("beta")), "beta");
    }

    #[test]
    fn test_publishes_found_release() {
        let (_dir, repo, options) = setup();
        let host = FakeHost { release: Some(release(false, true)) };
        let publisher = RecordingPublisher::default();

        let outcome = run_publish(&options, &repo, &host, &publisher, &Progress::api()).unwrap();

        assert_eq!(outcome.release_name, "V2.0.0 Release");
        let requests = publisher.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].dist_tag, "latest");
        assert_eq!(requests[0].access, "public");
        assert_eq!(requests[0].token, "npm_secret");
    }

    #[test]
    fn test_skips_without_token() {
        let (_dir, repo, mut options) = setup();
        options.npm_token = Some("   ".to_string());
        let publisher = RecordingPublisher::default();

        let outcome = run_publish(&options, &repo, &FakeHost { release: Some(release(false, true)) }, &publisher, &Progress::api()).unwrap();

        assert_eq!(outcome.published.skip_reason(), Some(&SkipReason::MissingNpmToken));
        assert!(publisher.requests.borrow().is_empty());
    }

    #[test]
    fn test_skips_unknown_release_and_missing_tarball() {
        let (_dir, repo, options) = setup();
        let publisher = RecordingPublisher::default();

        let outcome = run_publish(&options, &repo, &FakeHost { release: None }, &publisher, &Progress::api()).unwrap();
        assert!(matches!(outcome.published, Stage::Skipped(SkipReason::ReleaseNotFound { .. })));

        let outcome = run_publish(&options, &repo, &FakeHost { release: Some(release(false, false)) }, &publisher, &Progress::api()).unwrap();
        assert!(matches!(outcome.published, Stage::Skipped(SkipReason::MissingTarball { .. })));
        assert!(publisher.requests.borrow().is_empty());
    }

    #[test]
    fn test_npm_failure_is_reported() {
        let publisher = NpmPublisher::with_program("/nonexistent/npm");
        let request = PublishRequest {
            tarball_url: "https://x/t.tgz".to_string(),
            dist_tag: "latest".to_string(),
            access: "public".to_string(),
            dry_run: true,
            token: "t".to_string(),
        };
        assert!(matches!(publisher.publish(&request), Err(AnnounceError::Publish(_))));
    }
}
