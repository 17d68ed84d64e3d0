use crate::error::{AnnounceError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the project-local configuration file
pub const CONFIG_FILE_NAME: &str = "announce.toml";

/// Default prerelease ladder
pub const DEFAULT_VERSION_LADDER: &str = "dev, alpha, beta, rc";

/// Represents the complete configuration for announce.
///
/// One section per subcommand. Every field is optional in the file; values
/// given on the command line override what is configured here.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub prepare: PrepareConfig,

    #[serde(default)]
    pub release: ReleaseConfig,

    #[serde(default)]
    pub publish: PublishConfig,
}

fn default_series() -> String {
    "current".to_string()
}

fn default_version_ladder() -> String {
    DEFAULT_VERSION_LADDER.to_string()
}

fn default_manifest_prefixes() -> Vec<String> {
    crate::files::resolver::DEFAULT_MANIFEST_PREFIXES
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn default_upstream() -> String {
    "upstream".to_string()
}

fn default_tag_name() -> String {
    "V{version}".to_string()
}

fn default_tag_message() -> String {
    "The spaghetti recipe at the time of releasing V{version}".to_string()
}

fn default_release_name() -> String {
    "V{version} Release".to_string()
}

fn default_changelog_message() -> String {
    "docs(CHANGELOG): generated change log for release {version}".to_string()
}

fn default_changelog_file() -> String {
    "CHANGELOG.md".to_string()
}

fn default_access() -> String {
    "public".to_string()
}

/// Settings for `announce prepare`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PrepareConfig {
    #[serde(default)]
    pub current_working_directory: Option<PathBuf>,

    #[serde(default = "default_series")]
    pub series: String,

    /// Comma-separated prerelease stages
    #[serde(default = "default_version_ladder")]
    pub version_ladder: String,

    #[serde(default)]
    pub ignore_folders: Vec<String>,

    #[serde(default = "default_manifest_prefixes")]
    pub manifest_prefixes: Vec<String>,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        PrepareConfig {
            current_working_directory: None,
            series: default_series(),
            version_ladder: default_version_ladder(),
            ignore_folders: Vec::new(),
            manifest_prefixes: default_manifest_prefixes(),
        }
    }
}

/// Settings for `announce release`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReleaseConfig {
    #[serde(default)]
    pub current_working_directory: Option<PathBuf>,

    /// Commit a dirty working tree instead of stashing it
    #[serde(default)]
    pub commit: bool,

    /// Message used when committing a dirty working tree
    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub dont_tag: bool,

    /// Existing tag to release instead of tagging now
    #[serde(default)]
    pub tag: Option<String>,

    #[serde(default = "default_tag_name")]
    pub tag_name: String,

    #[serde(default = "default_tag_message")]
    pub tag_message: String,

    #[serde(default = "default_changelog_message")]
    pub changelog_message: String,

    #[serde(default = "default_changelog_file")]
    pub changelog_file: String,

    #[serde(default)]
    pub dont_release: bool,

    #[serde(default = "default_release_name")]
    pub release_name: String,

    /// Path to a release-notes template; the built-in layout when unset
    #[serde(default)]
    pub release_message: Option<PathBuf>,

    #[serde(default = "default_upstream")]
    pub upstream: String,

    #[serde(default)]
    pub github_token: Option<String>,

    #[serde(default)]
    pub gitlab_token: Option<String>,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            current_working_directory: None,
            commit: false,
            message: String::new(),
            dont_tag: false,
            tag: None,
            tag_name: default_tag_name(),
            tag_message: default_tag_message(),
            changelog_message: default_changelog_message(),
            changelog_file: default_changelog_file(),
            dont_release: false,
            release_name: default_release_name(),
            release_message: None,
            upstream: default_upstream(),
            github_token: None,
            gitlab_token: None,
        }
    }
}

/// Settings for `announce publish`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PublishConfig {
    #[serde(default)]
    pub current_working_directory: Option<PathBuf>,

    #[serde(default = "default_access")]
    pub access: String,

    /// npm dist-tag; chosen from the release type when unset
    #[serde(default)]
    pub dist_tag: Option<String>,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default = "default_release_name")]
    pub release_name: String,

    #[serde(default = "default_upstream")]
    pub upstream: String,

    #[serde(default)]
    pub npm_token: Option<String>,

    #[serde(default)]
    pub github_token: Option<String>,

    #[serde(default)]
    pub gitlab_token: Option<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        PublishConfig {
            current_working_directory: None,
            access: default_access(),
            dist_tag: None,
            dry_run: false,
            release_name: default_release_name(),
            upstream: default_upstream(),
            npm_token: None,
            github_token: None,
            gitlab_token: None,
        }
    }
}

/// First non-blank value among `explicit`, `configured` and the environment
/// variable `var`.
pub fn resolve_token(
    explicit: Option<&str>,
    configured: Option<&str>,
    var: &str,
) -> Option<String> {
    [explicit, configured]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|token| !token.is_empty())
        .map(str::to_string)
        .or_else(|| {
            env::var(var)
                .ok()
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty())
        })
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `announce.toml` in current directory
/// 3. `.announce.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let local = Path::new(".").join(CONFIG_FILE_NAME);

    let path = if let Some(path) = config_path {
        path.to_path_buf()
    } else if local.exists() {
        local
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(format!(".{}", CONFIG_FILE_NAME));
        if config_path.exists() {
            config_path
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config_str = fs::read_to_string(&path)
        .map_err(|e| AnnounceError::config(format!("cannot read {}: {}", path.display(), e)))?;

    parse_config(&config_str)
        .map_err(|e| AnnounceError::config(format!("{}: {}", path.display(), e)))
}

/// Parse configuration from TOML text
pub fn parse_config(content: &str) -> std::result::Result<Config, toml::de::Error> {
    toml::from_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.prepare.series, "current");
        assert_eq!(config.prepare.version_ladder, DEFAULT_VERSION_LADDER);
        assert_eq!(config.release.tag_name, "V{version}");
        assert_eq!(config.release.upstream, "upstream");
        assert_eq!(config.publish.access, "public");
        assert_eq!(config.publish.dist_tag, None);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config = parse_config(
            r#"
            [prepare]
            series = "next"
            ignore_folders = ["dist", "coverage"]

            [release]
            commit = true
            "#,
        )
        .unwrap();

        assert_eq!(config.prepare.series, "next");
        assert_eq!(config.prepare.ignore_folders, vec!["dist", "coverage"]);
        assert_eq!(config.prepare.version_ladder, DEFAULT_VERSION_LADDER);
        assert!(config.release.commit);
        assert_eq!(config.release.release_name, "V{version} Release");
        assert_eq!(config.publish, PublishConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        assert!(parse_config("[prepare\nseries = 1").is_err());
    }

    #[test]
    fn test_explicit_token_beats_configured() {
        assert_eq!(
            resolve_token(Some("cli"), Some("file"), "ANNOUNCE_TEST_UNSET_TOKEN"),
            Some("cli".to_string())
        );
        assert_eq!(
            resolve_token(None, Some("  "), "ANNOUNCE_TEST_UNSET_TOKEN"),
            None
        );
    }
}
