//! Release notes
//!
//! Entries are classified into features, fixes and docs, enriched with author
//! profiles and handed to a [TemplateRenderer] as a [ReleaseNotesContext].
//! The context serializes with the upper-case keys templates refer to.

use crate::domain::{ChangeKind, CommitEntry, Contributor, ContributorTable, RepositoryIdentity};
use crate::error::{AnnounceError, Result};
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use semver::Version;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;

const DATE_FORMAT: &str = "%d-%b-%Y";

/// Whether a release is a prerelease
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReleaseType {
    #[serde(rename = "pre-release")]
    PreRelease,
    #[serde(rename = "release")]
    Release,
}

impl ReleaseType {
    pub fn of(version: &Version) -> Self {
        if version.pre.is_empty() {
            ReleaseType::Release
        } else {
            ReleaseType::PreRelease
        }
    }

    pub fn is_prerelease(&self) -> bool {
        matches!(self, ReleaseType::PreRelease)
    }
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseType::PreRelease => write!(f, "pre-release"),
            ReleaseType::Release => write!(f, "release"),
        }
    }
}

/// One classified entry as seen by templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteEntry {
    pub hash: String,
    pub short_hash: String,
    pub commit_url: String,
    /// Empty when the change had no scope
    pub component: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub date: String,
    pub author_profile: Option<String>,
    pub is_breaking_change: bool,
}

/// Variables available to release-notes templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ReleaseNotesContext {
    pub repo: RepositoryIdentity,
    pub release_name: String,
    pub num_features: usize,
    pub num_fixes: usize,
    pub num_docs: usize,
    pub num_authors: usize,
    pub features: Vec<NoteEntry>,
    pub fixes: Vec<NoteEntry>,
    pub docs: Vec<NoteEntry>,
    pub authors: Vec<Contributor>,
    pub release_type: ReleaseType,
}

impl ReleaseNotesContext {
    /// Classify entries and attach author profiles to features
    pub fn build(
        entries: &[CommitEntry],
        contributors: &ContributorTable,
        version: &Version,
        release_name: &str,
        repo: &RepositoryIdentity,
    ) -> Self {
        let mut features = Vec::new();
        let mut fixes = Vec::new();
        let mut docs = Vec::new();

        for entry in entries {
            let mut note = NoteEntry {
                hash: entry.hash.clone(),
                short_hash: entry.short_hash().to_string(),
                commit_url: repo.commit_url(&entry.hash),
                component: entry.component.clone().unwrap_or_default(),
                message: entry.message.clone(),
                author_name: entry.author_name.clone(),
                author_email: entry.author_email.clone(),
                date: entry.timestamp.format(DATE_FORMAT).to_string(),
                author_profile: None,
                is_breaking_change: entry.is_breaking_change,
            };

            match entry.kind {
                ChangeKind::Feature => {
                    note.author_profile = contributors
                        .get(&entry.author_email)
                        .and_then(|c| c.profile.clone());
                    features.push(note);
                }
                ChangeKind::Fix => fixes.push(note),
                ChangeKind::Doc => docs.push(note),
            }
        }

        let authors = contributors.contributors().to_vec();

        ReleaseNotesContext {
            repo: repo.clone(),
            release_name: release_name.to_string(),
            num_features: features.len(),
            num_fixes: fixes.len(),
            num_docs: docs.len(),
            num_authors: authors.len(),
            features,
            fixes,
            docs,
            authors,
            release_type: ReleaseType::of(version),
        }
    }
}

fn note_line(note: &NoteEntry) -> String {
    let mut line = String::from("- ");
    if note.is_breaking_change {
        line.push_str("**BREAKING** ");
    }
    if !note.component.is_empty() {
        line.push_str(&format!("**{}**: ", note.component));
    }
    line.push_str(&format!(
        "{} ([{}]({}))",
        note.message, note.short_hash, note.commit_url
    ));

    match &note.author_profile {
        Some(profile) => line.push_str(&format!(" by [{}]({})", note.author_name, profile)),
        None => line.push_str(&format!(" by {}", note.author_name)),
    }
    line
}

fn bullet_list(notes: &[NoteEntry]) -> String {
    notes.iter().map(note_line).collect::<Vec<_>>().join("\n")
}

fn author_list(authors: &[Contributor]) -> String {
    authors
        .iter()
        .map(|author| match &author.profile {
            Some(profile) => format!("- [{}]({})", author.name, profile),
            None => format!("- {}", author.name),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Turns a notes context into the release body
pub trait TemplateRenderer {
    fn render(&self, context: &ReleaseNotesContext) -> Result<String>;
}

/// Built-in Markdown layout
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownTemplate;

impl TemplateRenderer for MarkdownTemplate {
    fn render(&self, context: &ReleaseNotesContext) -> Result<String> {
        let mut out = format!("## {}\n\n", context.release_name);

        if context.release_type.is_prerelease() {
            out.push_str("> This is a pre-release.\n\n");
        }

        out.push_str(&format!(
            "{} features, {} fixes and {} documentation updates from {} contributors.\n",
            context.num_features, context.num_fixes, context.num_docs, context.num_authors
        ));

        for (title, notes) in [
            ("Features", &context.features),
            ("Fixes", &context.fixes),
            ("Documentation", &context.docs),
        ] {
            if notes.is_empty() {
                continue;
            }
            out.push_str(&format!("\n### {}\n\n{}\n", title, bullet_list(notes)));
        }

        if !context.authors.is_empty() {
            out.push_str(&format!(
                "\n### Contributors\n\n{}\n",
                author_list(&context.authors)
            ));
        }

        Ok(out)
    }
}

/// User-supplied Jinja template, rendered against the serialized context
///
/// Every context key is available at the top level (`{{ RELEASE_NAME }}`,
/// `{% for feature in FEATURES %}`, `{{ AUTHORS[0].avatar }}`). Referencing an
/// undefined variable is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTemplate {
    name: String,
    source: String,
}

impl UserTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        UserTemplate {
            name: "release-notes".to_string(),
            source: source.into(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|e| {
            AnnounceError::template(format!("cannot read {}: {}", path.display(), e))
        })?;
        Ok(UserTemplate {
            name: path.display().to_string(),
            source,
        })
    }
}

impl TemplateRenderer for UserTemplate {
    fn render(&self, context: &ReleaseNotesContext) -> Result<String> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.add_template(&self.name, &self.source)
            .map_err(|e| AnnounceError::template(format!("{:#}", e)))?;

        env.get_template(&self.name)
            .and_then(|template| template.render(context))
            .map_err(|e| AnnounceError::template(format!("{:#}", e)))
    }
}

/// Classify entries and render them through `renderer`.
pub fn compose_release_notes<R: TemplateRenderer + ?Sized>(
    entries: &[CommitEntry],
    contributors: &ContributorTable,
    version: &Version,
    release_name: &str,
    repo: &RepositoryIdentity,
    renderer: &R,
) -> Result<String> {
    let context = ReleaseNotesContext::build(entries, contributors, version, release_name, repo);
    renderer.render(&context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HostKind;
    use chrono::DateTime;

    fn repo() -> RepositoryIdentity {
        RepositoryIdentity::new(HostKind::GitHub, "github.com", "acme", "widgets")
    }

    fn entry(hash: &str, email: &str, kind: ChangeKind, message: &str) -> CommitEntry {
        CommitEntry {
            hash: hash.to_string(),
            author_name: email.split('@').next().unwrap().to_string(),
            author_email: email.to_string(),
            timestamp: DateTime::parse_from_rfc3339("2024-03-05T10:00:00+00:00").unwrap(),
            kind,
            component: None,
            message: message.to_string(),
            is_breaking_change: false,
        }
    }

    fn fixture() -> (Vec<CommitEntry>, ContributorTable) {
        let entries = vec![
            entry("a111111111", "ada@example.com", ChangeKind::Feature, "ladder"),
            entry("b222222222", "bob@example.com", ChangeKind::Fix, "counter"),
            entry("c333333333", "ada@example.com", ChangeKind::Doc, "readme"),
        ];
        let mut table = ContributorTable::new();
        table.record("ada", "ada@example.com", "a111111111");
        table.record("bob", "bob@example.com", "b222222222");
        table.set_profile(
            "ada@example.com",
            Some("https://github.com/ada".to_string()),
            None,
        );
        (entries, table)
    }

    #[test]
    fn test_context_classifies_and_counts() {
        let (entries, table) = fixture();
        let version = Version::parse("1.3.0").unwrap();
        let context = ReleaseNotesContext::build(&entries, &table, &version, "V1.3.0 Release", &repo());

        assert_eq!(context.num_features, 1);
        assert_eq!(context.num_fixes, 1);
        assert_eq!(context.num_docs, 1);
        assert_eq!(context.num_authors, 2);
        assert_eq!(context.release_type, ReleaseType::Release);
        assert_eq!(
            context.features[0].author_profile.as_deref(),
            Some("https://github.com/ada")
        );
    }

    #[test]
    fn test_prerelease_classification() {
        let version = Version::parse("1.3.0-beta.2").unwrap();
        assert_eq!(ReleaseType::of(&version), ReleaseType::PreRelease);
    }

    #[test]
    fn test_context_serializes_with_contract_keys() {
        let (entries, table) = fixture();
        let version = Version::parse("2.0.0-rc.1").unwrap();
        let context = ReleaseNotesContext::build(&entries, &table, &version, "V2.0.0-rc.1 Release", &repo());

        let value = serde_json::to_value(&context).unwrap();
        for key in [
            "REPO",
            "RELEASE_NAME",
            "NUM_FEATURES",
            "NUM_FIXES",
            "NUM_DOCS",
            "NUM_AUTHORS",
            "FEATURES",
            "FIXES",
            "DOCS",
            "AUTHORS",
            "RELEASE_TYPE",
        ] {
            assert!(value.get(key).is_some(), "missing key {}", key);
        }
        assert_eq!(value["RELEASE_TYPE"], "pre-release");
        assert_eq!(value["AUTHORS"][0]["profile"], "https://github.com/ada");
    }

    #[test]
    fn test_markdown_template() {
        let (entries, table) = fixture();
        let version = Version::parse("1.3.0").unwrap();
        let notes = compose_release_notes(&entries, &table, &version, "V1.3.0 Release", &repo(), &MarkdownTemplate).unwrap();

        assert!(notes.starts_with("## V1.3.0 Release\n"));
        assert!(notes.contains("### Features\n\n- ladder ([a111111](https://github.com/acme/widgets/commit/a111111111)) by [ada](https://github.com/ada)"));
        assert!(notes.contains("### Contributors\n\n- [ada](https://github.com/ada)\n- bob"));
        assert!(!notes.contains("pre-release"));
    }

    #[test]
    fn test_user_template_loops_over_entries() {
        let (entries, table) = fixture();
        let version = Version::parse("1.3.0").unwrap();
        let template = UserTemplate::new(
            "{{ RELEASE_NAME }} ({{ RELEASE_TYPE }}) on {{ REPO.owner }}/{{ REPO.project }}\n\
             {% for fix in FIXES %}* {{ fix.message }} [{{ fix.short_hash }}]({{ fix.commit_url }})\n{% endfor %}",
        );

        let notes = compose_release_notes(&entries, &table, &version, "V1.3.0 Release", &repo(), &template).unwrap();
        assert_eq!(
            notes,
            "V1.3.0 Release (release) on acme/widgets\n* counter [b222222](https://github.com/acme/widgets/commit/b222222222)\n"
        );
    }

    #[test]
    fn test_user_template_sees_every_author_field() {
        let (entries, mut table) = fixture();
        table.set_profile(
            "ada@example.com",
            Some("https://github.com/ada".to_string()),
            Some("https://avatars.example/ada.png".to_string()),
        );
        let version = Version::parse("1.3.0").unwrap();
        let template = UserTemplate::new(
            "{% for author in AUTHORS %}{{ author.name }} <{{ author.email }}>{% if author.avatar %} {{ author.avatar }}{% endif %};{% endfor %}",
        );

        let notes = compose_release_notes(&entries, &table, &version, "x", &repo(), &template).unwrap();
        assert_eq!(
            notes,
            "ada <ada@example.com> https://avatars.example/ada.png;bob <bob@example.com>;"
        );
    }

    #[test]
    fn test_undefined_variable_fails() {
        let (entries, table) = fixture();
        let version = Version::parse("1.3.0").unwrap();
        let template = UserTemplate::new("{{ NOPE }}");

        let err = compose_release_notes(&entries, &table, &version, "x", &repo(), &template).unwrap_err();
        assert!(matches!(err, AnnounceError::Template(_)));
    }

    #[test]
    fn test_template_syntax_error_fails() {
        let (entries, table) = fixture();
        let version = Version::parse("1.3.0").unwrap();
        let template = UserTemplate::new("{% for x in FEATURES %}");

        let err = compose_release_notes(&entries, &table, &version, "x", &repo(), &template).unwrap_err();
        assert!(matches!(err, AnnounceError::Template(_)));
    }
}
