//! Markdown changelog sections
//!
//! A section looks like:
//!
//! ```text
//! #### CHANGE LOG
//!
//! ##### 06-Mar-2024
//!
//! - ladder: add release candidates ([1a2b3c4](https://github.com/acme/widgets/commit/1a2b3c4...))
//!
//! ##### 05-Mar-2024
//!
//! - fix off-by-one in counter ([5d6e7f8](https://github.com/acme/widgets/commit/5d6e7f8...))
//! ```
//!
//! The placeholder heading marks where the next section goes. Each new
//! section replaces the first placeholder and starts with a fresh one, so the
//! newest section always sits on top.

use crate::domain::{CommitEntry, RepositoryIdentity};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Heading that marks the insertion point in a changelog document
pub const CHANGELOG_PLACEHOLDER: &str = "#### CHANGE LOG";

/// Line written when a release range announces nothing
pub const NO_CHANGES_LINE: &str = "_No notable changes._";

const DAY_FORMAT: &str = "%d-%b-%Y";

/// Render the bullet for a single entry
pub fn format_entry(entry: &CommitEntry, repo: &RepositoryIdentity) -> String {
    let component = entry
        .component
        .as_deref()
        .map(|c| format!("{}: ", c))
        .unwrap_or_default();

    format!(
        "- {}{} ([{}]({}))",
        component,
        entry.message,
        entry.short_hash(),
        repo.commit_url(&entry.hash)
    )
}

/// Build the section for `entries`, starting with the placeholder heading.
///
/// Days are ordered newest first; entries keep their order within a day.
pub fn render_section(entries: &[CommitEntry], repo: &RepositoryIdentity) -> String {
    let mut days: BTreeMap<NaiveDate, Vec<&CommitEntry>> = BTreeMap::new();
    for entry in entries {
        days.entry(entry.timestamp.date_naive())
            .or_default()
            .push(entry);
    }

    let mut section = String::from(CHANGELOG_PLACEHOLDER);

    if days.is_empty() {
        section.push_str("\n\n");
        section.push_str(NO_CHANGES_LINE);
        return section;
    }

    for (day, day_entries) in days.iter().rev() {
        section.push_str(&format!("\n\n##### {}\n", day.format(DAY_FORMAT)));
        for entry in day_entries {
            section.push('\n');
            section.push_str(&format_entry(entry, repo));
        }
    }

    section
}

/// Insert a new section into an existing changelog document.
///
/// The first line that is exactly the placeholder is replaced; without one
/// the section is prepended.
pub fn compose_changelog(
    entries: &[CommitEntry],
    repo: &RepositoryIdentity,
    document: &str,
) -> String {
    let section = render_section(entries, repo);

    if let Some(start) = placeholder_line(document) {
        let end = start + CHANGELOG_PLACEHOLDER.len();
        return format!("{}{}{}", &document[..start], section, &document[end..]);
    }

    if document.trim().is_empty() {
        return format!("{}\n", section);
    }

    format!("{}\n\n{}", section, document)
}

/// Byte offset of the first line holding only the placeholder
fn placeholder_line(document: &str) -> Option<usize> {
    let mut offset = 0;
    for line in document.split_inclusive('\n') {
        if line.trim_end() == CHANGELOG_PLACEHOLDER {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChangeKind, HostKind};
    use chrono::DateTime;

    fn github() -> RepositoryIdentity {
        RepositoryIdentity::new(HostKind::GitHub, "github.com", "acme", "widgets")
    }

    fn entry(hash: &str, when: &str, kind: ChangeKind, component: Option<&str>, message: &str) -> CommitEntry {
        CommitEntry {
            hash: hash.to_string(),
            author_name: "Ada".to_string(),
            author_email: "ada@example.com".to_string(),
            timestamp: DateTime::parse_from_rfc3339(when).unwrap(),
            kind,
            component: component.map(str::to_string),
            message: message.to_string(),
            is_breaking_change: false,
        }
    }

    fn two_day_fixture() -> Vec<CommitEntry> {
        vec![
            entry("aaaaaaaaaa", "2024-03-05T09:00:00+00:00", ChangeKind::Feature, Some("core"), "first"),
            entry("bbbbbbbbbb", "2024-03-05T18:00:00+00:00", ChangeKind::Fix, None, "second"),
            entry("cccccccccc", "2024-03-06T08:00:00+00:00", ChangeKind::Feature, None, "third"),
            entry("dddddddddd", "2024-03-06T09:00:00+00:00", ChangeKind::Feature, None, "fourth"),
        ]
    }

    #[test]
    fn test_two_days_newest_first() {
        let section = render_section(&two_day_fixture(), &github());

        assert_eq!(section.matches("##### ").count(), 2);
        assert_eq!(section.lines().filter(|l| l.starts_with("- ")).count(), 4);

        let newer = section.find("##### 06-Mar-2024").unwrap();
        let older = section.find("##### 05-Mar-2024").unwrap();
        assert!(newer < older);

        let third = section.find("third").unwrap();
        let fourth = section.find("fourth").unwrap();
        assert!(third < fourth);
    }

    #[test]
    fn test_bullet_format() {
        let entries = two_day_fixture();
        assert_eq!(
            format_entry(&entries[0], &github()),
            "- core: first ([aaaaaaa](https://github.com/acme/widgets/commit/aaaaaaaaaa))"
        );
    }

    #[test]
    fn test_gitlab_commit_links() {
        let repo = RepositoryIdentity::new(HostKind::GitLab, "gitlab.com", "group/sub", "widgets");
        let entries = two_day_fixture();
        assert!(format_entry(&entries[1], &repo)
            .ends_with("(https://gitlab.com/group/sub/widgets/-/commit/bbbbbbbbbb))"));
    }

    #[test]
    fn test_day_uses_commit_offset() {
        let entries = vec![entry(
            "eeeeeeeeee",
            "2024-03-05T23:30:00-05:00",
            ChangeKind::Doc,
            None,
            "late",
        )];
        assert!(render_section(&entries, &github()).contains("##### 05-Mar-2024"));
    }

    #[test]
    fn test_placeholder_is_replaced_and_reinserted() {
        let document = "# Widgets\n\n#### CHANGE LOG\n\n##### 01-Jan-2024\n\n- old entry\n";
        let updated = compose_changelog(&two_day_fixture(), &github(), document);

        assert!(updated.starts_with("# Widgets\n\n#### CHANGE LOG\n\n##### 06-Mar-2024"));
        assert_eq!(updated.matches(CHANGELOG_PLACEHOLDER).count(), 1);
        assert!(updated.find("06-Mar-2024").unwrap() < updated.find("01-Jan-2024").unwrap());
    }

    #[test]
    fn test_deeper_heading_is_not_the_placeholder() {
        let document = "##### CHANGE LOG 2023\n\n- legacy entry\n\n#### CHANGE LOG\n\n- old entry\n";
        let updated = compose_changelog(&two_day_fixture(), &github(), document);

        assert!(updated.starts_with("##### CHANGE LOG 2023\n\n- legacy entry\n\n#### CHANGE LOG\n\n##### 06-Mar-2024"));
        assert!(updated.ends_with("- old entry\n"));
    }

    #[test]
    fn test_only_inline_mention_prepends() {
        let document = "See the #### CHANGE LOG marker docs\n";
        let updated = compose_changelog(&two_day_fixture(), &github(), document);

        assert!(updated.starts_with(CHANGELOG_PLACEHOLDER));
        assert!(updated.ends_with("\n\nSee the #### CHANGE LOG marker docs\n"));
    }

    #[test]
    fn test_missing_placeholder_prepends() {
        let document = "Hand-written history\n";
        let updated = compose_changelog(&two_day_fixture(), &github(), document);

        assert!(updated.starts_with(CHANGELOG_PLACEHOLDER));
        assert!(updated.ends_with("\n\nHand-written history\n"));
    }

    #[test]
    fn test_repeated_runs_keep_newest_on_top() {
        let fixture = two_day_fixture();
        let first = compose_changelog(&fixture[..2], &github(), "");
        let second = compose_changelog(&fixture[2..], &github(), &first);

        assert_eq!(second.matches(CHANGELOG_PLACEHOLDER).count(), 1);
        assert!(second.find("fourth").unwrap() < second.find("first").unwrap());
    }

    #[test]
    fn test_no_entries_is_well_formed() {
        let updated = compose_changelog(&[], &github(), "");
        assert_eq!(updated, format!("{}\n\n{}\n", CHANGELOG_PLACEHOLDER, NO_CHANGES_LINE));
    }
}
