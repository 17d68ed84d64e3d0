use chrono::{DateTime, FixedOffset};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Kind of change a conventional-commit line announces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Feature,
    Fix,
    Doc,
}

impl ChangeKind {
    /// The leading token that marks this kind in a commit line
    pub fn token(&self) -> &'static str {
        match self {
            ChangeKind::Feature => "feat",
            ChangeKind::Fix => "fix",
            ChangeKind::Doc => "docs",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "feat" => Some(ChangeKind::Feature),
            "fix" => Some(ChangeKind::Fix),
            "docs" => Some(ChangeKind::Doc),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// A single line of a commit message that matched a change token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedChange {
    pub kind: ChangeKind,
    pub component: Option<String>,
    pub message: String,
    pub is_breaking_change: bool,
}

impl ParsedChange {
    /// Parse one line of a commit message.
    ///
    /// The line must start with `feat`, `fix` or `docs` (case-sensitive),
    /// followed by a non-word character or the end of the line. Supported forms:
    /// - type(scope)!: description
    /// - type(scope): description
    /// - type!: description
    /// - type: description
    /// - type description
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches('\r');
        let captures = token_regex()?.captures(line)?;
        let kind = ChangeKind::from_token(captures.get(1)?.as_str())?;
        let remainder = captures.get(2).map(|m| m.as_str()).unwrap_or_default();

        if let Some(captures) = scoped_regex().and_then(|re| re.captures(remainder)) {
            let component = captures.get(1).map(|m| m.as_str().trim().to_string());
            let is_breaking_change = captures.get(2).is_some();
            let message = captures
                .get(3)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();

            return Some(ParsedChange {
                kind,
                component: component.filter(|c| !c.is_empty()),
                message,
                is_breaking_change,
            });
        }

        let (is_breaking_change, rest) = match remainder.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, remainder),
        };
        let message = rest.strip_prefix(':').unwrap_or(rest).trim().to_string();

        Some(ParsedChange {
            kind,
            component: None,
            message,
            is_breaking_change,
        })
    }
}

fn token_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(feat|fix|docs)(?:\b(.*))?$").ok())
        .as_ref()
}

fn scoped_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\(([^)]*)\)(!)?:(.*)$").ok())
        .as_ref()
}

/// A typed change mined from commit history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEntry {
    pub hash: String,
    pub author_name: String,
    pub author_email: String,
    pub timestamp: DateTime<FixedOffset>,
    pub kind: ChangeKind,
    pub component: Option<String>,
    pub message: String,
    pub is_breaking_change: bool,
}

impl CommitEntry {
    /// First seven characters of the commit hash
    pub fn short_hash(&self) -> &str {
        let end = self
            .hash
            .char_indices()
            .nth(7)
            .map(|(i, _)| i)
            .unwrap_or(self.hash.len());
        &self.hash[..end]
    }
}
