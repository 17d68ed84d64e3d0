use serde::Serialize;

/// Someone who authored at least one mined change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contributor {
    pub name: String,
    pub email: String,
    pub profile: Option<String>,
    pub avatar: Option<String>,
}

/// Contributors keyed by email, in first-seen order
///
/// The first name seen for an email wins; later commits by the same address
/// under a different name do not rename the contributor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributorTable {
    contributors: Vec<Contributor>,
    // hash of the first commit seen for each contributor, same order
    first_commits: Vec<String>,
}

impl ContributorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an author. Returns `true` if the email had not been seen yet.
    pub fn record(&mut self, name: &str, email: &str, commit_hash: &str) -> bool {
        if self.get(email).is_some() {
            return false;
        }

        self.contributors.push(Contributor {
            name: name.to_string(),
            email: email.to_string(),
            profile: None,
            avatar: None,
        });
        self.first_commits.push(commit_hash.to_string());
        true
    }

    pub fn get(&self, email: &str) -> Option<&Contributor> {
        self.contributors.iter().find(|c| c.email == email)
    }

    /// Attach profile and avatar links to a known contributor
    pub fn set_profile(&mut self, email: &str, profile: Option<String>, avatar: Option<String>) {
        if let Some(contributor) = self.contributors.iter_mut().find(|c| c.email == email) {
            contributor.profile = profile;
            contributor.avatar = avatar;
        }
    }

    /// Each contributor paired with the first commit they authored in the range
    pub fn with_first_commits(&self) -> impl Iterator<Item = (&Contributor, &str)> {
        self.contributors
            .iter()
            .zip(self.first_commits.iter().map(String::as_str))
    }

    pub fn contributors(&self) -> &[Contributor] {
        &self.contributors
    }

    pub fn len(&self) -> usize {
        self.contributors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contributors.is_empty()
    }
}
