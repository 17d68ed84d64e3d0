/// Naming pattern with a `{version}` placeholder
///
/// Used for tag names (`V{version}`), tag messages, release names and commit
/// messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPattern {
    pub pattern: String,
}

impl TagPattern {
    /// Create a new pattern
    pub fn new(pattern: impl Into<String>) -> Self {
        TagPattern {
            pattern: pattern.into(),
        }
    }

    /// Fill the pattern with a version
    /// Example: pattern="V{version}", version="1.2.3" -> "V1.2.3"
    pub fn format(&self, version: &str) -> String {
        self.pattern.replace("{version}", version)
    }
}

impl Default for TagPattern {
    fn default() -> Self {
        TagPattern::new("V{version}")
    }
}
