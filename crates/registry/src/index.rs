//! The registry index document (`registry.yaml`) and name lookup.

use serde::{Deserialize, Serialize};

/// Largest edit distance still offered as a "did you mean" suggestion.
pub const MAX_SUGGESTION_DISTANCE: usize = 2;

/// Parsed `registry.yaml`.
///
/// An index is replaced wholesale on every successful fetch and never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryIndex {
    /// Document schema version
    #[serde(rename = "version", default)]
    pub schema_version: i64,

    /// Canonical URL of the registry repository
    #[serde(default)]
    pub registry_url: String,

    /// Tools in registry order
    #[serde(default)]
    pub tools: Vec<ToolEntry>,
}

/// One tool listed in the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolEntry {
    /// Unique tool name
    pub name: String,

    /// One-line description
    #[serde(default)]
    pub description: String,

    /// Git URL of the tool repository
    pub repository: String,

    /// Maintainer contact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainer: Option<String>,

    /// Search keywords
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl RegistryIndex {
    /// Parse an index from YAML.
    ///
    /// # Errors
    ///
    /// Returns the YAML error if the document is malformed.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Exact, case-sensitive lookup. The first entry with the name wins.
    #[must_use]
    pub fn find_tool(&self, name: &str) -> Option<&ToolEntry> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    /// Closest tool name to a misspelled `name`.
    ///
    /// Names are compared case-insensitively; only candidates within
    /// [`MAX_SUGGESTION_DISTANCE`] edits are considered and the earliest
    /// entry wins ties.
    #[must_use]
    pub fn suggest_similar(&self, name: &str) -> Option<&str> {
        let wanted = name.to_lowercase();
        let mut best: Option<(usize, &str)> = None;

        for tool in &self.tools {
            let distance = levenshtein(&wanted, &tool.name.to_lowercase());
            if distance > MAX_SUGGESTION_DISTANCE {
                continue;
            }
            if best.is_none_or(|(best_distance, _)| distance < best_distance) {
                best = Some((distance, tool.name.as_str()));
            }
        }

        best.map(|(_, name)| name)
    }
}

/// Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}
