//! Priority-ranked model selection.
//!
//! Backend identifiers are matched by substring: the priority entry
//! `gemini-2.5-flash` matches the backend identifier `gemini-2.5-flash-001`.

use serde::{Deserialize, Serialize};

/// Preferred models, most preferred first. Flash models come first for their
/// higher quotas.
pub const DEFAULT_MODEL_PRIORITY: &[&str] = &[
    "gemini-2.5-flash",
    "gemini-1.5-flash",
    "gemini-flash-latest",
    "gemini-2.5-pro",
    "gemini-1.5-pro",
    "gemini-pro-latest",
];

/// Substring tried when no priority entry matches.
pub const DEFAULT_TIER_HINT: &str = "flash";

/// Provider family substring tried after the tier hint.
pub const DEFAULT_FAMILY: &str = "gemini";

/// Identifier used when discovery yields nothing usable.
pub const DEFAULT_FALLBACK_MODEL: &str = "gemini-1.5-flash";

/// Ordered list of model-name substrings plus the secondary fallbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityList {
    /// Substrings in preference order.
    pub entries: Vec<String>,
    /// First-chance fallback substring (e.g. "flash").
    pub tier_hint: String,
    /// Second-chance fallback substring (e.g. "gemini").
    pub family: String,
}

impl Default for PriorityList {
    fn default() -> Self {
        Self {
            entries: DEFAULT_MODEL_PRIORITY.iter().map(|s| (*s).to_string()).collect(),
            tier_hint: DEFAULT_TIER_HINT.to_string(),
            family: DEFAULT_FAMILY.to_string(),
        }
    }
}

impl PriorityList {
    /// Creates a list with custom entries and the default fallbacks.
    #[must_use]
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries, ..Self::default() }
    }

    /// Picks the best candidate.
    ///
    /// Walks the priority entries in order and returns the first candidate
    /// containing the entry. Failing that, the first candidate containing the
    /// tier hint, then the first containing the family name.
    pub fn select<'a>(&self, candidates: &'a [String]) -> Option<&'a str> {
        self.entries
            .iter()
            .find_map(|preferred| find_containing(candidates, preferred))
            .or_else(|| find_containing(candidates, &self.tier_hint))
            .or_else(|| find_containing(candidates, &self.family))
    }
}

fn find_containing<'a>(candidates: &'a [String], needle: &str) -> Option<&'a str> {
    if needle.is_empty() {
        return None;
    }
    candidates.iter().find(|c| c.contains(needle)).map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_first_priority_wins_regardless_of_listing_order() {
        let list = PriorityList::default();
        let models = candidates(&["gemini-1.5-pro", "gemini-2.5-flash", "gemini-1.5-flash"]);
        assert_eq!(list.select(&models), Some("gemini-2.5-flash"));
    }

    #[test]
    fn test_second_priority_used_when_first_absent() {
        let list = PriorityList::default();
        let models = candidates(&["gemini-1.5-pro", "gemini-1.5-flash-002"]);
        assert_eq!(list.select(&models), Some("gemini-1.5-flash-002"));
    }

    #[test]
    fn test_substring_match_not_exact() {
        let list = PriorityList::default();
        let models = candidates(&["gemini-2.5-flash-001"]);
        assert_eq!(list.select(&models), Some("gemini-2.5-flash-001"));
    }

    #[test]
    fn test_tier_hint_fallback() {
        let list = PriorityList::default();
        let models = candidates(&["gemini-3.0-ultra", "gemini-2.0-flash-lite"]);
        assert_eq!(list.select(&models), Some("gemini-2.0-flash-lite"));
    }

    #[test]
    fn test_family_fallback() {
        let list = PriorityList::default();
        let models = candidates(&["text-bison", "gemini-3.0-ultra"]);
        assert_eq!(list.select(&models), Some("gemini-3.0-ultra"));
    }

    #[test]
    fn test_nothing_usable() {
        let list = PriorityList::default();
        assert_eq!(list.select(&candidates(&["text-bison", "embedding-001"])), None);
        assert_eq!(list.select(&[]), None);
    }

    #[test]
    fn test_empty_fallback_substrings_never_match() {
        let list = PriorityList {
            entries: vec![],
            tier_hint: String::new(),
            family: String::new(),
        };
        assert_eq!(list.select(&candidates(&["anything"])), None);
    }
}
