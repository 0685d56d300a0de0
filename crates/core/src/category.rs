use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of tags used to group timeline actions for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Skill,
    Mcp,
    Builtin,
    Agent,
    Error,
    Hook,
    HookProgress,
    System,
    Snapshot,
    Queue,
    Context,
    Result,
    Summary,
}

impl Category {
    pub const ALL: [Category; 13] = [
        Category::Skill,
        Category::Mcp,
        Category::Builtin,
        Category::Agent,
        Category::Error,
        Category::Hook,
        Category::HookProgress,
        Category::System,
        Category::Snapshot,
        Category::Queue,
        Category::Context,
        Category::Result,
        Category::Summary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Skill => "skill",
            Category::Mcp => "mcp",
            Category::Builtin => "builtin",
            Category::Agent => "agent",
            Category::Error => "error",
            Category::Hook => "hook",
            Category::HookProgress => "hook_progress",
            Category::System => "system",
            Category::Snapshot => "snapshot",
            Category::Queue => "queue",
            Category::Context => "context",
            Category::Result => "result",
            Category::Summary => "summary",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace('-', "_");
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == needle)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_round_trips_through_its_tag() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
    }

    #[test]
    fn parse_accepts_dashes_and_case() {
        assert_eq!("Hook-Progress".parse::<Category>(), Ok(Category::HookProgress));
        assert!("widget".parse::<Category>().is_err());
    }

    #[test]
    fn serializes_as_snake_case_tag() {
        let json = serde_json::to_string(&Category::HookProgress).unwrap();
        assert_eq!(json, "\"hook_progress\"");
        let parsed: Category = serde_json::from_str("\"mcp\"").unwrap();
        assert_eq!(parsed, Category::Mcp);
    }
}
