//! Tool-name classification.
//!
//! Rules are evaluated top to bottom; the first predicate that matches
//! decides the category. Anything left over is a built-in tool.

use crate::category::Category;

/// Reserved prefix for `mcp__<server>__<method>` tool identifiers.
pub const MCP_PREFIX: &str = "mcp__";

type ToolRule = (fn(&str) -> bool, Category);

const TOOL_RULES: &[ToolRule] = &[
    (is_skill, Category::Skill),
    (is_mcp_tool, Category::Mcp),
    (is_agent_delegation, Category::Agent),
];

pub fn is_skill(name: &str) -> bool {
    name == "Skill"
}

pub fn is_mcp_tool(name: &str) -> bool {
    name.starts_with(MCP_PREFIX)
}

pub fn is_agent_delegation(name: &str) -> bool {
    name == "Task"
}

/// Map a raw tool identifier to its category. Total: never fails.
pub fn classify_tool_name(name: &str) -> Category {
    TOOL_RULES
        .iter()
        .find(|(matches, _)| matches(name))
        .map(|(_, category)| *category)
        .unwrap_or(Category::Builtin)
}
