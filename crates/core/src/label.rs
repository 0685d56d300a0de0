//! Short human labels for tool invocations.
//!
//! Built from the structured input when it can be read, otherwise the bare
//! tool name. Malformed input never fails the caller.

use crate::classify::{is_mcp_tool, MCP_PREFIX};
use crate::content::{first_line, looks_like_json, truncate_chars};
use crate::event::str_field;
use crate::timeline::TimelineConfig;
use serde_json::Value;
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelRule {
    FilePath,
    Shell,
    Search,
    Skill,
    Task,
    WebFetch,
    WebSearch,
}

fn rule_for(tool_name: &str) -> Option<LabelRule> {
    match tool_name {
        "Read" | "Write" | "Edit" | "MultiEdit" | "NotebookEdit" | "NotebookRead"
        | "read_file" | "write_file" | "edit_file" => Some(LabelRule::FilePath),
        "Bash" | "shell" | "exec_command" | "run_terminal_cmd" => Some(LabelRule::Shell),
        "Grep" | "Glob" | "grep_search" | "file_search" => Some(LabelRule::Search),
        "Skill" => Some(LabelRule::Skill),
        "Task" => Some(LabelRule::Task),
        "WebFetch" => Some(LabelRule::WebFetch),
        "WebSearch" => Some(LabelRule::WebSearch),
        _ => None,
    }
}

/// Label for a `tool_invocation` event.
pub fn tool_label(tool_name: &str, input: Option<&Value>, config: &TimelineConfig) -> String {
    if is_mcp_tool(tool_name) {
        return mcp_label(tool_name);
    }
    let Some(rule) = rule_for(tool_name) else {
        return tool_name.to_string();
    };
    let Some(input) = input.and_then(structured_input) else {
        tracing::trace!(tool_name, "tool input not structured; using bare name");
        return tool_name.to_string();
    };
    label_from_input(rule, tool_name, &input, config).unwrap_or_else(|| tool_name.to_string())
}

/// Object input as-is, or a JSON object hidden inside a string.
fn structured_input(input: &Value) -> Option<Cow<'_, Value>> {
    match input {
        Value::Object(_) => Some(Cow::Borrowed(input)),
        Value::String(raw) if looks_like_json(raw) => serde_json::from_str::<Value>(raw.trim())
            .ok()
            .filter(Value::is_object)
            .map(Cow::Owned),
        _ => None,
    }
}

fn label_from_input(
    rule: LabelRule,
    tool_name: &str,
    input: &Value,
    config: &TimelineConfig,
) -> Option<String> {
    match rule {
        LabelRule::FilePath => {
            let path = str_field(input, &["file_path", "notebook_path", "path"])?;
            Some(format!("{tool_name} {}", shorten_path(&path)))
        }
        LabelRule::Shell => {
            let command = str_field(input, &["command", "cmd"])?;
            Some(truncate_chars(first_line(&command), config.shell_label_chars))
        }
        LabelRule::Search => {
            let pattern = str_field(input, &["pattern", "query"])?;
            Some(format!("{tool_name} \"{pattern}\""))
        }
        LabelRule::Skill => {
            let skill = str_field(input, &["skill", "name", "command"])
                .unwrap_or_else(|| "unknown".to_string());
            Some(format!("Skill: {skill}"))
        }
        LabelRule::Task => {
            let description = str_field(input, &["description", "subagent_type"])?;
            Some(format!(
                "Task: {}",
                truncate_chars(&description, config.task_label_chars)
            ))
        }
        LabelRule::WebFetch => {
            let url = str_field(input, &["url"])?;
            Some(format!(
                "WebFetch {}",
                truncate_chars(&url, config.label_max_chars)
            ))
        }
        LabelRule::WebSearch => {
            let query = str_field(input, &["query"])?;
            Some(format!("WebSearch \"{query}\""))
        }
    }
}

/// Keep the last two segments of a deep path.
pub fn shorten_path(path: &str) -> String {
    let segments: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty())
        .collect();
    if segments.len() > 2 {
        segments[segments.len() - 2..].join("/")
    } else {
        path.to_string()
    }
}

/// `mcp__server__method` becomes `server/method`.
pub fn mcp_label(tool_name: &str) -> String {
    let rest = tool_name.strip_prefix(MCP_PREFIX).unwrap_or(tool_name);
    let segments: Vec<&str> = rest.split("__").filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [] => tool_name.to_string(),
        [only] => (*only).to_string(),
        [.., server, method] => format!("{server}/{method}"),
    }
}
